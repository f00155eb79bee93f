//! Resolution of the output geometry.
//!
//! The user may describe the map through any mix of zoom, 1:N scale, paper
//! size, pixel size, center, bounding box and fit-to-layers. [`resolve`]
//! turns that into one [`ResolvedGeometry`] in three stages, each consuming
//! the previous stage's output:
//!
//! 1. [`OutputSetup`]: output format and target projection
//! 2. [`Sizing`]: millimeters and pixels per millimeter into pixels
//! 3. [`Extent`]: bounding box and ground scale, then [`Extent::finish`]

mod extent;
mod output;
mod sizing;

pub use extent::{Extent, GroundScale};
pub use output::OutputSetup;
pub use sizing::{PixelSize, Sizing};

use crate::{
    bbox::{BBox, Coord},
    error::ConfigurationError,
    layers::LayerExtents,
    projection::{CoordTransform, Projection},
    tiles::TileGrid,
};
use serde::Serialize;

/// Largest image edge the renderer accepts, per tile.
pub const MAX_IMAGE_SIZE: u32 = 16384;

/// Scale factor 1 corresponds to this many pixels per inch.
pub const REFERENCE_PPI: f64 = 90.7;

pub const MM_PER_INCH: f64 = 25.4;

/// Meters per pixel at scale 1:1 for [`REFERENCE_PPI`].
pub const METERS_PER_PIXEL_AT_UNIT_SCALE: f64 = 0.00028;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryRequest {
    pub output: OutputRequest,
    pub size: SizeRequest,
    pub extent: ExtentRequest,
    pub tiles: TileGrid,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputRequest {
    /// Output path; `-` is stdout.
    pub output: String,
    /// Explicit format, overrides the output extension.
    pub format: Option<String>,
    /// EPSG code (digits only) or projection definition; `None` is Web Mercator.
    pub projection: Option<String>,
    /// OZI side file requested.
    pub ozi: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PhysicalSize {
    #[default]
    Unspecified,
    /// `[+|-]name`, see [`crate::paper::Paper::parse`].
    Paper(String),
    Millimeters([f64; 2]),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SizeRequest {
    pub physical: PhysicalSize,
    /// Width and height in pixels; one of them may be 0.
    pub pixels: Option<[u32; 2]>,
    pub margin_mm: Option<f64>,
    pub ppi: Option<f64>,
    pub factor: f64,
    pub no_rotate: bool,
}

impl Default for SizeRequest {
    fn default() -> Self {
        Self {
            physical: PhysicalSize::Unspecified,
            pixels: None,
            margin_mm: None,
            ppi: None,
            factor: 1.0,
            no_rotate: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ScaleRequest {
    #[default]
    Unspecified,
    Zoom(f64),
    /// The N of 1:N.
    Denominator(f64),
}

/// Where the map is placed, in geographic coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Anchor {
    #[default]
    Unspecified,
    Center(Coord),
    /// The bbox defines the extent; a center given alongside it only
    /// calibrates 1:N scales.
    BBox { bbox: BBox, center: Option<Coord> },
}

impl Anchor {
    /// Latitude at which a 1:N scale is corrected, if known up front.
    pub fn calibration_latitude(&self) -> Option<f64> {
        match self {
            Self::Unspecified => None,
            Self::Center(center) | Self::BBox { center: Some(center), .. } => Some(center.y),
            Self::BBox { bbox, center: None } => Some((bbox.min_y + bbox.max_y) / 2.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FitRequest {
    pub layers: Vec<String>,
    pub padding_mm: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtentRequest {
    pub scale: ScaleRequest,
    pub anchor: Anchor,
    pub fit: Option<FitRequest>,
}

/// What the renderer backend can do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Vector surfaces (svg, pdf) can be rendered with a scale factor.
    pub vector_scaling: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            vector_scaling: true,
        }
    }
}

/// Fully determined output geometry; read-only once built.
#[derive(Debug, PartialEq)]
pub struct ResolvedGeometry {
    pub format: String,
    pub vector_surface: bool,
    pub to_stdout: bool,
    pub projection: Projection,
    pub pixels_per_mm: f64,
    pub scale_factor: f64,
    /// Projected units per pixel; `None` when only the pixel size was given.
    pub ground_scale: Option<f64>,
    pub pixel_size: PixelSize,
    pub bbox: BBox,
    pub rotate: bool,
    /// Effective tile grid; 1×1 for stdout and vector output.
    pub tiles: TileGrid,
}

#[derive(Debug, Serialize)]
pub struct GeometryReport<'a> {
    pub format: &'a str,
    pub projection: &'a str,
    pub scale: Option<f64>,
    pub scale_factor: f64,
    pub size: [u32; 2],
    pub bbox: BBox,
    pub bbox_wgs84: BBox,
    pub tiles: [u32; 2],
}

impl ResolvedGeometry {
    pub fn report(&self) -> Result<GeometryReport<'_>, ConfigurationError> {
        Ok(GeometryReport {
            format: &self.format,
            projection: self.projection.definition(),
            scale: self.ground_scale,
            scale_factor: self.scale_factor,
            size: [self.pixel_size.width, self.pixel_size.height],
            bbox: self.bbox,
            bbox_wgs84: self.projection.backward_bbox(&self.bbox)?,
            tiles: [self.tiles.x, self.tiles.y],
        })
    }
}

/// Run all three stages.
pub fn resolve(
    request: &GeometryRequest,
    capabilities: Capabilities,
    layers: &dyn LayerExtents,
) -> Result<ResolvedGeometry, ConfigurationError> {
    let setup = OutputSetup::resolve(&request.output)?;

    let sizing = Sizing::resolve(&setup, &request.size, capabilities)?;

    let mut extent = Extent::resolve(setup, sizing, &request.extent)?;

    if let Some(fit) = &request.extent.fit {
        extent = extent.fit_to_layers(layers, fit)?;
    }

    extent.finish(request.tiles)
}
