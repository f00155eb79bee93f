//! Target spatial reference and the transforms between it and WGS84.
//!
//! Zoom levels and 1:N scales are calibrated in spherical Web Mercator, so
//! [`WEB_MERCATOR`] is also used as the reference transform when computing
//! the scale correction for other targets.

use crate::{
    bbox::{BBox, Coord},
    error::ConfigurationError,
};
use proj::Proj;
use std::f64::consts::{FRAC_PI_4, PI};

pub const WGS84: &str = "EPSG:4326";

pub const EPSG_3857: &str = "EPSG:3857";

pub const WEB_MERCATOR_PROJ4: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +no_defs +over";

pub const EARTH_RADIUS: f64 = 6378137.0;

pub const MAX_LATITUDE: f64 = 85.0511287798066;

/// Built-in spherical Mercator, usable without a PROJ database.
pub const WEB_MERCATOR: WebMercator = WebMercator;

/// Bidirectional transform between geographic WGS84 (lon/lat degrees) and a
/// projected target.
pub trait CoordTransform {
    fn forward(&self, coord: Coord) -> Result<Coord, ConfigurationError>;

    fn backward(&self, coord: Coord) -> Result<Coord, ConfigurationError>;

    /// Envelope of the four transformed corners. Edges are not densified, so
    /// boxes in curved targets may be slightly smaller than their true
    /// footprint; scale correction is calibrated against exactly this.
    fn forward_bbox(&self, bbox: &BBox) -> Result<BBox, ConfigurationError> {
        transform_corners(bbox, |coord| self.forward(coord))
    }

    fn backward_bbox(&self, bbox: &BBox) -> Result<BBox, ConfigurationError> {
        transform_corners(bbox, |coord| self.backward(coord))
    }
}

fn transform_corners(
    bbox: &BBox,
    transform: impl Fn(Coord) -> Result<Coord, ConfigurationError>,
) -> Result<BBox, ConfigurationError> {
    let corners = bbox
        .corners()
        .into_iter()
        .map(transform)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BBox::envelope(corners).unwrap_or(*bbox))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WebMercator;

impl CoordTransform for WebMercator {
    fn forward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        Ok(Coord::new(
            coord.x.to_radians() * EARTH_RADIUS,
            (FRAC_PI_4 + lat / 2.0).tan().ln() * EARTH_RADIUS,
        ))
    }

    fn backward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        Ok(Coord::new(
            (coord.x / EARTH_RADIUS).to_degrees(),
            (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
        ))
    }
}

/// PROJ-backed transform; one [`Proj`] instance per direction.
pub struct ProjTransform {
    definition: String,
    forward: Proj,
    backward: Proj,
}

impl ProjTransform {
    pub fn new(definition: &str) -> Result<Self, ConfigurationError> {
        let create = |from: &str, to: &str| {
            Proj::new_known_crs(from, to, None).map_err(|err| ConfigurationError::Projection {
                definition: definition.to_string(),
                message: err.to_string(),
            })
        };

        Ok(Self {
            definition: definition.to_string(),
            forward: create(WGS84, definition)?,
            backward: create(definition, WGS84)?,
        })
    }

    fn convert(&self, proj: &Proj, coord: Coord) -> Result<Coord, ConfigurationError> {
        proj.convert((coord.x, coord.y))
            .map(|(x, y)| Coord::new(x, y))
            .map_err(|err| ConfigurationError::Projection {
                definition: self.definition.clone(),
                message: format!("failed to transform ({}, {}): {err}", coord.x, coord.y),
            })
    }
}

impl CoordTransform for ProjTransform {
    fn forward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        self.convert(&self.forward, coord)
    }

    fn backward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        self.convert(&self.backward, coord)
    }
}

impl std::fmt::Debug for ProjTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjTransform")
            .field("definition", &self.definition)
            .finish()
    }
}

/// Target spatial reference of the rendered map.
#[derive(Debug)]
pub enum Projection {
    WebMercator,
    Proj(ProjTransform),
}

impl Projection {
    /// `true` for any spelling of EPSG:3857 this tool accepts.
    pub fn is_web_mercator_definition(definition: &str) -> bool {
        definition == "3857"
            || definition.eq_ignore_ascii_case(EPSG_3857)
            || definition.trim() == WEB_MERCATOR_PROJ4
    }

    /// Normalize user input into something PROJ accepts as a CRS.
    ///
    /// All-digit input is an EPSG code; PROJ strings get `+type=crs`.
    pub fn crs_definition(definition: &str) -> String {
        let definition = definition.trim();

        if !definition.is_empty() && definition.chars().all(|c| c.is_ascii_digit()) {
            format!("EPSG:{definition}")
        } else if definition.starts_with('+') && !definition.contains("+type=crs") {
            format!("{definition} +type=crs")
        } else {
            definition.to_string()
        }
    }

    /// `None` selects the default Web Mercator target.
    pub fn from_definition(definition: Option<&str>) -> Result<Self, ConfigurationError> {
        match definition {
            None => Ok(Self::WebMercator),
            Some(definition) if Self::is_web_mercator_definition(definition) => {
                Ok(Self::WebMercator)
            }
            Some(definition) => Ok(Self::Proj(ProjTransform::new(&Self::crs_definition(
                definition,
            ))?)),
        }
    }

    pub fn is_web_mercator(&self) -> bool {
        matches!(self, Self::WebMercator)
    }

    /// Definition string handed to the renderer.
    pub fn definition(&self) -> &str {
        match self {
            Self::WebMercator => WEB_MERCATOR_PROJ4,
            Self::Proj(transform) => &transform.definition,
        }
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.definition() == other.definition()
    }
}

impl CoordTransform for Projection {
    fn forward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        match self {
            Self::WebMercator => WEB_MERCATOR.forward(coord),
            Self::Proj(transform) => transform.forward(coord),
        }
    }

    fn backward(&self, coord: Coord) -> Result<Coord, ConfigurationError> {
        match self {
            Self::WebMercator => WEB_MERCATOR.backward(coord),
            Self::Proj(transform) => transform.backward(coord),
        }
    }
}
