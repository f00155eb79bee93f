use super::{
    Anchor, ExtentRequest, FitRequest, MAX_IMAGE_SIZE, METERS_PER_PIXEL_AT_UNIT_SCALE,
    OutputSetup, PixelSize, ResolvedGeometry, ScaleRequest, Sizing, sizing::to_pixels,
};
use crate::{
    bbox::{BBox, Coord},
    error::ConfigurationError,
    layers::LayerExtents,
    projection::{CoordTransform, EARTH_RADIUS, WEB_MERCATOR},
    tiles::TileGrid,
};

/// Zoom scales are calibrated against this truncated value of π.
#[allow(clippy::approx_constant)]
const ZOOM_PI: f64 = 3.14159;

/// Smallest pixel dimension used when deriving a scale for padding.
const MIN_PADDING_DIMENSION: f64 = 0.01;

/// Projected units per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GroundScale {
    Unknown,
    Known(f64),
    /// A 1:N scale still to be divided by cos(latitude) once a bbox center
    /// is known; holds the equatorial value.
    PendingLatitude(f64),
}

impl GroundScale {
    pub fn from_request(
        request: ScaleRequest,
        anchor: &Anchor,
        scale_factor: f64,
    ) -> Self {
        match request {
            ScaleRequest::Unspecified => Self::Unknown,
            ScaleRequest::Zoom(zoom) => {
                Self::Known(2.0 * ZOOM_PI * EARTH_RADIUS / 2_f64.powf(zoom + 8.0) / scale_factor)
            }
            ScaleRequest::Denominator(denominator) => {
                let scale = denominator * METERS_PER_PIXEL_AT_UNIT_SCALE / scale_factor;

                match anchor.calibration_latitude() {
                    Some(lat) => Self::Known(scale / lat.to_radians().cos()),
                    None => Self::PendingLatitude(scale),
                }
            }
        }
    }

    /// Effective value; a pending scale is used uncorrected.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::Unknown => None,
            Self::Known(scale) | Self::PendingLatitude(scale) => Some(scale),
        }
    }

    /// Rescale by the ratio of the target X extent to the Web Mercator X
    /// extent of the same area.
    fn correct(self, bbox_web_merc: &BBox, bbox: &BBox) -> Self {
        match self {
            Self::Known(scale) => Self::Known(scale * (bbox.width() / bbox_web_merc.width())),
            other => other,
        }
    }

    fn resolve_latitude(self, lat: f64) -> Self {
        match self {
            Self::PendingLatitude(scale) => Self::Known(scale / lat.to_radians().cos()),
            other => other,
        }
    }
}

/// Stage 3: projected bounding box and ground scale.
#[derive(Debug)]
pub struct Extent {
    setup: OutputSetup,
    sizing: Sizing,
    bbox: Option<BBox>,
    scale: GroundScale,
}

impl Extent {
    pub fn resolve(
        setup: OutputSetup,
        sizing: Sizing,
        request: &ExtentRequest,
    ) -> Result<Self, ConfigurationError> {
        let mut scale =
            GroundScale::from_request(request.scale, &request.anchor, sizing.scale_factor);

        let mut bbox = None;

        if let Anchor::BBox { bbox: bbox_wgs84, .. } = &request.anchor {
            let projected = setup.projection.forward_bbox(bbox_wgs84)?;

            let bbox_web_merc = WEB_MERCATOR.forward_bbox(bbox_wgs84)?;

            scale = scale.correct(&bbox_web_merc, &projected);

            bbox = Some(projected);
        }

        let mut extent = Self {
            setup,
            sizing,
            bbox,
            scale,
        };

        if let (None, Anchor::Center(center), Some(size), GroundScale::Known(_)) = (
            extent.bbox,
            request.anchor,
            extent.sizing.pixel_size,
            extent.scale,
        ) {
            if size.is_complete() {
                extent.set_bbox_around_center(center, size)?;
            }
        }

        Ok(extent)
    }

    /// Build the bbox from center, scale and pixel size.
    ///
    /// The latitude span is unknown, so the box is first built in Web
    /// Mercator, projected, used to correct the scale, then rebuilt around
    /// the projected center with the corrected scale.
    fn set_bbox_around_center(
        &mut self,
        center: Coord,
        size: PixelSize,
    ) -> Result<(), ConfigurationError> {
        let projection = &self.setup.projection;

        let half_size = |scale: f64| {
            (
                f64::from(size.width) * scale / 2.0,
                f64::from(size.height) * scale / 2.0,
            )
        };

        let Some(scale) = self.scale.value() else {
            return Ok(());
        };

        let (w, h) = half_size(scale);

        let bbox_web_merc = BBox::around(WEB_MERCATOR.forward(center)?, w, h);

        let projected = projection.forward_bbox(&WEB_MERCATOR.backward_bbox(&bbox_web_merc)?)?;

        self.scale = self.scale.correct(&bbox_web_merc, &projected);

        let Some(scale) = self.scale.value() else {
            return Ok(());
        };

        let (w, h) = half_size(scale);

        self.bbox = Some(BBox::around(projection.forward(center)?, w, h));

        Ok(())
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }

    pub fn scale(&self) -> GroundScale {
        self.scale
    }

    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.sizing.pixel_size
    }

    pub fn scale_factor(&self) -> f64 {
        self.sizing.scale_factor
    }

    /// Include the envelope of the named layers, then settle a pending
    /// scale and pad the result.
    pub fn fit_to_layers(
        mut self,
        layers: &dyn LayerExtents,
        fit: &FitRequest,
    ) -> Result<Self, ConfigurationError> {
        let projection = &self.setup.projection;

        let layer_bbox = layers.layer_extent(&fit.layers, projection)?;

        let Some(bbox) = (match (self.bbox, layer_bbox) {
            (Some(bbox), Some(layer_bbox)) => Some(bbox.expand_to_include(&layer_bbox)),
            (bbox, layer_bbox) => bbox.or(layer_bbox),
        }) else {
            tracing::warn!("None of the layers {} has an extent", fit.layers.join(","));

            return Ok(self);
        };

        // last point where a pending 1:N scale can learn its latitude
        let lat = projection.backward(bbox.center())?.y;

        self.scale = self.scale.resolve_latitude(lat);

        let bbox_web_merc = WEB_MERCATOR.forward_bbox(&projection.backward_bbox(&bbox)?)?;

        self.scale = self.scale.correct(&bbox_web_merc, &bbox);

        let padding_scale = match (self.scale.value(), self.sizing.pixel_size) {
            (Some(scale), _) => Some(scale),
            (None, Some(size)) => Some(
                (bbox.width() / f64::from(size.width).max(MIN_PADDING_DIMENSION))
                    .min(bbox.height() / f64::from(size.height).max(MIN_PADDING_DIMENSION)),
            ),
            (None, None) => None,
        };

        self.bbox = Some(match padding_scale {
            Some(scale) if fit.padding_mm > 0.0 => {
                bbox.pad(fit.padding_mm * self.sizing.pixels_per_mm * scale)
            }
            _ => bbox,
        });

        Ok(self)
    }

    /// Rotate and complete the pixel size, then check the renderer limit.
    pub fn finish(self, tiles: TileGrid) -> Result<ResolvedGeometry, ConfigurationError> {
        let bbox = self.bbox.ok_or(ConfigurationError::BoundingBoxUnspecified)?;

        let mut pixel_size = self.sizing.pixel_size;

        if let Some(size) = pixel_size {
            if self.sizing.rotate
                && bbox.is_portrait()
                && (size.width == 0 || size.width >= size.height)
            {
                pixel_size = Some(size.swapped());
            }
        }

        let scale = self.scale.value();

        let pixel_size = match (pixel_size, scale) {
            (None, Some(scale)) => PixelSize::new(
                to_pixels(bbox.width().abs() / scale),
                to_pixels(bbox.height().abs() / scale),
            ),
            (None, None) => return Err(ConfigurationError::PixelSizeUnspecified),
            (Some(size), _) if size.width == 0 => PixelSize::new(
                to_pixels(f64::from(size.height) * bbox.width() / bbox.height()),
                size.height,
            ),
            (Some(size), _) if size.height == 0 => PixelSize::new(
                size.width,
                to_pixels(f64::from(size.width) / bbox.width() * bbox.height()),
            ),
            (Some(size), _) => size,
        };

        let tiles = if self.setup.to_stdout || self.setup.vector_surface {
            TileGrid::SINGLE
        } else {
            tiles
        };

        let max_image_size = (f64::from(pixel_size.width) / f64::from(tiles.x))
            .max(f64::from(pixel_size.height) / f64::from(tiles.y));

        if max_image_size > f64::from(MAX_IMAGE_SIZE) {
            return Err(ConfigurationError::exceeds_render_limit(
                max_image_size,
                MAX_IMAGE_SIZE,
                tiles.is_tiled(),
            ));
        }

        Ok(ResolvedGeometry {
            format: self.setup.format,
            vector_surface: self.setup.vector_surface,
            to_stdout: self.setup.to_stdout,
            projection: self.setup.projection,
            pixels_per_mm: self.sizing.pixels_per_mm,
            scale_factor: self.sizing.scale_factor,
            ground_scale: scale,
            pixel_size,
            bbox,
            rotate: self.sizing.rotate,
            tiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_known(scale: GroundScale, expected: f64) {
        let GroundScale::Known(value) = scale else {
            panic!("expected a known scale, got {scale:?}");
        };

        assert!((value - expected).abs() < 1e-9, "{value} differs from {expected}");
    }

    #[test]
    fn correction_scales_by_target_over_web_mercator_width() {
        let bbox_web_merc = BBox::new(0.0, 0.0, 200.0, 100.0);

        let bbox = BBox::new(10.0, 0.0, 60.0, 30.0);

        assert_known(GroundScale::Known(8.0).correct(&bbox_web_merc, &bbox), 2.0);

        assert_eq!(
            GroundScale::PendingLatitude(8.0).correct(&bbox_web_merc, &bbox),
            GroundScale::PendingLatitude(8.0)
        );
        assert_eq!(
            GroundScale::Unknown.correct(&bbox_web_merc, &bbox),
            GroundScale::Unknown
        );
    }

    #[test]
    fn latitude_settles_only_pending_scales() {
        assert_known(GroundScale::PendingLatitude(7.0).resolve_latitude(60.0), 14.0);
        assert_known(GroundScale::Known(7.0).resolve_latitude(60.0), 7.0);
    }

    #[test]
    fn denominator_calibration_latitude() {
        let bbox = BBox::new(8.01, 49.09, 8.05, 49.12);

        let scale = |anchor: Anchor| {
            GroundScale::from_request(ScaleRequest::Denominator(25000.0), &anchor, 1.0)
        };

        assert_known(
            scale(Anchor::Center(Coord::new(8.0327, 49.0748))),
            7.0 / 49.0748_f64.to_radians().cos(),
        );
        assert_known(
            scale(Anchor::BBox { bbox, center: None }),
            7.0 / 49.105_f64.to_radians().cos(),
        );
        assert_known(
            scale(Anchor::BBox {
                bbox,
                center: Some(Coord::new(8.03, 48.0)),
            }),
            7.0 / 48.0_f64.to_radians().cos(),
        );
        assert_eq!(
            scale(Anchor::Unspecified),
            GroundScale::PendingLatitude(25000.0 * METERS_PER_PIXEL_AT_UNIT_SCALE)
        );
    }

    #[test]
    fn zoom_ignores_latitude() {
        let anchor = Anchor::Center(Coord::new(8.0327, 49.0748));

        assert_known(
            GroundScale::from_request(ScaleRequest::Zoom(14.0), &anchor, 2.0),
            9.554620465197562 / 2.0,
        );
    }
}
