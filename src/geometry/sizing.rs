use super::{
    Capabilities, MM_PER_INCH, OutputSetup, PhysicalSize, REFERENCE_PPI, SizeRequest,
};
use crate::{error::ConfigurationError, paper::Paper};
use serde::Serialize;

/// Pixel dimensions; a 0 on one axis means "derive from the bbox aspect".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub const fn swapped(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Stage 2: physical size into pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Sizing {
    pub pixels_per_mm: f64,
    /// Render-time multiplier, `ppi / 90.7`.
    pub scale_factor: f64,
    pub pixel_size: Option<PixelSize>,
    /// Width and height may be swapped to fit a portrait bbox.
    pub rotate: bool,
}

impl Sizing {
    pub fn resolve(
        setup: &OutputSetup,
        request: &SizeRequest,
        capabilities: Capabilities,
    ) -> Result<Self, ConfigurationError> {
        let mut rotate = !request.no_rotate;

        let dim_mm = match &request.physical {
            PhysicalSize::Unspecified => None,
            PhysicalSize::Paper(name) => {
                let paper = Paper::parse(name)?;

                rotate = paper.rotate();

                Some(paper.dim_mm)
            }
            PhysicalSize::Millimeters(dim_mm) => Some(*dim_mm),
        };

        let dim_mm = match (dim_mm, request.margin_mm) {
            (Some([width, height]), Some(margin)) => Some([
                (width - margin * 2.0).max(0.0),
                (height - margin * 2.0).max(0.0),
            ]),
            (dim_mm, _) => dim_mm,
        };

        let (mut scale_factor, mut pixels_per_mm) = match request.ppi {
            Some(ppi) => (ppi / REFERENCE_PPI, ppi / MM_PER_INCH),
            None => (
                request.factor,
                REFERENCE_PPI / MM_PER_INCH * request.factor,
            ),
        };

        if scale_factor != 1.0 && setup.vector_surface && !capabilities.vector_scaling {
            tracing::warn!(
                "Renderer cannot scale {} output, ignoring scale factor {scale_factor}",
                setup.format
            );

            scale_factor = 1.0;

            pixels_per_mm = REFERENCE_PPI / MM_PER_INCH;
        }

        let pixel_size = request
            .pixels
            .map(|[width, height]| PixelSize::new(width, height))
            .or_else(|| {
                dim_mm.map(|[width, height]| {
                    PixelSize::new(
                        to_pixels(width * pixels_per_mm),
                        to_pixels(height * pixels_per_mm),
                    )
                })
            });

        if let Some(size) = pixel_size {
            if u64::from(size.width) + u64::from(size.height) == 0 {
                return Err(ConfigurationError::NonPositiveSize);
            }
        }

        Ok(Self {
            pixels_per_mm,
            scale_factor,
            pixel_size,
            rotate,
        })
    }
}

/// Round half to even and clamp into `u32`.
pub(crate) fn to_pixels(value: f64) -> u32 {
    value.round_ties_even().clamp(0.0, f64::from(u32::MAX)) as u32
}
