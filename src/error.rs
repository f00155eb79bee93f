use thiserror::Error;

/// Fatal input errors detected while resolving the output geometry.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("incorrect paper format: {0}")]
    UnknownPaperSize(String),

    #[error(
        "OZI map file output is only supported for Web Mercator (EPSG:3857), got projection {0}"
    )]
    SideFileNeedsWebMercator(String),

    #[error("bounding box not specified")]
    BoundingBoxUnspecified,

    #[error("image dimensions or scale were not specified")]
    PixelSizeUnspecified,

    #[error("both image dimensions are less or equal to zero")]
    NonPositiveSize,

    #[error("image size exceeds renderer limit ({size} > {limit}), use {hint}--tiles")]
    ExceedsRenderLimit {
        size: f64,
        limit: u32,
        hint: &'static str,
    },

    #[error(
        "--tiles needs a positive integer, or two integers separated by x; max. number of tiles is {max}, got {value}"
    )]
    InvalidTiles { value: String, max: u32 },

    #[error("projection {definition}: {message}")]
    Projection { definition: String, message: String },
}

impl ConfigurationError {
    pub fn exceeds_render_limit(size: f64, limit: u32, tiled: bool) -> Self {
        Self::ExceedsRenderLimit {
            size,
            limit,
            hint: if tiled { "a larger value for " } else { "" },
        }
    }
}
