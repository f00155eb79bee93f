//! Resolve the geometry of a rendered map from any mix of zoom, scale, paper
//! size, pixel size, center, bounding box and fit-to-layers, and drive an
//! external renderer with it.

pub mod backend;
pub mod bbox;
pub mod error;
pub mod geometry;
pub mod georef;
pub mod layers;
pub mod map_url;
pub mod options;
pub mod paper;
pub mod projection;
pub mod render;
pub mod tiles;

pub use backend::BackendConfig;
pub use error::ConfigurationError;
pub use geometry::{GeometryRequest, ResolvedGeometry, resolve};
pub use options::Options;
