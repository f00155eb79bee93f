use super::OutputRequest;
use crate::{error::ConfigurationError, projection::Projection};
use std::path::Path;

const DEFAULT_FORMAT: &str = "png256";

/// Stage 1: output format and target projection.
#[derive(Debug)]
pub struct OutputSetup {
    pub format: String,
    /// svg and pdf need a vector surface instead of a raster buffer.
    pub vector_surface: bool,
    pub to_stdout: bool,
    pub projection: Projection,
}

impl OutputSetup {
    pub fn resolve(request: &OutputRequest) -> Result<Self, ConfigurationError> {
        // checked before any transform is built
        if request.ozi {
            if let Some(projection) = request
                .projection
                .as_deref()
                .filter(|projection| !Projection::is_web_mercator_definition(projection))
            {
                return Err(ConfigurationError::SideFileNeedsWebMercator(
                    projection.to_string(),
                ));
            }
        }

        let format = output_format(request.format.as_deref(), &request.output);

        let vector_surface = matches!(format.as_str(), "svg" | "pdf");

        let projection = Projection::from_definition(request.projection.as_deref())?;

        Ok(Self {
            format,
            vector_surface,
            to_stdout: request.output == "-",
            projection,
        })
    }
}

/// Explicit format, else output extension, else `png256`; lowercased.
pub fn output_format(explicit: Option<&str>, output: &str) -> String {
    explicit
        .or_else(|| Path::new(output).extension().and_then(|ext| ext.to_str()))
        .unwrap_or(DEFAULT_FORMAT)
        .to_lowercase()
}
