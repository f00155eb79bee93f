//! Renderer backend configuration.

use crate::{geometry::Capabilities, layers::LayerTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Buffer around each tile in pixels, to prevent artifacts at tile edges.
pub const DEFAULT_TILE_BUFFER: u32 = 128;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Render command and its arguments; `{name}` placeholders are
    /// substituted per rendered image.
    pub command: Vec<String>,

    /// The renderer honours scale factors for svg and pdf output
    #[serde(default)]
    pub vector_scaling: bool,

    /// Tile buffer in pixels
    #[serde(default = "default_buffer")]
    pub buffer: u32,

    /// Known layer extents for `--fit`
    #[serde(default)]
    pub layers: LayerTable,
}

fn default_buffer() -> u32 {
    DEFAULT_TILE_BUFFER
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "mapshot-render".to_string(),
                "--style".to_string(),
                "{style}".to_string(),
                "--bbox".to_string(),
                "{bbox}".to_string(),
                "--srs".to_string(),
                "{srs}".to_string(),
                "--size".to_string(),
                "{width}x{height}".to_string(),
                "--scale-factor".to_string(),
                "{scale_factor}".to_string(),
                "--format".to_string(),
                "{format}".to_string(),
                "--buffer".to_string(),
                "{buffer}".to_string(),
                "{output}".to_string(),
            ],
            vector_scaling: false,
            buffer: DEFAULT_TILE_BUFFER,
            layers: LayerTable::default(),
        }
    }
}

impl BackendConfig {
    /// Load from YAML or JSON, by extension; anything else is tried as YAML.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "json" => Ok(serde_json::from_str(&contents)?),
            _ => Self::from_yaml(&contents),
        }
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.command.first() {
            None => anyhow::bail!("Backend command must not be empty"),
            Some(program) if program.trim().is_empty() => {
                anyhow::bail!("Backend program name must not be blank")
            }
            Some(_) => {}
        }

        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            vector_scaling: self.vector_scaling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_with_defaults() {
        let config = BackendConfig::from_yaml(
            r#"
command: ["render", "{style}", "{output}"]
layers:
  route:
    extent: [8.0, 49.0, 8.1, 49.1]
"#,
        )
        .unwrap();

        assert_eq!(config.command, ["render", "{style}", "{output}"]);
        assert!(!config.vector_scaling);
        assert_eq!(config.buffer, DEFAULT_TILE_BUFFER);
        assert_eq!(config.layers.0["route"].extent, [8.0, 49.0, 8.1, 49.1]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_file() {
        let path =
            std::env::temp_dir().join(format!("mapshot-backend-{}.json", std::process::id()));

        std::fs::write(
            &path,
            r#"{"command": ["render"], "vector_scaling": true, "buffer": 64}"#,
        )
        .unwrap();

        let config = BackendConfig::from_file(&path).unwrap();

        std::fs::remove_file(&path).unwrap();

        assert!(config.capabilities().vector_scaling);
        assert_eq!(config.buffer, 64);
    }

    #[test]
    fn yaml_file_with_other_extension() {
        let path =
            std::env::temp_dir().join(format!("mapshot-backend-{}.conf", std::process::id()));

        std::fs::write(&path, "command: [render]\nvector_scaling: true\n").unwrap();

        let config = BackendConfig::from_file(&path).unwrap();

        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.command, ["render"]);
        assert_eq!(config.capabilities(), Capabilities { vector_scaling: true });
    }

    #[test]
    fn empty_command_is_rejected() {
        let config = BackendConfig::from_yaml("command: []").unwrap();

        assert!(config.validate().is_err());

        let config = BackendConfig::from_yaml("command: ['  ']").unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn default_is_valid() {
        assert!(BackendConfig::default().validate().is_ok());
    }
}
