//! vpack configuration
//!
//! Priority (highest to lowest):
//! 1. Command-line flags (applied by the caller)
//! 2. Environment variables (`VPACK_LOG_LEVEL`, `VPACK_OUTPUT`, `VPACK_MAX_INPUT_BYTES`)
//! 3. Explicit `--config` file (toml, yaml or json by extension)
//! 4. `vpack.yaml` in the working directory
//! 5. `vpack.toml` in the working directory
//! 6. Default values

use std::path::Path;

use clap::ValueEnum;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VpackError};

/// Rendering of packed bytes and table listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lowercase hex digits
    #[default]
    Hex,
    /// Bytes written verbatim to stdout
    Raw,
    /// JSON document
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VpackConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub output: OutputFormat,
    /// Upper bound on bytes read for `unpack`
    pub max_input_bytes: u64,
}

impl Default for VpackConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            output: OutputFormat::Hex,
            max_input_bytes: 16 * 1024 * 1024,
        }
    }
}

impl VpackConfig {
    /// Layered provider chain without environment variables
    fn file_figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(VpackConfig::default()))
            .merge(Toml::file("vpack.toml"))
            .merge(Yaml::file("vpack.yaml"));

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(VpackError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let extension = path
                .extension()
                .and_then(|s| s.to_str())
                .ok_or_else(|| VpackError::config("Config file must have an extension"))?;

            figment = match extension {
                "toml" => figment.merge(Toml::file(path)),
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "json" => figment.merge(Json::file(path)),
                _ => {
                    return Err(VpackError::config(format!(
                        "Unsupported config file format: {}",
                        extension
                    )))
                },
            };
        }

        Ok(figment)
    }

    /// Load configuration from files and `VPACK_*` environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::file_figment(explicit)?
            .merge(Env::prefixed("VPACK_"))
            .extract()
            .map_err(|e| VpackError::config(format!("Failed to load configuration: {}", e)))
    }

    /// Load configuration from files only
    pub fn load_files(explicit: Option<&Path>) -> Result<Self> {
        Self::file_figment(explicit)?
            .extract()
            .map_err(|e| VpackError::config(format!("Failed to load configuration: {}", e)))
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        output: Option<OutputFormat>,
    ) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = VpackConfig::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.output, OutputFormat::Hex);
        assert_eq!(config.max_input_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_config(".yaml", "log_level: debug\noutput: json\n");
        let config = VpackConfig::load_files(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output, OutputFormat::Json);
        // Untouched keys keep their defaults
        assert_eq!(config.max_input_bytes, VpackConfig::default().max_input_bytes);
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(".toml", "output = \"raw\"\nmax_input_bytes = 1024\n");
        let config = VpackConfig::load_files(Some(file.path())).unwrap();
        assert_eq!(config.output, OutputFormat::Raw);
        assert_eq!(config.max_input_bytes, 1024);
    }

    #[test]
    fn test_load_json_file() {
        let file = write_config(".json", r#"{"log_level": "trace"}"#);
        let config = VpackConfig::load_files(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "output = hex\n");
        let err = VpackConfig::load_files(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = VpackConfig::load_files(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, VpackError::Config(_)));
    }

    #[test]
    fn test_invalid_output_value() {
        let file = write_config(".yaml", "output: binary\n");
        assert!(VpackConfig::load_files(Some(file.path())).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let config = VpackConfig::default()
            .with_overrides(Some("info".into()), Some(OutputFormat::Json));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.output, OutputFormat::Json);

        let unchanged = VpackConfig::default().with_overrides(None, None);
        assert_eq!(unchanged, VpackConfig::default());
    }
}
