//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration and calculator specs from YAML.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::CalculatorSpec;

use super::types::EngineConfig;

/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "CALC_HOST";

/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "CALC_PORT";

/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "CALC_LOG_LEVEL";

/// Loads and provides access to engine configuration.
///
/// # File Format
///
/// ```text
/// server:
///   host: 0.0.0.0
///   port: 8080
/// logging:
///   level: debug
/// units:
///   - from: st
///     to: kg
///     factor: 6.35029318
/// ```
///
/// # Example
///
/// ```
/// use clinical_calculators::config::ConfigLoader;
///
/// let loader = ConfigLoader::default();
/// assert_eq!(loader.config().server.address(), "127.0.0.1:8000");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from a YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML or unknown value types (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config = Self::load_yaml::<EngineConfig>(path.as_ref())?;
        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Applies `CALC_HOST`, `CALC_PORT` and `CALC_LOG_LEVEL` from the process
    /// environment.
    pub fn apply_env(self) -> EngineResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// Fails with `ConfigParseError` if the port is not a valid number.
    pub fn apply_overrides<F>(mut self, lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.config.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            let parsed: u16 = port.trim().parse().map_err(|e| EngineError::ConfigParseError {
                path: ENV_PORT.to_string(),
                message: format!("invalid port '{}': {}", port, e),
            })?;
            self.config.server.port = parsed;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.config.logging.level = level;
        }
        Ok(self)
    }

    /// Parses a calculator spec from YAML.
    ///
    /// `origin` names the source in error messages.
    pub fn spec_from_yaml(origin: &str, yaml: &str) -> EngineResult<CalculatorSpec> {
        serde_yaml::from_str(yaml).map_err(|e| EngineError::ConfigParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader and returns the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_HOST, DEFAULT_PORT};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_configuration() {
        let file = write_config(
            r#"
server:
  host: 0.0.0.0
  port: 9000
logging:
  level: debug
units:
  - from: st
    to: kg
    factor: 6.35029318
"#,
        );
        let loader = ConfigLoader::load(file.path()).unwrap();
        let config = loader.config();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.units.len(), 1);
        assert_eq!(config.units[0].offset, 0.0);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let file = write_config("logging:\n  level: warn\n");
        let config = ConfigLoader::load(file.path()).unwrap().into_config();

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "warn");
        assert!(config.units.is_empty());
    }

    #[test]
    fn test_load_missing_file_returns_error() {
        match ConfigLoader::load("/nonexistent/engine.yaml") {
            Err(EngineError::ConfigNotFound { path }) => assert!(path.contains("engine.yaml")),
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_invalid_yaml_returns_parse_error() {
        let file = write_config("server:\n  port: not-a-port\n");
        assert!(matches!(
            ConfigLoader::load(file.path()),
            Err(EngineError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [(ENV_HOST, "10.0.0.5"), (ENV_PORT, "8443"), (ENV_LOG_LEVEL, "trace")]
            .into_iter()
            .collect();
        let loader = ConfigLoader::default()
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(loader.config().server.address(), "10.0.0.5:8443");
        assert_eq!(loader.config().logging.level, "trace");
    }

    #[test]
    fn test_invalid_port_override_rejected() {
        let result = ConfigLoader::default().apply_overrides(|key| {
            (key == ENV_PORT).then(|| "eighty".to_string())
        });
        match result {
            Err(EngineError::ConfigParseError { path, message }) => {
                assert_eq!(path, ENV_PORT);
                assert!(message.contains("eighty"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_spec_from_yaml() {
        let spec = ConfigLoader::spec_from_yaml(
            "demo.yaml",
            r#"
name: demo
version: "2.0"
inputs:
  - name: x
    type: number
    required: true
outputs:
  - name: result
    type: number
  - name: working
    type: string
"#,
        )
        .unwrap();

        assert_eq!(spec.name, "demo");
        assert_eq!(spec.version, "2.0");
        assert!(spec.input("x").unwrap().required);
    }

    #[test]
    fn test_spec_from_yaml_reports_origin() {
        match ConfigLoader::spec_from_yaml("broken.yaml", "name: [") {
            Err(EngineError::ConfigParseError { path, .. }) => assert_eq!(path, "broken.yaml"),
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }
}
