//! Engine configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables of an engine instance, loadable from TOML.
///
/// ```toml
/// max_call_depth = 500
/// module_paths = ["lib", "."]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nested calls allowed before a stack overflow error
    pub max_call_depth: usize,
    /// Remaining stack that triggers growth
    pub stack_red_zone: usize,
    /// Size of each stack growth segment
    pub stack_grow_size: usize,
    /// Directories searched by `import a.b;`
    pub module_paths: Vec<PathBuf>,
    /// File extension of module sources
    pub module_extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_call_depth: 1000,
            stack_red_zone: 128 * 1024,
            stack_grow_size: 4 * 1024 * 1024,
            module_paths: vec![PathBuf::from(".")],
            module_extension: "pt".to_string(),
        }
    }
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Path of `a.b` under `dir`: `dir/a/b.<ext>`
    pub fn module_file(&self, dir: &Path, module: &str) -> PathBuf {
        let mut path = dir.to_path_buf();
        path.extend(module.split('.'));
        path.set_extension(&self.module_extension);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_call_depth, 1000);
        assert_eq!(config.module_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.module_extension, "pt");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("max_call_depth = 50\nmodule_paths = [\"lib\"]").unwrap();
        assert_eq!(config.max_call_depth, 50);
        assert_eq!(config.module_paths, vec![PathBuf::from("lib")]);
        assert_eq!(config.stack_red_zone, 128 * 1024);
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("max_call_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_module_file() {
        let config = EngineConfig::default();
        let path = config.module_file(Path::new("lib"), "util.math");
        assert_eq!(path, Path::new("lib").join("util").join("math.pt"));
    }
}
