//! Embed-task configuration.
//!
//! Load the embedder's inputs from a TOML file so build integration needs no
//! code changes.
//!
//! ```
//! use marq_embed::EmbedConfig;
//!
//! let config = EmbedConfig::from_toml_str(r#"
//!     input = "target/client.module"
//!     output = "target/client.embedded.module"
//!     references = ["target/ui.module"]
//! "#).unwrap();
//!
//! assert_eq!(config.references.len(), 1);
//! assert!(config.strong_name_key.is_none());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Inputs of one embed run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbedConfig {
    /// The module to patch.
    pub input: PathBuf,

    /// Where the patched module is written.
    pub output: PathBuf,

    /// Reference modules consulted during embedding.
    #[serde(default)]
    pub references: Vec<PathBuf>,

    /// Optional strong-name key file embedded into the written module.
    #[serde(default)]
    pub strong_name_key: Option<PathBuf>,
}

impl EmbedConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = EmbedConfig::from_toml_str(
            r#"
            input = "a.module"
            output = "b.module"
            "#,
        )
        .unwrap();
        assert_eq!(config.input, PathBuf::from("a.module"));
        assert_eq!(config.output, PathBuf::from("b.module"));
        assert!(config.references.is_empty());
    }

    #[test]
    fn rejects_config_without_output() {
        let err = EmbedConfig::from_toml_str(r#"input = "a.module""#);
        assert!(matches!(err, Err(ConfigError::Toml(_))));
    }
}
