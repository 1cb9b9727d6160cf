//! JSON persistence for network configs.
//!
//! A checkpoint only holds parameter values, so the config that rebuilds the network is
//! stored next to it and loaded first.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

/// Error that can occur when saving or loading a [config](Config).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The content is not a valid JSON document for the config.
    #[error("Malformed config: {0}")]
    InvalidFormat(String),

    /// No config file exists at the path.
    #[error("Config file {0} does not exist")]
    FileNotFound(String),

    /// The config file could not be read or written.
    #[error("Config file {path} is not accessible: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A serializable description of a network, stored as pretty-printed JSON.
pub trait Config: std::fmt::Debug + Serialize + DeserializeOwned {
    /// Writes the config to `file`, replacing its content.
    fn save<P: AsRef<Path>>(&self, file: P) -> Result<(), ConfigError> {
        let file = file.as_ref();
        let json = config_to_json(self)?;

        std::fs::write(file, json).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })
    }

    /// Reads a config written by [save](Config::save).
    fn load<P: AsRef<Path>>(file: P) -> Result<Self, ConfigError> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(file.display().to_string()),
            _ => ConfigError::Io {
                path: file.display().to_string(),
                source,
            },
        })?;

        config_from_str(&content)
    }

    /// Parses a config from UTF-8 encoded JSON bytes.
    fn load_binary(data: &[u8]) -> Result<Self, ConfigError> {
        let content = std::str::from_utf8(data)
            .map_err(|err| ConfigError::InvalidFormat(format!("not UTF-8 ({err})")))?;

        config_from_str(content)
    }
}

/// Pretty-printed JSON of a config.
pub fn config_to_json<C: Config>(config: &C) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|err| ConfigError::InvalidFormat(err.to_string()))
}

fn config_from_str<C: Config>(content: &str) -> Result<C, ConfigError> {
    serde_json::from_str(content).map_err(|err| ConfigError::InvalidFormat(err.to_string()))
}
