//! Errors raised while loading config layers and topic files.

use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned while loading or validating config and topics.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config layer, topic file or topic directory could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Malformed JSON5, or JSON5 that does not fit the target type.
    #[error("{origin} is not valid: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged layers do not decode into the config types.
    #[error("{origin} does not decode: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    /// A specific field failed schema validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A cross-field invariant does not hold.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// A topic id could not be resolved from the catalogue.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
}

impl ConfigError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a UTF-8 file, tagging failures with its path.
pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::read(path, source))
}

/// Parse JSON5 into `T`, tagging failures with `origin`.
pub(crate) fn parse_json5<T: DeserializeOwned>(
    contents: &str,
    origin: &str,
) -> Result<T, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        origin: origin.to_string(),
        source,
    })
}
