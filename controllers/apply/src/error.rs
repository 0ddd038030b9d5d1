//! Binary-level error types.

use thiserror::Error;

/// Errors raised while preparing an invocation, before the engine
/// takes over.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Definition file could not be read.
    #[error("cannot read definition source: {0}")]
    Io(#[from] std::io::Error),

    /// Definition is not valid YAML.
    #[error("cannot parse definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Definition parsed but is not a usable resource object.
    #[error("invalid resource definition: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable definition source was given.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}
