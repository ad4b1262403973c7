use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the overlay manager
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to create overlay surface: {0}")]
    SurfaceCreation(String),
}

/// Native event interception could not be attached
#[derive(Debug, Error)]
#[error("failed to attach event router: {0}")]
pub struct AttachError(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}
