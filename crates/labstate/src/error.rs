use std::path::PathBuf;

use renderer::{SnapshotError, UniformKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("parameter '{0}' rejects non-finite values")]
    NonFinite(String),
    #[error("parameter '{name}' expects a {expected} value")]
    KindMismatch { name: String, expected: UniformKind },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialise lab state")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to encode JSON")]
    Json(#[from] serde_json::Error),
    #[error("no skin named '{0}'")]
    UnknownSkin(String),
    #[error("no preset named '{0}'")]
    UnknownPreset(String),
}

pub type Result<T, E = StateError> = std::result::Result<T, E>;
