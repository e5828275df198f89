use std::fmt;

use thiserror::Error;

use crate::backend::ShaderStage;

/// Fatal outcomes of engine creation or of a frame tick.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host could not hand out a GPU context for the surface.
    #[error("rendering unsupported: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    ShaderCompile {
        stage: ShaderStage,
        diagnostic: String,
    },
    #[error("shader program failed to link:\n{diagnostic}")]
    ProgramLink { diagnostic: String },
    /// A parameter uniform the contract declares has no snapshot entry.
    #[error("uniform '{name}' is declared by the contract but missing from the snapshot")]
    MissingSnapshotEntry { name: String },
    #[error("frame failed: {0}")]
    Frame(#[from] DrawError),
}

impl EngineError {
    /// True for errors caused by shader sources rather than the host.
    pub fn is_authoring_defect(&self) -> bool {
        matches!(
            self,
            EngineError::ShaderCompile { .. } | EngineError::ProgramLink { .. }
        )
    }
}

/// Why a single draw did not reach the screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("surface is outdated or lost")]
    SurfaceLost,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("{0}")]
    Other(String),
}

impl DrawError {
    /// Surface hiccups that clear up by themselves; the next frame retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, DrawError::SurfaceLost | DrawError::Timeout)
    }
}

/// A contract uniform the linked program does not expose.
///
/// Non-fatal: uploads for the uniform are skipped for the engine's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformResolutionWarning {
    pub name: String,
}

impl fmt::Display for UniformResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uniform '{}' has no matching location in the linked program",
            self.name
        )
    }
}
