//! Keeps one engine running in a window across frame failures.
//!
//! A failed frame disposes the engine and builds a replacement with the
//! caller's factory. Shader compile and link errors end the preview at once,
//! running out of GPU memory ends it too, and anything else is retried up to
//! [`MAX_RECREATE_ATTEMPTS`] times in a row. A presented frame resets the
//! count.

use anyhow::{anyhow, Result};

use crate::engine::{Engine, FrameOutcome};
use crate::error::{DrawError, EngineError};
use crate::host::{FrameToken, ListenerId, RenderSurface};

/// Consecutive failed re-creations after which the preview gives up.
pub const MAX_RECREATE_ATTEMPTS: u32 = 3;

pub struct EngineSupervisor<S: RenderSurface> {
    engine: Option<Engine<S>>,
    failed_recreates: u32,
}

impl<S: RenderSurface> EngineSupervisor<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self {
            engine: Some(engine),
            failed_recreates: 0,
        }
    }

    pub fn engine(&self) -> Option<&Engine<S>> {
        self.engine.as_ref()
    }

    pub fn failed_recreates(&self) -> u32 {
        self.failed_recreates
    }

    /// Runs the frame for `token`. `build` is only called when the frame
    /// fails and the engine has to be replaced.
    pub fn on_frame(
        &mut self,
        token: FrameToken,
        build: impl FnMut() -> Result<Engine<S>, EngineError>,
    ) -> Result<FrameOutcome> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(FrameOutcome::Ignored);
        };
        match engine.on_frame(token) {
            Ok(FrameOutcome::Presented) => {
                self.failed_recreates = 0;
                Ok(FrameOutcome::Presented)
            }
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Frame(DrawError::OutOfMemory)) => {
                Err(anyhow!("GPU ran out of memory; closing preview"))
            }
            Err(err) => {
                tracing::warn!(error = %err, "frame failed; re-creating engine");
                self.recreate(build)?;
                Ok(FrameOutcome::Ignored)
            }
        }
    }

    /// Disposes the current engine before building a new one so two engines
    /// never target the same surface.
    fn recreate(
        &mut self,
        mut build: impl FnMut() -> Result<Engine<S>, EngineError>,
    ) -> Result<()> {
        if let Some(mut old) = self.engine.take() {
            old.dispose();
        }
        loop {
            match build() {
                Ok(engine) => {
                    self.engine = Some(engine);
                    return Ok(());
                }
                Err(err) if err.is_authoring_defect() => return Err(err.into()),
                Err(err) => {
                    self.failed_recreates += 1;
                    tracing::warn!(
                        error = %err,
                        attempt = self.failed_recreates,
                        "engine re-creation failed"
                    );
                    if self.failed_recreates >= MAX_RECREATE_ATTEMPTS {
                        return Err(anyhow!(
                            "giving up after {MAX_RECREATE_ATTEMPTS} failed re-creations: {err}"
                        ));
                    }
                }
            }
        }
    }

    pub fn on_resize(&mut self, listener: ListenerId) -> bool {
        self.engine
            .as_mut()
            .is_some_and(|engine| engine.on_resize(listener))
    }

    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
    }
}
