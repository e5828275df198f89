//! Renderer crate for shaderlab.
//!
//! A single full-screen fragment shader is compiled and linked once, then
//! redrawn every display refresh with uniforms read from a shared snapshot:
//!
//! ```text
//!   ParameterStore ──set──▶ SnapshotHandle ◀──read once per frame── Engine
//!                                                                    │
//!   FrameScheduler ──token──▶ Engine::on_frame ──upload──▶ Backend ──draw──▶ surface
//!   ResizeObserver ──listener──▶ Engine::on_resize ──▶ ViewportTracker
//! ```
//!
//! [`Engine`] is generic over a [`RenderSurface`], which supplies the
//! [`Backend`]. The `gpu` module implements the backend on `wgpu`, and the
//! `window` module hosts it in a `winit` event loop, with an
//! [`EngineSupervisor`] replacing the engine after frame failures. Both the
//! surface and the backend can be swapped for recording fakes (see `testing`,
//! enabled for tests or with the `testing` feature) to exercise the engine
//! and supervisor without a GPU.

mod backend;
mod compile;
mod contract;
mod engine;
mod error;
mod gpu;
mod host;
mod runtime;
mod snapshot;
mod supervisor;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod viewport;
pub mod window;

pub use backend::{Backend, ShaderStage};
pub use compile::{with_version_directive, FULLSCREEN_VERTEX_GLSL};
pub use contract::{ShaderVariant, UniformContract, UniformDecl, UniformKind, UniformSource};
pub use engine::{Engine, EngineOptions, FrameOutcome, ShaderSources, FULLSCREEN_TRIANGLE};
pub use error::{DrawError, EngineError, UniformResolutionWarning};
pub use gpu::{ShaderPipeline, UniformSlot, WgpuBackend, WgpuShader};
pub use host::{FrameScheduler, FrameToken, HostHooks, ListenerId, RenderSurface, ResizeObserver};
pub use runtime::{BoxedTimeSource, SteppedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use snapshot::{SnapshotError, SnapshotHandle, UniformSnapshot, UniformValue};
pub use supervisor::{EngineSupervisor, MAX_RECREATE_ATTEMPTS};
pub use viewport::{
    LogicalSize, PixelSize, ViewportChange, ViewportTracker, DEFAULT_DPR_CAP, MAX_DPR_CAP,
    MIN_DPR_CAP,
};
pub use window::{run_preview, KeyResponse, PreviewController, PreviewOptions, WgpuSurface};
