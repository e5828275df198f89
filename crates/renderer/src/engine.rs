//! The rendering engine: one compiled program, one frame loop, one surface.
//!
//! Lifecycle:
//! - [`Engine::create`] acquires the backend, compiles and links exactly once,
//!   resolves uniform locations, sizes the viewport, then registers a resize
//!   listener and the first frame callback.
//! - [`Engine::on_frame`] syncs the viewport, samples the clock, uploads every
//!   resolved uniform from the shared snapshot, draws once, and reschedules.
//! - [`Engine::dispose`] undoes everything in a fixed order. It also runs on
//!   construction failure and on drop.
//!
//! Parameter changes never reach this module except through the snapshot.

use std::time::{Duration, Instant};

use crate::backend::{Backend, ShaderStage};
use crate::compile::FULLSCREEN_VERTEX_GLSL;
use crate::contract::{UniformContract, UniformSource};
use crate::error::{EngineError, UniformResolutionWarning};
use crate::host::{FrameToken, HostHooks, ListenerId, RenderSurface};
use crate::runtime::{BoxedTimeSource, FpsCounter, SystemTimeSource};
use crate::snapshot::{SnapshotHandle, UniformValue};
use crate::viewport::{PixelSize, ViewportChange, ViewportTracker, DEFAULT_DPR_CAP};

/// Full-viewport triangle in clip space, two floats per vertex.
pub const FULLSCREEN_TRIANGLE: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
const FULLSCREEN_VERTEX_COUNT: u32 = 3;
const FPS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Vertex and fragment GLSL handed to [`Engine::create`].
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Pairs `fragment` with the built-in full-screen triangle vertex stage.
    pub fn fullscreen(fragment: impl Into<String>) -> Self {
        Self::new(FULLSCREEN_VERTEX_GLSL, fragment)
    }
}

/// Everything the engine needs besides the surface, snapshot and hooks.
pub struct EngineOptions {
    pub contract: UniformContract,
    pub dpr_cap: f64,
    pub time_source: BoxedTimeSource,
}

impl EngineOptions {
    pub fn new(contract: UniformContract) -> Self {
        Self {
            contract,
            dpr_cap: DEFAULT_DPR_CAP,
            time_source: Box::new(SystemTimeSource::new()),
        }
    }

    pub fn with_dpr_cap(mut self, dpr_cap: f64) -> Self {
        self.dpr_cap = dpr_cap;
        self
    }

    pub fn with_time_source(mut self, time_source: BoxedTimeSource) -> Self {
        self.time_source = time_source;
        self
    }
}

/// What a frame callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// One draw was issued and the next frame requested.
    Presented,
    /// The surface has no area; nothing was drawn but the loop continues.
    Idle,
    /// The surface was not ready to present; the next frame was requested.
    Skipped,
    /// The token was stale, cancelled, or the engine is disposed.
    Ignored,
}

/// Whatever part of the program has been created so far.
struct GpuProgram<B: Backend> {
    vertices: Option<B::Buffer>,
    vertex: Option<B::Shader>,
    fragment: Option<B::Shader>,
    program: Option<B::Program>,
}

impl<B: Backend> GpuProgram<B> {
    fn empty() -> Self {
        Self {
            vertices: None,
            vertex: None,
            fragment: None,
            program: None,
        }
    }

    fn release(&mut self, backend: &mut B) {
        if let Some(buffer) = self.vertices.take() {
            backend.delete_buffer(buffer);
        }
        if let Some(shader) = self.vertex.take() {
            backend.delete_shader(shader);
        }
        if let Some(shader) = self.fragment.take() {
            backend.delete_shader(shader);
        }
        if let Some(program) = self.program.take() {
            backend.delete_program(program);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UniformBinding {
    Time,
    Resolution,
    Parameter { slot: usize },
}

#[derive(Debug, Clone, Copy)]
struct ResolvedUniform<L> {
    location: L,
    binding: UniformBinding,
    decl: usize,
}

type Location<S> = <<S as RenderSurface>::Backend as Backend>::Location;

/// Handle to a running preview. Drop or [`Engine::dispose`] to tear down.
pub struct Engine<S: RenderSurface> {
    surface: S,
    backend: S::Backend,
    snapshot: SnapshotHandle,
    contract: UniformContract,
    program: GpuProgram<S::Backend>,
    uniforms: Vec<ResolvedUniform<Location<S>>>,
    warnings: Vec<UniformResolutionWarning>,
    viewport: ViewportTracker,
    clock: BoxedTimeSource,
    hooks: HostHooks,
    pending_frame: Option<FrameToken>,
    listener: Option<ListenerId>,
    fps: FpsCounter,
    disposed: bool,
}

impl<S: RenderSurface> Engine<S> {
    pub fn create(
        mut surface: S,
        snapshot: SnapshotHandle,
        sources: &ShaderSources,
        options: EngineOptions,
        hooks: HostHooks,
    ) -> Result<Self, EngineError> {
        let backend = surface
            .create_backend()
            .map_err(EngineError::ContextUnavailable)?;
        validate_snapshot(&options.contract, &snapshot)?;

        let EngineOptions {
            contract,
            dpr_cap,
            time_source,
        } = options;
        let mut engine = Self {
            surface,
            backend,
            snapshot,
            contract,
            program: GpuProgram::empty(),
            uniforms: Vec::new(),
            warnings: Vec::new(),
            viewport: ViewportTracker::new(dpr_cap),
            clock: time_source,
            hooks,
            pending_frame: None,
            listener: None,
            fps: FpsCounter::new(FPS_LOG_INTERVAL),
            disposed: false,
        };

        if let Err(err) = engine.initialise(sources) {
            tracing::error!(error = %err, "engine initialisation failed; releasing resources");
            engine.dispose();
            return Err(err);
        }
        Ok(engine)
    }

    fn initialise(&mut self, sources: &ShaderSources) -> Result<(), EngineError> {
        self.program.vertices = Some(self.backend.create_vertex_buffer(&FULLSCREEN_TRIANGLE));

        let vertex = self
            .backend
            .compile_shader(ShaderStage::Vertex, &sources.vertex)
            .map_err(|diagnostic| EngineError::ShaderCompile {
                stage: ShaderStage::Vertex,
                diagnostic,
            })?;
        self.program.vertex = Some(vertex);

        let fragment = self
            .backend
            .compile_shader(ShaderStage::Fragment, &sources.fragment)
            .map_err(|diagnostic| EngineError::ShaderCompile {
                stage: ShaderStage::Fragment,
                diagnostic,
            })?;
        self.program.fragment = Some(fragment);

        let program = match (&self.program.vertex, &self.program.fragment) {
            (Some(vertex), Some(fragment)) => self
                .backend
                .link_program(vertex, fragment)
                .map_err(|diagnostic| EngineError::ProgramLink { diagnostic })?,
            _ => {
                return Err(EngineError::ProgramLink {
                    diagnostic: "shader stages missing at link time".into(),
                })
            }
        };
        self.program.program = Some(program);

        self.resolve_uniforms();
        self.sync_viewport();

        self.listener = Some(self.hooks.resize.subscribe());
        self.pending_frame = Some(self.hooks.scheduler.request_frame());
        self.clock.reset();
        tracing::info!(
            uniforms = self.uniforms.len(),
            skipped = self.warnings.len(),
            "engine ready"
        );
        Ok(())
    }

    fn resolve_uniforms(&mut self) {
        let Some(program) = self.program.program.as_ref() else {
            return;
        };
        for (index, decl) in self.contract.decls().iter().enumerate() {
            let binding = match decl.source {
                UniformSource::Time => UniformBinding::Time,
                UniformSource::Resolution => UniformBinding::Resolution,
                UniformSource::Parameter => {
                    match self.snapshot.read(|snapshot| snapshot.position(&decl.name)) {
                        Some(slot) => UniformBinding::Parameter { slot },
                        None => continue,
                    }
                }
            };
            match self.backend.uniform_location(program, &decl.name, decl.kind) {
                Some(location) => self.uniforms.push(ResolvedUniform {
                    location,
                    binding,
                    decl: index,
                }),
                None => {
                    let warning = UniformResolutionWarning {
                        name: decl.name.clone(),
                    };
                    tracing::warn!(uniform = %decl.name, kind = %decl.kind, "{warning}; uploads skipped");
                    self.warnings.push(warning);
                }
            }
        }
    }

    /// Handles one frame callback from the scheduler.
    pub fn on_frame(&mut self, token: FrameToken) -> Result<FrameOutcome, EngineError> {
        if self.disposed || self.pending_frame != Some(token) {
            tracing::trace!(?token, "ignoring stale frame callback");
            return Ok(FrameOutcome::Ignored);
        }
        self.pending_frame = None;

        let change = self.sync_viewport();
        let sample = self.clock.sample();
        if change == ViewportChange::Empty {
            self.schedule_next();
            return Ok(FrameOutcome::Idle);
        }

        self.upload_uniforms(sample.seconds);
        let (Some(program), Some(vertices)) =
            (self.program.program.as_mut(), self.program.vertices.as_ref())
        else {
            return Ok(FrameOutcome::Ignored);
        };
        if let Err(err) = self
            .backend
            .draw(program, vertices, FULLSCREEN_VERTEX_COUNT)
        {
            if err.is_transient() {
                tracing::debug!(error = %err, frame = sample.frame_index, "skipping frame");
                self.schedule_next();
                return Ok(FrameOutcome::Skipped);
            }
            tracing::warn!(error = %err, frame = sample.frame_index, "draw failed; frame loop stopped");
            return Err(EngineError::Frame(err));
        }

        if let Some(fps) = self.fps.record(Instant::now()) {
            tracing::debug!(fps = format_args!("{fps:.1}"), "frame rate");
        }
        self.schedule_next();
        Ok(FrameOutcome::Presented)
    }

    /// Handles a size-change notification. Returns true when the backing
    /// buffer was reallocated.
    pub fn on_resize(&mut self, listener: ListenerId) -> bool {
        if self.disposed || self.listener != Some(listener) {
            tracing::trace!(?listener, "ignoring resize from inactive listener");
            return false;
        }
        matches!(self.sync_viewport(), ViewportChange::Resized(_))
    }

    fn sync_viewport(&mut self) -> ViewportChange {
        let change = self
            .viewport
            .update(self.surface.display_size(), self.surface.scale_factor());
        if let ViewportChange::Resized(size) = change {
            tracing::debug!(width = size.width, height = size.height, "resizing backing buffer");
            self.backend.resize(size);
        }
        change
    }

    fn upload_uniforms(&mut self, seconds: f32) {
        let Some(program) = self.program.program.as_mut() else {
            return;
        };
        let resolution = self
            .viewport
            .current()
            .map(|size| [size.width as f32, size.height as f32])
            .unwrap_or_default();
        let backend = &mut self.backend;
        let decls = self.contract.decls();
        let uniforms = &self.uniforms;
        self.snapshot.read(|snapshot| {
            for uniform in uniforms {
                let decl = &decls[uniform.decl];
                let value = match uniform.binding {
                    UniformBinding::Time => UniformValue::Float(seconds),
                    UniformBinding::Resolution => UniformValue::Vec2(resolution),
                    UniformBinding::Parameter { slot } => match snapshot.value_at(slot) {
                        Some(value) if value.kind() == decl.kind => decl.clamp(value),
                        _ => continue,
                    },
                };
                backend.upload(program, uniform.location, value.as_slice());
            }
        });
    }

    fn schedule_next(&mut self) {
        self.pending_frame = Some(self.hooks.scheduler.request_frame());
    }

    /// Releases every registration and GPU object. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(token) = self.pending_frame.take() {
            self.hooks.scheduler.cancel_frame(token);
        }
        if let Some(listener) = self.listener.take() {
            self.hooks.resize.unsubscribe(listener);
        }
        self.program.release(&mut self.backend);
        self.uniforms.clear();
        tracing::debug!("engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Uniforms the linked program did not expose, logged once at creation.
    pub fn warnings(&self) -> &[UniformResolutionWarning] {
        &self.warnings
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.viewport.current()
    }

    pub fn contract(&self) -> &UniformContract {
        &self.contract
    }

    pub fn snapshot(&self) -> &SnapshotHandle {
        &self.snapshot
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: RenderSurface> Drop for Engine<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn validate_snapshot(
    contract: &UniformContract,
    snapshot: &SnapshotHandle,
) -> Result<(), EngineError> {
    snapshot.read(|snapshot| {
        contract
            .parameters()
            .find(|decl| snapshot.get(&decl.name).is_none())
            .map_or(Ok(()), |decl| {
                Err(EngineError::MissingSnapshotEntry {
                    name: decl.name.clone(),
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrawError;
    use crate::runtime::SteppedTimeSource;
    use crate::snapshot::UniformSnapshot;
    use crate::testing::{FakeHost, FakeSurface, Teardown};

    fn basic_snapshot() -> SnapshotHandle {
        let snapshot = SnapshotHandle::from_contract(&UniformContract::basic());
        snapshot.write("uHue", UniformValue::Float(0.6)).unwrap();
        snapshot.write("uSpeed", UniformValue::Float(1.0)).unwrap();
        snapshot.write("uIntensity", UniformValue::Float(0.8)).unwrap();
        snapshot.write("uMaster", UniformValue::Float(1.0)).unwrap();
        snapshot
    }

    fn create(host: &FakeHost, snapshot: SnapshotHandle) -> Result<Engine<FakeSurface>, EngineError> {
        let options = EngineOptions::new(UniformContract::basic())
            .with_time_source(Box::new(SteppedTimeSource::per_frame_60hz()));
        Engine::create(
            host.surface(),
            snapshot,
            &ShaderSources::fullscreen("void main() {}"),
            options,
            host.hooks(),
        )
    }

    fn tick(engine: &mut Engine<FakeSurface>) -> FrameOutcome {
        let token = engine.pending_frame().expect("frame scheduled");
        engine.on_frame(token).expect("frame")
    }

    #[test]
    fn compiles_and_links_once_across_parameter_changes() {
        let host = FakeHost::new(&UniformContract::basic());
        let snapshot = basic_snapshot();
        let mut engine = create(&host, snapshot.clone()).unwrap();

        for step in 0..50 {
            snapshot
                .write("uHue", UniformValue::Float(step as f32 / 50.0))
                .unwrap();
            if step % 5 == 0 {
                tick(&mut engine);
            }
        }

        let journal = host.journal();
        assert_eq!(journal.compiled, vec![ShaderStage::Vertex, ShaderStage::Fragment]);
        assert_eq!(journal.links, 1);
        assert_eq!(journal.buffers_created, 1);
        assert_eq!(journal.frames.len(), 10);
    }

    #[test]
    fn scenario_hue_change_reaches_the_very_next_tick_only() {
        let host = FakeHost::new(&UniformContract::basic());
        let snapshot = basic_snapshot();
        let mut engine = create(&host, snapshot.clone()).unwrap();

        for _ in 0..3 {
            assert_eq!(tick(&mut engine), FrameOutcome::Presented);
        }
        {
            let journal = host.journal();
            let times: Vec<f32> = journal
                .frames
                .iter()
                .map(|frame| frame.float("uTime").unwrap())
                .collect();
            assert!(times.windows(2).all(|pair| pair[1] > pair[0]), "{times:?}");
            for frame in &journal.frames {
                assert_eq!(frame.float("uHue"), Some(0.6));
                assert_eq!(frame.float("uIntensity"), Some(0.8));
            }
        }

        snapshot.write("uHue", UniformValue::Float(0.2)).unwrap();
        tick(&mut engine);

        let journal = host.journal();
        assert_eq!(journal.frames.len(), 4);
        assert_eq!(journal.frames[3].float("uHue"), Some(0.2));
        for frame in &journal.frames[..3] {
            assert_eq!(frame.float("uHue"), Some(0.6));
        }
    }

    #[test]
    fn latest_write_between_frames_is_uploaded() {
        let host = FakeHost::new(&UniformContract::basic());
        let snapshot = basic_snapshot();
        let mut engine = create(&host, snapshot.clone()).unwrap();
        tick(&mut engine);

        for value in [0.1, 0.4, 0.75] {
            snapshot.write("uHue", UniformValue::Float(value)).unwrap();
        }
        tick(&mut engine);

        let journal = host.journal();
        assert_eq!(journal.frames[1].float("uHue"), Some(0.75));
        assert_eq!(journal.frames[1].vertex_count, 3);
    }

    #[test]
    fn out_of_range_values_are_clamped_before_upload() {
        let host = FakeHost::new(&UniformContract::basic());
        let snapshot = basic_snapshot();
        snapshot.write("uHue", UniformValue::Float(1.7)).unwrap();
        snapshot.write("uSpeed", UniformValue::Float(-4.0)).unwrap();
        snapshot.write("uIntensity", UniformValue::Float(9.0)).unwrap();
        let mut engine = create(&host, snapshot).unwrap();
        tick(&mut engine);

        let journal = host.journal();
        let frame = &journal.frames[0];
        assert_eq!(frame.float("uHue"), Some(1.0));
        assert_eq!(frame.float("uSpeed"), Some(0.0));
        assert_eq!(frame.float("uIntensity"), Some(2.0));
    }

    #[test]
    fn resolution_uniform_tracks_capped_device_pixels() {
        let host = FakeHost::new(&UniformContract::basic());
        host.set_display(400.0, 300.0);
        host.set_scale(3.0);
        let mut engine = create(&host, basic_snapshot()).unwrap();
        tick(&mut engine);

        assert_eq!(engine.pixel_size(), Some(PixelSize::new(800, 600)));
        let journal = host.journal();
        assert_eq!(journal.frames[0].value("uResolution"), Some(&[800.0, 600.0][..]));
    }

    #[test]
    fn resize_with_same_pixel_size_reallocates_once() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        let listener = engine.listener().unwrap();
        assert_eq!(host.journal().resizes.len(), 1);

        host.set_display(1024.0, 768.0);
        assert!(engine.on_resize(listener));
        assert!(!engine.on_resize(listener));
        host.set_display(1024.4, 768.2);
        assert!(!engine.on_resize(listener));
        tick(&mut engine);

        let journal = host.journal();
        assert_eq!(journal.resizes, vec![PixelSize::new(800, 600), PixelSize::new(1024, 768)]);
    }

    #[test]
    fn zero_area_surface_idles_without_drawing() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        host.set_display(0.0, 0.0);
        assert_eq!(tick(&mut engine), FrameOutcome::Idle);
        assert!(engine.pending_frame().is_some());

        host.set_display(800.0, 600.0);
        assert_eq!(tick(&mut engine), FrameOutcome::Presented);
        assert_eq!(host.journal().frames.len(), 1);
    }

    #[test]
    fn dispose_releases_in_order_and_silences_callbacks() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        tick(&mut engine);
        let token = engine.pending_frame().unwrap();
        let listener = engine.listener().unwrap();

        engine.dispose();
        engine.dispose();

        assert_eq!(engine.on_frame(token).unwrap(), FrameOutcome::Ignored);
        host.set_display(10.0, 10.0);
        assert!(!engine.on_resize(listener));

        let journal = host.journal();
        assert_eq!(
            journal.teardown,
            vec![
                Teardown::CancelFrame(token),
                Teardown::Unsubscribe(listener),
                Teardown::DeleteBuffer,
                Teardown::DeleteShader(ShaderStage::Vertex),
                Teardown::DeleteShader(ShaderStage::Fragment),
                Teardown::DeleteProgram,
            ]
        );
        assert_eq!(journal.frames.len(), 1);
        assert_eq!(journal.resizes.len(), 1);
        assert_eq!(journal.live_resources(), 0);
        assert_eq!(journal.pending_frame, None);
        assert_eq!(journal.active_listener, None);
    }

    #[test]
    fn drop_disposes() {
        let host = FakeHost::new(&UniformContract::basic());
        let engine = create(&host, basic_snapshot()).unwrap();
        assert!(host.journal().live_resources() > 0);
        drop(engine);
        assert_eq!(host.journal().live_resources(), 0);
        assert_eq!(host.journal().pending_frame, None);
    }

    #[test]
    fn stale_tokens_are_ignored() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        let first = engine.pending_frame().unwrap();
        assert_eq!(engine.on_frame(first).unwrap(), FrameOutcome::Presented);
        assert_eq!(engine.on_frame(first).unwrap(), FrameOutcome::Ignored);
        assert_eq!(host.journal().frames.len(), 1);
    }

    #[test]
    fn fragment_compile_failure_releases_everything() {
        let host = FakeHost::new(&UniformContract::basic());
        host.faults().compile = Some(ShaderStage::Fragment);

        let err = create(&host, basic_snapshot()).err().expect("compile failure");
        match err {
            EngineError::ShaderCompile { stage, diagnostic } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(diagnostic.contains("fragment"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let journal = host.journal();
        assert_eq!(journal.buffers_created, 1);
        assert_eq!(journal.live_resources(), 0);
        assert_eq!(
            journal.teardown,
            vec![Teardown::DeleteBuffer, Teardown::DeleteShader(ShaderStage::Vertex)]
        );
        assert!(journal.requested_frames.is_empty());
    }

    #[test]
    fn link_failure_is_reported_with_diagnostic() {
        let host = FakeHost::new(&UniformContract::basic());
        host.faults().link = true;
        let err = create(&host, basic_snapshot()).err().expect("link failure");
        assert!(matches!(err, EngineError::ProgramLink { .. }));
        assert!(err.is_authoring_defect());
        assert_eq!(host.journal().live_resources(), 0);
    }

    #[test]
    fn context_failure_maps_to_context_unavailable() {
        let host = FakeHost::new(&UniformContract::basic());
        host.faults().context = true;
        let err = create(&host, basic_snapshot()).err().expect("context failure");
        assert!(matches!(err, EngineError::ContextUnavailable(_)));
        assert_eq!(host.journal().buffers_created, 0);
    }

    #[test]
    fn missing_snapshot_entry_is_a_configuration_error() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut partial = UniformSnapshot::new();
        partial.insert("uHue", UniformValue::Float(0.5));
        let err = create(&host, SnapshotHandle::new(partial))
            .err()
            .expect("missing entry");
        assert!(matches!(err, EngineError::MissingSnapshotEntry { ref name } if name == "uSpeed"));
        assert_eq!(host.journal().buffers_created, 0);
    }

    #[test]
    fn unresolved_uniforms_warn_once_and_are_skipped() {
        let host = FakeHost::new(&UniformContract::basic());
        host.faults().missing_uniforms.push("uIntensity".into());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        assert_eq!(
            engine.warnings(),
            &[UniformResolutionWarning {
                name: "uIntensity".into()
            }]
        );
        tick(&mut engine);
        tick(&mut engine);
        assert_eq!(engine.warnings().len(), 1);
        let journal = host.journal();
        assert!(journal.frames.iter().all(|frame| frame.value("uIntensity").is_none()));
        assert!(journal.frames.iter().all(|frame| frame.float("uHue").is_some()));
    }

    #[test]
    fn draw_failure_stops_the_loop() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        tick(&mut engine);
        host.faults().draw = Some(DrawError::Other("device lost".into()));
        let token = engine.pending_frame().unwrap();
        let err = engine.on_frame(token).unwrap_err();
        assert!(matches!(err, EngineError::Frame(_)));
        assert_eq!(engine.pending_frame(), None);

        engine.dispose();
        assert_eq!(host.journal().live_resources(), 0);
    }

    #[test]
    fn transient_surface_errors_skip_the_frame_and_keep_going() {
        let host = FakeHost::new(&UniformContract::basic());
        let mut engine = create(&host, basic_snapshot()).unwrap();
        tick(&mut engine);

        for error in [DrawError::Timeout, DrawError::SurfaceLost] {
            host.faults().draw = Some(error);
            assert_eq!(tick(&mut engine), FrameOutcome::Skipped);
            assert!(engine.pending_frame().is_some());
        }

        host.faults().draw = None;
        assert_eq!(tick(&mut engine), FrameOutcome::Presented);
        let journal = host.journal();
        assert_eq!(journal.frames.len(), 2);
        assert_eq!(journal.links, 1);
    }

    #[test]
    fn vector_uniforms_upload_as_fixed_arrays() {
        let contract = UniformContract::lab();
        let host = FakeHost::new(&contract);
        let snapshot = SnapshotHandle::from_contract(&contract);
        snapshot
            .write("uThemeA", UniformValue::Vec3([0.2, 1.4, 0.6]))
            .unwrap();
        let options = EngineOptions::new(contract)
            .with_time_source(Box::new(SteppedTimeSource::per_frame_60hz()));
        let mut engine = Engine::create(
            host.surface(),
            snapshot,
            &ShaderSources::fullscreen("void main() {}"),
            options,
            host.hooks(),
        )
        .unwrap();
        tick(&mut engine);

        let journal = host.journal();
        assert_eq!(journal.frames[0].value("uThemeA"), Some(&[0.2, 1.0, 0.6][..]));
        assert_eq!(journal.frames[0].float("uRimStrength"), Some(0.6));
    }
}
