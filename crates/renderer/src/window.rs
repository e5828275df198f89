use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::LogicalSize as WinitLogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

pub use winit::keyboard::{Key, ModifiersState, NamedKey};

use crate::contract::UniformContract;
use crate::engine::{Engine, EngineOptions, ShaderSources};
use crate::error::EngineError;
use crate::gpu::WgpuBackend;
use crate::host::{FrameScheduler, FrameToken, HostHooks, ListenerId, RenderSurface, ResizeObserver};
use crate::snapshot::SnapshotHandle;
use crate::supervisor::EngineSupervisor;
use crate::viewport::{LogicalSize, PixelSize};

/// Window-backed surface handed to [`Engine::create`].
pub struct WgpuSurface {
    window: Arc<Window>,
}

impl WgpuSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl RenderSurface for WgpuSurface {
    type Backend = WgpuBackend;

    fn display_size(&self) -> LogicalSize {
        let logical = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        LogicalSize::new(logical.width, logical.height)
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn create_backend(&mut self) -> Result<WgpuBackend, String> {
        let physical = self.window.inner_size();
        WgpuBackend::new(
            self.window.clone(),
            PixelSize::new(physical.width, physical.height),
        )
        .map_err(|err| format!("{err:#}"))
    }
}

/// State shared between the event loop and the engine's hooks.
#[derive(Debug, Default)]
struct LoopState {
    next_id: u64,
    pending_frame: Option<FrameToken>,
    listener: Option<ListenerId>,
    occluded: bool,
}

impl LoopState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// The frame that should be redrawn now, if any.
    fn ready_frame(&self) -> Option<FrameToken> {
        if self.occluded {
            None
        } else {
            self.pending_frame
        }
    }
}

/// Frame requests become `request_redraw` calls issued from `AboutToWait`.
/// While the window is occluded requests stay queued.
pub struct WinitScheduler {
    state: Rc<RefCell<LoopState>>,
}

impl FrameScheduler for WinitScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut state = self.state.borrow_mut();
        let token = FrameToken(state.next_id());
        state.pending_frame = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut state = self.state.borrow_mut();
        if state.pending_frame == Some(token) {
            state.pending_frame = None;
        }
    }
}

/// Forwards `Resized` and `ScaleFactorChanged` to the single active listener.
pub struct WinitResizeObserver {
    state: Rc<RefCell<LoopState>>,
}

impl ResizeObserver for WinitResizeObserver {
    fn subscribe(&mut self) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let listener = ListenerId(state.next_id());
        state.listener = Some(listener);
        listener
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        let mut state = self.state.borrow_mut();
        if state.listener == Some(listener) {
            state.listener = None;
        }
    }
}

/// What the preview should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    Ignored,
    Handled,
    Exit,
}

/// Application side of the preview loop.
pub trait PreviewController {
    fn on_key(&mut self, key: &Key, modifiers: ModifiersState) -> KeyResponse;
    /// Deferred work such as debounced persistence. Returns the next instant
    /// the controller wants to be woken at.
    fn on_idle(&mut self, now: Instant) -> Option<Instant>;
    fn on_exit(&mut self);
    /// Shown as the window title.
    fn status_line(&self) -> String;
}

/// Everything needed to open a preview window.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub title: String,
    pub size: (u32, u32),
    pub contract: UniformContract,
    pub sources: ShaderSources,
    pub dpr_cap: f64,
}

/// Builds engines for the preview window; called again after frame failures.
struct EngineFactory {
    window: Arc<Window>,
    state: Rc<RefCell<LoopState>>,
    options: PreviewOptions,
    snapshot: SnapshotHandle,
}

impl EngineFactory {
    fn build(&self) -> Result<Engine<WgpuSurface>, EngineError> {
        let hooks = HostHooks::new(
            WinitScheduler {
                state: self.state.clone(),
            },
            WinitResizeObserver {
                state: self.state.clone(),
            },
        );
        let options =
            EngineOptions::new(self.options.contract.clone()).with_dpr_cap(self.options.dpr_cap);
        Engine::create(
            WgpuSurface::new(self.window.clone()),
            self.snapshot.clone(),
            &self.options.sources,
            options,
            hooks,
        )
    }
}

struct Preview {
    factory: EngineFactory,
    supervisor: EngineSupervisor<WgpuSurface>,
}

impl Preview {
    fn redraw(&mut self) -> Result<()> {
        let Some(token) = self.factory.state.borrow().ready_frame() else {
            return Ok(());
        };
        let factory = &self.factory;
        self.supervisor.on_frame(token, || factory.build())?;
        Ok(())
    }

    fn resized(&mut self) {
        let listener = self.factory.state.borrow().listener;
        if let Some(listener) = listener {
            self.supervisor.on_resize(listener);
        }
    }
}

/// Opens a window, runs one engine in it, and blocks until the window
/// closes or `controller` asks to exit.
pub fn run_preview(
    options: PreviewOptions,
    snapshot: SnapshotHandle,
    controller: &mut dyn PreviewController,
) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(format!("{} | {}", options.title, controller.status_line()))
        .with_inner_size(WinitLogicalSize::new(options.size.0, options.size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let factory = EngineFactory {
        window: window.clone(),
        state: Rc::new(RefCell::new(LoopState::default())),
        options,
        snapshot,
    };
    let supervisor = EngineSupervisor::new(factory.build()?);
    let mut preview = Preview {
        factory,
        supervisor,
    };

    let mut modifiers = ModifiersState::empty();
    let mut outcome: Result<()> = Ok(());
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::ModifiersChanged(state) => modifiers = state.state(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match controller.on_key(&event.logical_key, modifiers) {
                    KeyResponse::Exit => elwt.exit(),
                    KeyResponse::Handled => window.set_title(&format!(
                        "{} | {}",
                        preview.factory.options.title,
                        controller.status_line()
                    )),
                    KeyResponse::Ignored => {}
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => preview.resized(),
            WindowEvent::Occluded(occluded) => {
                tracing::debug!(occluded, "window visibility changed");
                preview.factory.state.borrow_mut().occluded = occluded;
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = preview.redraw() {
                    outcome = Err(err);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let wake = controller.on_idle(Instant::now());
            if preview.factory.state.borrow().ready_frame().is_some() {
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = wake {
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        Event::LoopExiting => {
            preview.supervisor.shutdown();
            controller.on_exit();
        }
        _ => {}
    });

    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    outcome
}
