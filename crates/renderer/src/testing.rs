//! Recording fakes for driving an [`crate::Engine`] without a GPU.
//!
//! One [`FakeHost`] hands out a surface, backend, scheduler and resize
//! observer that all write into the same [`Journal`]. Tests flip [`Faults`]
//! to inject failures and inspect the journal afterwards.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::backend::{Backend, ShaderStage};
use crate::contract::{UniformContract, UniformKind};
use crate::error::DrawError;
use crate::host::{FrameScheduler, FrameToken, HostHooks, ListenerId, RenderSurface, ResizeObserver};
use crate::viewport::{LogicalSize, PixelSize};

/// Uploads staged for one draw, in upload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    pub vertex_count: u32,
    pub uploads: Vec<(String, Vec<f32>)>,
}

impl FrameRecord {
    pub fn value(&self, name: &str) -> Option<&[f32]> {
        self.uploads
            .iter()
            .find(|(uniform, _)| uniform == name)
            .map(|(_, value)| value.as_slice())
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.value(name)? {
            [value] => Some(*value),
            _ => None,
        }
    }
}

/// One step of engine teardown as observed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    CancelFrame(FrameToken),
    Unsubscribe(ListenerId),
    DeleteBuffer,
    DeleteShader(ShaderStage),
    DeleteProgram,
}

#[derive(Debug, Default)]
pub struct Journal {
    pub compiled: Vec<ShaderStage>,
    pub links: usize,
    pub buffers_created: usize,
    pub live_buffers: usize,
    pub live_shaders: usize,
    pub live_programs: usize,
    pub resizes: Vec<PixelSize>,
    pub frames: Vec<FrameRecord>,
    pub teardown: Vec<Teardown>,
    pub requested_frames: Vec<FrameToken>,
    pub pending_frame: Option<FrameToken>,
    pub active_listener: Option<ListenerId>,
    staged: Vec<(String, Vec<f32>)>,
    next_id: u64,
}

impl Journal {
    pub fn live_resources(&self) -> usize {
        self.live_buffers + self.live_shaders + self.live_programs
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Failure switches consulted by the fakes on every call.
#[derive(Debug, Default)]
pub struct Faults {
    pub context: bool,
    pub compile: Option<ShaderStage>,
    pub link: bool,
    pub draw: Option<DrawError>,
    pub missing_uniforms: Vec<String>,
}

pub struct FakeHost {
    journal: Rc<RefCell<Journal>>,
    faults: Rc<RefCell<Faults>>,
    display: Rc<Cell<LogicalSize>>,
    scale: Rc<Cell<f64>>,
    declared: Rc<Vec<(String, UniformKind)>>,
}

impl FakeHost {
    /// An 800x600 surface at scale 1 whose programs declare every uniform of
    /// `contract`.
    pub fn new(contract: &UniformContract) -> Self {
        let declared = contract
            .decls()
            .iter()
            .map(|decl| (decl.name.clone(), decl.kind))
            .collect();
        Self {
            journal: Rc::default(),
            faults: Rc::default(),
            display: Rc::new(Cell::new(LogicalSize::new(800.0, 600.0))),
            scale: Rc::new(Cell::new(1.0)),
            declared: Rc::new(declared),
        }
    }

    pub fn surface(&self) -> FakeSurface {
        FakeSurface {
            journal: self.journal.clone(),
            faults: self.faults.clone(),
            display: self.display.clone(),
            scale: self.scale.clone(),
            declared: self.declared.clone(),
        }
    }

    pub fn hooks(&self) -> HostHooks {
        HostHooks::new(
            FakeScheduler {
                journal: self.journal.clone(),
            },
            FakeResizeObserver {
                journal: self.journal.clone(),
            },
        )
    }

    pub fn set_display(&self, width: f64, height: f64) {
        self.display.set(LogicalSize::new(width, height));
    }

    pub fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
    }

    pub fn faults(&self) -> RefMut<'_, Faults> {
        self.faults.borrow_mut()
    }

    pub fn journal(&self) -> Ref<'_, Journal> {
        self.journal.borrow()
    }
}

pub struct FakeSurface {
    journal: Rc<RefCell<Journal>>,
    faults: Rc<RefCell<Faults>>,
    display: Rc<Cell<LogicalSize>>,
    scale: Rc<Cell<f64>>,
    declared: Rc<Vec<(String, UniformKind)>>,
}

impl RenderSurface for FakeSurface {
    type Backend = FakeBackend;

    fn display_size(&self) -> LogicalSize {
        self.display.get()
    }

    fn scale_factor(&self) -> f64 {
        self.scale.get()
    }

    fn create_backend(&mut self) -> Result<FakeBackend, String> {
        if self.faults.borrow().context {
            return Err("context creation denied".into());
        }
        Ok(FakeBackend {
            journal: self.journal.clone(),
            faults: self.faults.clone(),
            declared: self.declared.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeShader {
    stage: ShaderStage,
}

#[derive(Debug)]
pub struct FakeProgram {
    uniforms: Vec<(String, UniformKind)>,
}

#[derive(Debug)]
pub struct FakeBuffer;

pub struct FakeBackend {
    journal: Rc<RefCell<Journal>>,
    faults: Rc<RefCell<Faults>>,
    declared: Rc<Vec<(String, UniformKind)>>,
}

impl Backend for FakeBackend {
    type Shader = FakeShader;
    type Program = FakeProgram;
    type Buffer = FakeBuffer;
    type Location = usize;

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<FakeShader, String> {
        let mut journal = self.journal.borrow_mut();
        journal.compiled.push(stage);
        if self.faults.borrow().compile == Some(stage) {
            return Err(format!("0:1: {stage} stage: syntax error"));
        }
        journal.live_shaders += 1;
        Ok(FakeShader { stage })
    }

    fn link_program(
        &mut self,
        _vertex: &FakeShader,
        _fragment: &FakeShader,
    ) -> Result<FakeProgram, String> {
        let mut journal = self.journal.borrow_mut();
        journal.links += 1;
        let faults = self.faults.borrow();
        if faults.link {
            return Err("varying mismatch between stages".into());
        }
        journal.live_programs += 1;
        let uniforms = self
            .declared
            .iter()
            .filter(|(name, _)| !faults.missing_uniforms.contains(name))
            .cloned()
            .collect();
        Ok(FakeProgram { uniforms })
    }

    fn create_vertex_buffer(&mut self, positions: &[f32]) -> FakeBuffer {
        assert_eq!(positions.len() % 2, 0, "vec2 positions");
        let mut journal = self.journal.borrow_mut();
        journal.buffers_created += 1;
        journal.live_buffers += 1;
        FakeBuffer
    }

    fn uniform_location(&self, program: &FakeProgram, name: &str, kind: UniformKind) -> Option<usize> {
        program
            .uniforms
            .iter()
            .position(|(declared, declared_kind)| declared == name && *declared_kind == kind)
    }

    fn resize(&mut self, size: PixelSize) {
        self.journal.borrow_mut().resizes.push(size);
    }

    fn upload(&mut self, program: &mut FakeProgram, location: usize, value: &[f32]) {
        let name = program.uniforms[location].0.clone();
        self.journal
            .borrow_mut()
            .staged
            .push((name, value.to_vec()));
    }

    fn draw(
        &mut self,
        _program: &mut FakeProgram,
        _vertices: &FakeBuffer,
        vertex_count: u32,
    ) -> Result<(), DrawError> {
        let mut journal = self.journal.borrow_mut();
        let uploads = std::mem::take(&mut journal.staged);
        if let Some(error) = self.faults.borrow().draw.clone() {
            return Err(error);
        }
        journal.frames.push(FrameRecord {
            vertex_count,
            uploads,
        });
        Ok(())
    }

    fn delete_buffer(&mut self, _buffer: FakeBuffer) {
        let mut journal = self.journal.borrow_mut();
        journal.live_buffers -= 1;
        journal.teardown.push(Teardown::DeleteBuffer);
    }

    fn delete_shader(&mut self, shader: FakeShader) {
        let mut journal = self.journal.borrow_mut();
        journal.live_shaders -= 1;
        journal.teardown.push(Teardown::DeleteShader(shader.stage));
    }

    fn delete_program(&mut self, _program: FakeProgram) {
        let mut journal = self.journal.borrow_mut();
        journal.live_programs -= 1;
        journal.teardown.push(Teardown::DeleteProgram);
    }
}

pub struct FakeScheduler {
    journal: Rc<RefCell<Journal>>,
}

impl FrameScheduler for FakeScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut journal = self.journal.borrow_mut();
        let token = FrameToken(journal.next_id());
        journal.requested_frames.push(token);
        journal.pending_frame = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut journal = self.journal.borrow_mut();
        if journal.pending_frame == Some(token) {
            journal.pending_frame = None;
        }
        journal.teardown.push(Teardown::CancelFrame(token));
    }
}

pub struct FakeResizeObserver {
    journal: Rc<RefCell<Journal>>,
}

impl ResizeObserver for FakeResizeObserver {
    fn subscribe(&mut self) -> ListenerId {
        let mut journal = self.journal.borrow_mut();
        let listener = ListenerId(journal.next_id());
        journal.active_listener = Some(listener);
        listener
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        let mut journal = self.journal.borrow_mut();
        if journal.active_listener == Some(listener) {
            journal.active_listener = None;
        }
        journal.teardown.push(Teardown::Unsubscribe(listener));
    }
}
