use std::time::{Duration, Instant};

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running engine.
    pub frame_index: u64,
}

impl TimeSample {
    /// Creates a new time sample.
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that advances by a fixed step on every sample.
///
/// The first sample after a reset reports one step, so consecutive samples
/// are strictly increasing for any positive step.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    step: Duration,
    elapsed: Duration,
    frame: u64,
}

impl SteppedTimeSource {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            elapsed: Duration::ZERO,
            frame: 0,
        }
    }

    /// Convenience for a 60 Hz display.
    pub fn per_frame_60hz() -> Self {
        Self::new(Duration::from_micros(16_667))
    }
}

impl TimeSource for SteppedTimeSource {
    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        self.elapsed += self.step;
        let sample = TimeSample::new(self.elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Rolling frames-per-second counter, reported once per window.
#[derive(Debug, Clone)]
pub(crate) struct FpsCounter {
    window: Duration,
    started: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            started: None,
            frames: 0,
        }
    }

    /// Counts a presented frame; returns the average rate when a window closes.
    pub(crate) fn record(&mut self, now: Instant) -> Option<f32> {
        let started = *self.started.get_or_insert(now);
        self.frames = self.frames.saturating_add(1);
        let elapsed = now.saturating_duration_since(started);
        if elapsed < self.window {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON);
        self.started = Some(now);
        self.frames = 0;
        Some(fps)
    }
}
