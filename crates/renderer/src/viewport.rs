//! Display size to backing-buffer size mapping.

/// On-screen size in logical (DPI independent) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Backing buffer size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Result of comparing the current display size with the applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportChange {
    Unchanged,
    Resized(PixelSize),
    /// The surface currently has no area; nothing should be drawn.
    Empty,
}

pub const DEFAULT_DPR_CAP: f64 = 2.0;
pub const MIN_DPR_CAP: f64 = 1.0;
pub const MAX_DPR_CAP: f64 = 4.0;

/// Products this close to a whole pixel count are taken as exact. Hosts
/// report logical sizes as physical / scale, which rarely multiplies back
/// without error.
const PIXEL_SNAP: f64 = 1e-6;

/// Remembers the last applied backing size so repeated notifications with
/// the same computed size cost nothing.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    dpr_cap: f64,
    current: Option<PixelSize>,
}

impl ViewportTracker {
    pub fn new(dpr_cap: f64) -> Self {
        let dpr_cap = if dpr_cap.is_finite() {
            dpr_cap.clamp(MIN_DPR_CAP, MAX_DPR_CAP)
        } else {
            DEFAULT_DPR_CAP
        };
        Self {
            dpr_cap,
            current: None,
        }
    }

    pub fn dpr_cap(&self) -> f64 {
        self.dpr_cap
    }

    pub fn current(&self) -> Option<PixelSize> {
        self.current
    }

    /// `floor(logical * clamp(scale, 1, cap))` per axis, snapping products
    /// that land within floating-point error of a whole pixel.
    pub fn compute(&self, logical: LogicalSize, scale_factor: f64) -> PixelSize {
        let ratio = if scale_factor.is_finite() {
            scale_factor.max(1.0).min(self.dpr_cap)
        } else {
            1.0
        };
        PixelSize::new(to_pixels(logical.width, ratio), to_pixels(logical.height, ratio))
    }

    /// Records the computed size and reports whether it differs from the
    /// previously applied one. Empty sizes are never recorded.
    pub fn update(&mut self, logical: LogicalSize, scale_factor: f64) -> ViewportChange {
        let target = self.compute(logical, scale_factor);
        if target.is_empty() {
            return ViewportChange::Empty;
        }
        if self.current == Some(target) {
            return ViewportChange::Unchanged;
        }
        self.current = Some(target);
        ViewportChange::Resized(target)
    }
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DPR_CAP)
    }
}

fn to_pixels(logical: f64, ratio: f64) -> u32 {
    if !logical.is_finite() || logical <= 0.0 {
        return 0;
    }
    let scaled = logical * ratio;
    let nearest = scaled.round();
    let pixels = if (scaled - nearest).abs() <= PIXEL_SNAP {
        nearest
    } else {
        scaled.floor()
    };
    pixels.min(u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_pixel_ratio_is_capped_and_floored() {
        let tracker = ViewportTracker::new(2.0);
        assert_eq!(
            tracker.compute(LogicalSize::new(100.4, 50.0), 3.0),
            PixelSize::new(200, 100)
        );
        assert_eq!(
            tracker.compute(LogicalSize::new(100.0, 50.0), 0.5),
            PixelSize::new(100, 50)
        );
        assert_eq!(
            tracker.compute(LogicalSize::new(333.3, 10.0), 1.5),
            PixelSize::new(499, 15)
        );
    }

    #[test]
    fn physical_sizes_survive_the_logical_round_trip() {
        let tracker = ViewportTracker::new(MAX_DPR_CAP);
        assert_eq!(
            tracker.compute(LogicalSize::new(29.0 / 1.1, 100.0 / 1.1), 1.1),
            PixelSize::new(29, 100)
        );
        for scale in [1.1, 1.15, 1.2, 1.25, 4.0 / 3.0, 1.5, 1.75, 2.0] {
            for physical in 1..4000u32 {
                let logical = f64::from(physical) / scale;
                let size = tracker.compute(LogicalSize::new(logical, logical), scale);
                assert_eq!(size.width, physical, "{physical}px at scale {scale}");
            }
        }
    }

    #[test]
    fn repeated_updates_with_same_size_are_unchanged() {
        let mut tracker = ViewportTracker::default();
        let logical = LogicalSize::new(640.0, 480.0);
        assert_eq!(
            tracker.update(logical, 1.0),
            ViewportChange::Resized(PixelSize::new(640, 480))
        );
        assert_eq!(tracker.update(logical, 1.0), ViewportChange::Unchanged);
        // sub-pixel jitter floors to the same size
        assert_eq!(
            tracker.update(LogicalSize::new(640.3, 480.2), 1.0),
            ViewportChange::Unchanged
        );
    }

    #[test]
    fn empty_surface_keeps_previous_size() {
        let mut tracker = ViewportTracker::default();
        tracker.update(LogicalSize::new(10.0, 10.0), 1.0);
        assert_eq!(
            tracker.update(LogicalSize::new(0.0, 10.0), 1.0),
            ViewportChange::Empty
        );
        assert_eq!(tracker.current(), Some(PixelSize::new(10, 10)));
    }

    #[test]
    fn cap_is_bounded() {
        assert_eq!(ViewportTracker::new(9.0).dpr_cap(), MAX_DPR_CAP);
        assert_eq!(ViewportTracker::new(0.2).dpr_cap(), MIN_DPR_CAP);
        assert_eq!(ViewportTracker::new(f64::NAN).dpr_cap(), DEFAULT_DPR_CAP);
    }
}
