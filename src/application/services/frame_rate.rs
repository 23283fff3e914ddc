//! Frame-rate sampling for the reduced-motion switch.

use std::time::Duration;

use tokio::time::Instant;

/// Result of one completed sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// Frames per second over the window.
    pub fps: f64,
    /// Reduced-motion flag after this window.
    pub reduced_motion: bool,
}

/// Counts frames over fixed windows and flips reduced motion when a whole
/// window falls under the threshold. A whole window at or above the
/// threshold flips it back.
#[derive(Debug, Clone)]
pub struct FrameRateMonitor {
    window: Duration,
    threshold: f64,
    window_start: Option<Instant>,
    frames: u32,
    reduced_motion: bool,
    last_fps: Option<f64>,
}

impl FrameRateMonitor {
    /// Creates a monitor with the given window length and fps threshold.
    #[must_use]
    pub fn new(window: Duration, threshold: f64) -> Self {
        Self {
            window,
            threshold,
            window_start: None,
            frames: 0,
            reduced_motion: false,
            last_fps: None,
        }
    }

    /// Records a frame at `at`. Returns a sample when this frame closes a window.
    pub fn record_frame(&mut self, at: Instant) -> Option<FrameSample> {
        let Some(start) = self.window_start else {
            self.window_start = Some(at);
            self.frames = 0;
            return None;
        };

        self.frames += 1;
        let elapsed = at.saturating_duration_since(start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }

        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        self.reduced_motion = fps < self.threshold;
        self.last_fps = Some(fps);
        self.window_start = Some(at);
        self.frames = 0;

        Some(FrameSample {
            fps,
            reduced_motion: self.reduced_motion,
        })
    }

    /// Current reduced-motion flag.
    #[must_use]
    pub const fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Rate measured by the last completed window.
    #[must_use]
    pub const fn last_fps(&self) -> Option<f64> {
        self.last_fps
    }
}
