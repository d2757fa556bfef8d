pub mod replay;
pub mod synthetic;
pub mod thread;

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_SENSOR_FPS, MAX_SENSOR_FPS, MIN_SENSOR_FPS};
use crate::grid::{Grid, GridError};

#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    DeviceUnavailable(String),
    Io { path: String, message: String },
    Parse { line: usize, message: String },
    EmptyCapture { path: String },
    Grid(GridError),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable(reason) => write!(f, "depth source unavailable: {reason}"),
            Self::Io { path, message } => write!(f, "failed to read '{path}': {message}"),
            Self::Parse { line, message } => write!(f, "capture line {line}: {message}"),
            Self::EmptyCapture { path } => write!(f, "capture '{path}' contains no frames"),
            Self::Grid(err) => write!(f, "invalid grid from depth source: {err}"),
        }
    }
}

impl std::error::Error for SampleError {}

impl From<GridError> for SampleError {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}

/// A source of depth grids. `Ok(None)` means no new frame is ready yet,
/// which is never an error.
pub trait GridSampler: Send {
    fn poll(&mut self) -> Result<Option<Grid>, SampleError>;

    fn name(&self) -> &'static str;
}

/// Hands out at most one frame per interval.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl FramePacer {
    /// Rates outside `MIN_SENSOR_FPS..=MAX_SENSOR_FPS` are clamped, and a
    /// non-positive or non-finite rate falls back to the default, so the
    /// pacer always waits between frames.
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps.clamp(MIN_SENSOR_FPS, MAX_SENSOR_FPS)
        } else {
            DEFAULT_SENSOR_FPS
        };
        Self {
            interval: Duration::from_secs_f32(1.0 / fps),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a frame is due at `now`; schedules the next one.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            Some(due) => {
                // Skip missed slots instead of bursting to catch up.
                let next = due + self.interval;
                self.next_due = Some(if next < now { now + self.interval } else { next });
                true
            }
            None => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_releases_first_frame_immediately_then_waits() {
        let mut pacer = FramePacer::new(10.0);
        let t0 = Instant::now();
        assert!(pacer.ready(t0));
        assert!(!pacer.ready(t0 + Duration::from_millis(50)));
        assert!(pacer.ready(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn pacer_does_not_burst_after_a_stall() {
        let mut pacer = FramePacer::new(10.0);
        let t0 = Instant::now();
        assert!(pacer.ready(t0));
        let late = t0 + Duration::from_secs(2);
        assert!(pacer.ready(late));
        assert!(!pacer.ready(late + Duration::from_millis(10)));
    }

    #[test]
    fn out_of_range_rates_still_pace() {
        let default = FramePacer::new(DEFAULT_SENSOR_FPS).interval();
        assert_eq!(FramePacer::new(0.0).interval(), default);
        assert_eq!(FramePacer::new(-5.0).interval(), default);
        assert_eq!(FramePacer::new(f32::NAN).interval(), default);
        assert_eq!(
            FramePacer::new(1e-20).interval(),
            Duration::from_secs_f32(1.0 / MIN_SENSOR_FPS)
        );
        assert_eq!(
            FramePacer::new(1e9).interval(),
            Duration::from_secs_f32(1.0 / MAX_SENSOR_FPS)
        );

        let mut pacer = FramePacer::new(-5.0);
        let t0 = Instant::now();
        let released = (0..1000).filter(|_| pacer.ready(t0)).count();
        assert_eq!(released, 1);
    }
}
