use std::fmt;
use std::time::Duration;

use crate::grid::is_in_range;
use crate::render::dashboard::LAST_ROW_OFFSET;
use crate::render::heatmap::CELL_WIDTH;

pub const DEFAULT_COLUMNS: usize = 10;
pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_MIN_THRESHOLD: f32 = 0.2;
pub const DEFAULT_MAX_THRESHOLD: f32 = 10.0;
pub const DEFAULT_UI_REFRESH_SECS: f32 = 0.1;
pub const DEFAULT_COUNTER_CEILING: u32 = 65_535;
pub const DEFAULT_SENSOR_FPS: f32 = 30.0;
pub const MIN_SENSOR_FPS: f32 = 0.1;
pub const MAX_SENSOR_FPS: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyLayout { n_h: usize, n_v: usize },
    LayoutTooLarge { n_h: usize, n_v: usize },
    InvalidFrameRate(f32),
    InvalidRange { min: f32, max: f32 },
    InvalidRefreshInterval(f32),
    ZeroCounterCeiling,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayout { n_h, n_v } => {
                write!(f, "grid layout {n_h}x{n_v} needs at least one column and one row")
            }
            Self::LayoutTooLarge { n_h, n_v } => write!(
                f,
                "grid layout {n_h}x{n_v} does not fit in terminal coordinates"
            ),
            Self::InvalidFrameRate(fps) => write!(
                f,
                "sensor frame rate must be between {MIN_SENSOR_FPS} and {MAX_SENSOR_FPS} fps, got {fps}"
            ),
            Self::InvalidRange { min, max } => write!(
                f,
                "distance range {min}m..{max}m must satisfy 0 <= min < max"
            ),
            Self::InvalidRefreshInterval(secs) => {
                write!(f, "UI refresh interval must be a positive number of seconds, got {secs}")
            }
            Self::ZeroCounterCeiling => f.write_str("counter ceiling must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Inclusive `[min, max]` window, in metres, of distances counted as present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    pub min: f32,
    pub max: f32,
}

impl DistanceRange {
    pub fn new(min: f32, max: f32) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min >= max {
            return Err(ConfigError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, distance: f32) -> bool {
        is_in_range(distance, self.min, self.max)
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_THRESHOLD,
            max: DEFAULT_MAX_THRESHOLD,
        }
    }
}

/// Runtime options. Owned by the dashboard loop and replaced wholesale
/// when a key command toggles a flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub n_h: usize,
    pub n_v: usize,
    pub range: DistanceRange,
    pub mirror_mode: bool,
    pub ui_refresh_interval: Duration,
    pub display_window: bool,
    pub show_stats: bool,
    pub counter_ceiling: u32,
    pub sensor_fps: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_h: DEFAULT_COLUMNS,
            n_v: DEFAULT_ROWS,
            range: DistanceRange::default(),
            mirror_mode: false,
            ui_refresh_interval: Duration::from_secs_f32(DEFAULT_UI_REFRESH_SECS),
            display_window: false,
            show_stats: true,
            counter_ceiling: DEFAULT_COUNTER_CEILING,
            sensor_fps: DEFAULT_SENSOR_FPS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_h == 0 || self.n_v == 0 {
            return Err(ConfigError::EmptyLayout {
                n_h: self.n_h,
                n_v: self.n_v,
            });
        }
        if !layout_fits_terminal(self.n_h, self.n_v) {
            return Err(ConfigError::LayoutTooLarge {
                n_h: self.n_h,
                n_v: self.n_v,
            });
        }
        DistanceRange::new(self.range.min, self.range.max)?;
        frame_interval_from_fps(self.sensor_fps)?;
        if self.ui_refresh_interval.is_zero() {
            return Err(ConfigError::InvalidRefreshInterval(0.0));
        }
        if self.counter_ceiling == 0 {
            return Err(ConfigError::ZeroCounterCeiling);
        }
        Ok(())
    }

    pub fn with_mirror_toggled(&self) -> Self {
        Self {
            mirror_mode: !self.mirror_mode,
            ..self.clone()
        }
    }

    pub fn with_stats_toggled(&self) -> Self {
        Self {
            show_stats: !self.show_stats,
            ..self.clone()
        }
    }

    pub fn with_window_toggled(&self) -> Self {
        Self {
            display_window: !self.display_window,
            ..self.clone()
        }
    }
}

// The right border sits at x = 1 + n_h * CELL_WIDTH and the last stats line
// at y = n_v + LAST_ROW_OFFSET; both must stay below u16::MAX.
fn layout_fits_terminal(n_h: usize, n_v: usize) -> bool {
    let right = n_h.checked_mul(CELL_WIDTH).and_then(|w| w.checked_add(1));
    let bottom = n_v.checked_add(LAST_ROW_OFFSET);
    let fits = |v: Option<usize>| v.is_some_and(|v| v < usize::from(u16::MAX));
    fits(right) && fits(bottom)
}

/// Time between sensor frames for `fps`, which must lie within
/// `MIN_SENSOR_FPS..=MAX_SENSOR_FPS`.
pub fn frame_interval_from_fps(fps: f32) -> Result<Duration, ConfigError> {
    if !(MIN_SENSOR_FPS..=MAX_SENSOR_FPS).contains(&fps) {
        return Err(ConfigError::InvalidFrameRate(fps));
    }
    Duration::try_from_secs_f32(1.0 / fps).map_err(|_| ConfigError::InvalidFrameRate(fps))
}

/// Parses a refresh interval given in seconds on the command line.
pub fn refresh_interval_from_secs(secs: f32) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidRefreshInterval(secs));
    }
    Duration::try_from_secs_f32(secs).map_err(|_| ConfigError::InvalidRefreshInterval(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().expect("defaults must validate");
    }

    #[test]
    fn rejects_inverted_or_negative_range() {
        assert!(DistanceRange::new(5.0, 1.0).is_err());
        assert!(DistanceRange::new(1.0, 1.0).is_err());
        assert!(DistanceRange::new(-0.5, 1.0).is_err());
        assert!(DistanceRange::new(0.0, f32::INFINITY).is_err());
        assert!(DistanceRange::new(0.0, 0.5).is_ok());
    }

    #[test]
    fn rejects_empty_layout_and_zero_ceiling() {
        let cfg = Config {
            n_h: 0,
            ..Config::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyLayout { n_h: 0, n_v: DEFAULT_ROWS })
        );
        let cfg = Config {
            counter_ceiling: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCounterCeiling));
    }

    #[test]
    fn rejects_layouts_past_terminal_coordinates() {
        let tall = Config {
            n_v: 65_530,
            ..Config::default()
        };
        assert_eq!(
            tall.validate(),
            Err(ConfigError::LayoutTooLarge { n_h: DEFAULT_COLUMNS, n_v: 65_530 })
        );
        let wide = Config {
            n_h: 40_000,
            ..Config::default()
        };
        assert!(matches!(wide.validate(), Err(ConfigError::LayoutTooLarge { .. })));
        let largest = Config {
            n_h: 32_766,
            n_v: 65_521,
            ..Config::default()
        };
        largest.validate().expect("largest addressable layout");
    }

    #[test]
    fn frame_rate_must_be_positive_and_bounded() {
        for fps in [0.0, -5.0, 1e-20, f32::NAN, f32::INFINITY, 5_000.0] {
            assert!(frame_interval_from_fps(fps).is_err(), "{fps} fps accepted");
            let cfg = Config {
                sensor_fps: fps,
                ..Config::default()
            };
            assert!(cfg.validate().is_err(), "{fps} fps passed validation");
        }
        assert_eq!(
            frame_interval_from_fps(10.0).expect("10 fps"),
            Duration::from_secs_f32(0.1)
        );
    }

    #[test]
    fn toggles_return_new_values_and_leave_the_input_alone() {
        let cfg = Config::default();
        let mirrored = cfg.with_mirror_toggled();
        assert!(!cfg.mirror_mode);
        assert!(mirrored.mirror_mode);
        assert!(!mirrored.with_mirror_toggled().mirror_mode);
        assert!(!cfg.with_stats_toggled().show_stats);
        assert!(cfg.with_window_toggled().display_window);
        assert_eq!(mirrored.n_h, cfg.n_h);
    }

    #[test]
    fn refresh_interval_parsing() {
        assert_eq!(
            refresh_interval_from_secs(0.25).expect("positive interval"),
            Duration::from_millis(250)
        );
        assert!(refresh_interval_from_secs(0.0).is_err());
        assert!(refresh_interval_from_secs(f32::NAN).is_err());
    }
}
