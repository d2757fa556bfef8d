use std::fmt;
use std::io::{self, Write};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::analysis::{analyze_columns, PresenceVector};
use crate::config::Config;
use crate::grid::Grid;
use crate::input::thread::InputMessage;
use crate::input::{next_key_command, InputError, KeyCommand};
use crate::render::dashboard::{self, DashboardLayout, StatsSnapshot};
use crate::render::heatmap::{create_buffer, create_console_heatmap, HeatmapStyle, RenderBuffer};
use crate::sampler::thread::SamplerHandle;
use crate::sampler::SampleError;
use crate::tracker::{OccupancyTracker, TrackerError};

pub const FRAME_TARGET: Duration = Duration::from_millis(4);

#[derive(Debug)]
pub enum AppError {
    Sampler(SampleError),
    Tracker(TrackerError),
    Input(InputError),
    Io(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sampler(err) => write!(f, "{err}"),
            Self::Tracker(err) => write!(f, "{err}"),
            Self::Input(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "terminal write failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sampler(err) => Some(err),
            Self::Tracker(err) => Some(err),
            Self::Input(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<SampleError> for AppError {
    fn from(err: SampleError) -> Self {
        Self::Sampler(err)
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        Self::Tracker(err)
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        Self::Input(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Everything the dashboard loop owns. The render buffer and the
/// counters each have this single owner.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub layout: DashboardLayout,
    pub tracker: OccupancyTracker,
    pub render_buffer: RenderBuffer,
    pub latest_grid: Option<Grid>,
    /// Presence in physical column order.
    pub presence: PresenceVector,
    pub frame_count: u64,
    pub fps: f32,
    pub last_frame_time: Option<Instant>,
    pub last_ui_update: Option<Instant>,
    pub use_truecolor: bool,
}

impl AppState {
    pub fn new(config: Config, use_truecolor: bool) -> Self {
        Self {
            layout: DashboardLayout::new(&config),
            tracker: OccupancyTracker::new(config.n_h, config.counter_ceiling),
            render_buffer: create_buffer(config.n_h, config.n_v),
            latest_grid: None,
            presence: PresenceVector::absent(config.n_h),
            frame_count: 0,
            fps: 0.0,
            last_frame_time: None,
            last_ui_update: None,
            use_truecolor,
            config,
        }
    }

    fn heatmap_style(&self) -> HeatmapStyle {
        HeatmapStyle {
            range: self.config.range,
            use_truecolor: self.use_truecolor,
        }
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let mirror = self.config.mirror_mode;
        StatsSnapshot {
            fps: self.fps,
            mirror,
            presence: if mirror {
                self.presence.mirrored()
            } else {
                self.presence.clone()
            },
            counters: self.tracker.display_counters(mirror),
        }
    }
}

// --- Frame cadence ---

/// Analyses one grid and folds it into the counters. Counters follow
/// physical columns, so analysis here never mirrors.
pub fn process_frame(app_state: &mut AppState, grid: Grid, now: Instant) -> Result<(), AppError> {
    let presence = analyze_columns(&grid, app_state.config.range, false);
    app_state.tracker.update(&presence)?;
    app_state.presence = presence;
    app_state.latest_grid = Some(grid);
    app_state.frame_count += 1;

    if let Some(last) = app_state.last_frame_time {
        let delta_time = now.duration_since(last).as_secs_f32().max(1e-6);
        let instant_fps = 1.0 / delta_time;
        app_state.fps = if app_state.fps <= 0.01 {
            instant_fps
        } else {
            0.90 * app_state.fps + 0.10 * instant_fps
        };
    }
    app_state.last_frame_time = Some(now);
    Ok(())
}

// --- UI cadence ---

pub fn ui_refresh_due(app_state: &AppState, now: Instant) -> bool {
    match app_state.last_ui_update {
        Some(last) => now.duration_since(last) >= app_state.config.ui_refresh_interval,
        None => true,
    }
}

pub fn refresh_ui(app_state: &mut AppState, now: Instant, stdout: &mut impl Write) -> io::Result<()> {
    if let Some(grid) = app_state.latest_grid.as_ref() {
        let previous = std::mem::replace(&mut app_state.render_buffer, create_buffer(0, 0));
        app_state.render_buffer = create_console_heatmap(
            grid,
            previous,
            app_state.config.mirror_mode,
            &app_state.heatmap_style(),
            stdout,
        )?;
    }
    if app_state.config.show_stats {
        dashboard::draw_stats(&app_state.layout, &app_state.stats_snapshot(), stdout)?;
    }
    app_state.last_ui_update = Some(now);
    Ok(())
}

// --- Commands ---

pub fn apply_key_command(
    app_state: &mut AppState,
    command: KeyCommand,
    stdout: &mut impl Write,
) -> io::Result<LoopControl> {
    match command {
        KeyCommand::Quit => {
            info!("quit requested");
            return Ok(LoopControl::Quit);
        }
        KeyCommand::ToggleWindow => {
            app_state.config = app_state.config.with_window_toggled();
            info!(
                display_window = app_state.config.display_window,
                "window display toggled"
            );
        }
        KeyCommand::ToggleStats => {
            app_state.config = app_state.config.with_stats_toggled();
            info!(show_stats = app_state.config.show_stats, "stats toggled");
            if !app_state.config.show_stats {
                dashboard::clear_stats(&app_state.layout, stdout)?;
            }
        }
        KeyCommand::ToggleMirror => {
            app_state.config = app_state.config.with_mirror_toggled();
            info!(mirror = app_state.config.mirror_mode, "mirror mode toggled");
            if app_state.config.show_stats {
                dashboard::draw_mirror_line(&app_state.layout, app_state.config.mirror_mode, stdout)?;
            }
        }
    }
    Ok(LoopControl::Continue)
}

/// Runs until `q`, an input failure, or a sampler failure. The frame in
/// progress always finishes before the loop returns.
pub fn run_dashboard(
    app_state: &mut AppState,
    sampler: &SamplerHandle,
    input_rx: &Receiver<InputMessage>,
    stdout: &mut impl Write,
) -> Result<(), AppError> {
    dashboard::draw_static_layout(&app_state.config, &app_state.layout, stdout)?;
    stdout.flush()?;

    loop {
        let frame_start = Instant::now();

        if let Some(grid) = sampler.take_latest()? {
            process_frame(app_state, grid, frame_start)?;
        }

        if ui_refresh_due(app_state, frame_start) {
            refresh_ui(app_state, frame_start, stdout)?;
        }

        let mut control = LoopControl::Continue;
        while let Some(command) = next_key_command(input_rx)? {
            debug!(?command, "key command");
            control = apply_key_command(app_state, command, stdout)?;
            if control == LoopControl::Quit {
                break;
            }
        }
        stdout.flush()?;
        if control == LoopControl::Quit {
            break;
        }

        let spent = frame_start.elapsed();
        if spent < FRAME_TARGET {
            std::thread::sleep(FRAME_TARGET - spent);
        }
    }

    info!(frames = app_state.frame_count, "dashboard stopped");
    Ok(())
}
