use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

mod analysis;
mod app;
mod config;
mod grid;
mod input;
mod render;
mod sampler;
mod terminal_setup;
mod tracker;

use app::{run_dashboard, AppError, AppState};
use config::{refresh_interval_from_secs, Config, DistanceRange};
use sampler::SampleError;
use sampler::replay::ReplaySampler;
use sampler::synthetic::SyntheticSampler;
use sampler::thread::spawn_sampler_thread;
use sampler::GridSampler;
use terminal_setup::{install_panic_hook, TerminalGuard};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Synthetic,
    Replay,
}

#[derive(Debug, Parser)]
#[command(
    name = "depthwatch",
    version,
    about = "Per-column occupancy and live heatmap for a stereo depth grid"
)]
struct Cli {
    #[arg(long, value_name = "N", default_value_t = config::DEFAULT_COLUMNS, help = "Grid columns")]
    columns: usize,
    #[arg(long, value_name = "N", default_value_t = config::DEFAULT_ROWS, help = "Grid rows")]
    rows: usize,
    #[arg(long, value_name = "METRES", default_value_t = config::DEFAULT_MIN_THRESHOLD, help = "Nearest distance counted as present")]
    min: f32,
    #[arg(long, value_name = "METRES", default_value_t = config::DEFAULT_MAX_THRESHOLD, help = "Farthest distance counted as present")]
    max: f32,
    #[arg(long, help = "Start with mirrored columns")]
    mirror: bool,
    #[arg(long, value_name = "SECS", default_value_t = config::DEFAULT_UI_REFRESH_SECS, help = "Heatmap and stats refresh interval")]
    ui_interval: f32,
    #[arg(long, help = "Start with the graphical window enabled")]
    window: bool,
    #[arg(long, help = "Start with the stats block hidden")]
    hide_stats: bool,
    #[arg(long, value_name = "N", default_value_t = config::DEFAULT_COUNTER_CEILING, help = "Highest value a persistence counter reaches")]
    counter_ceiling: u32,
    #[arg(long, value_enum, default_value_t = Source::Synthetic, help = "Where depth grids come from")]
    source: Source,
    #[arg(long, value_name = "PATH", required_if_eq("source", "replay"), help = "Capture file for --source replay")]
    replay: Option<PathBuf>,
    #[arg(long, value_name = "FPS", default_value_t = config::DEFAULT_SENSOR_FPS, help = "Sensor frame rate")]
    fps: f32,
    #[arg(long, help = "Seed for the synthetic scene")]
    seed: Option<u64>,
    #[arg(long, value_name = "PATH", help = "Write logs to this file")]
    log_file: Option<PathBuf>,
    #[arg(long, default_value = "info", value_parser = parse_log_level, help = "Log level for --log-file")]
    log_level: LevelFilter,
}

fn parse_log_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse::<LevelFilter>()
        .map_err(|e| format!("{e} (expected off, error, warn, info, debug or trace)"))
}

impl Cli {
    fn to_config(&self) -> AppResult<Config> {
        let config = Config {
            n_h: self.columns,
            n_v: self.rows,
            range: DistanceRange::new(self.min, self.max)?,
            mirror_mode: self.mirror,
            ui_refresh_interval: refresh_interval_from_secs(self.ui_interval)?,
            display_window: self.window,
            show_stats: !self.hide_stats,
            counter_ceiling: self.counter_ceiling,
            sensor_fps: self.fps,
        };
        config.validate()?;
        Ok(config)
    }

    fn build_sampler(&self, config: &Config) -> AppResult<Box<dyn GridSampler>> {
        match self.source {
            Source::Synthetic => Ok(Box::new(SyntheticSampler::new(
                config.n_h,
                config.n_v,
                config.range,
                config.sensor_fps,
                self.seed,
            ))),
            Source::Replay => {
                let path = self
                    .replay
                    .as_ref()
                    .ok_or("--source replay needs --replay <PATH>")?;
                Ok(Box::new(ReplaySampler::open(
                    path,
                    config.n_h,
                    config.n_v,
                    config.sensor_fps,
                )?))
            }
        }
    }
}

// The terminal is the UI, so logs only go to a file when one is asked for.
fn init_tracing(cli: &Cli) -> AppResult<()> {
    let Some(path) = cli.log_file.as_ref() else {
        return Ok(());
    };
    let file = File::create(path)
        .map_err(|e| format!("failed to open log file '{}': {e}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| format!("failed to install log subscriber: {e}"))?;
    Ok(())
}

fn main() -> AppResult<()> {
    install_panic_hook();
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = cli.to_config()?;
    info!(?config, source = ?cli.source, "starting depthwatch");
    let sampler = cli.build_sampler(&config)?;
    let mut sampler = spawn_sampler_thread(sampler)?;

    let mut app_state = AppState::new(config, render::detect_truecolor());

    let mut terminal = TerminalGuard::enter(BufWriter::with_capacity(64 * 1024, io::stdout()))?;
    let input_rx = input::thread::spawn_input_thread()?;
    let run_result = run_dashboard(&mut app_state, &sampler, &input_rx, terminal.writer());
    sampler.shutdown();
    let cleanup_result = terminal.restore();

    match run_result {
        Err(AppError::Sampler(err)) => {
            let _ = report_sampler_failure(&err, &cleanup_result, &mut io::stderr().lock());
            std::process::exit(1);
        }
        other => other?,
    }
    cleanup_result?;
    Ok(())
}

fn report_sampler_failure(
    err: &SampleError,
    cleanup_result: &AppResult<()>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "\nError: cannot access the depth sensor!")?;
    writeln!(out, "{err}")?;
    writeln!(out, "Check that no other application is using it, or reconnect the device.\n")?;
    if let Err(cleanup_err) = cleanup_result {
        writeln!(out, "Terminal restore also failed: {cleanup_err}")?;
    }
    out.flush()
}
