use crossterm::{
    cursor, queue,
    style::{Print, ResetColor},
    terminal::{self, ClearType},
};
use std::fmt::Write as _;
use std::io::{self, Write};

use super::heatmap::CELL_WIDTH;
use super::terminal_coord;
use crate::analysis::PresenceVector;
use crate::config::Config;
use crate::tracker::CounterList;

const MIN_STATS_WIDTH: usize = 50;
const CONTROLS: [&str; 5] = [
    "Controls:",
    "  'q' - Exit",
    "  'w' - Toggle window",
    "  's' - Toggle stats",
    "  'm' - Toggle mirror mode",
];

const RANGE_OFFSET: usize = 3;
const CONTROLS_OFFSET: usize = 4;
const FPS_OFFSET: usize = 10;
const MIRROR_OFFSET: usize = 11;
const COLUMNS_OFFSET: usize = 12;
/// Lowest dashboard line, counted from the last heatmap row.
pub const LAST_ROW_OFFSET: usize = 13;

/// Row numbers of everything below the heatmap box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub n_h: usize,
    pub n_v: usize,
    pub stats_width: usize,
}

impl DashboardLayout {
    pub fn new(config: &Config) -> Self {
        let digits = config.counter_ceiling.to_string().len();
        let counters = "Counters: []".len() + config.n_h * (digits + 2);
        let columns = "Columns: ".len() + config.n_h * 2;
        Self {
            n_h: config.n_h,
            n_v: config.n_v,
            stats_width: MIN_STATS_WIDTH.max(counters).max(columns),
        }
    }

    fn row(&self, offset: usize) -> io::Result<u16> {
        let row = self.n_v.checked_add(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "dashboard row overflows")
        })?;
        terminal_coord(row)
    }

    pub fn range_row(&self) -> io::Result<u16> {
        self.row(RANGE_OFFSET)
    }

    pub fn controls_row(&self) -> io::Result<u16> {
        self.row(CONTROLS_OFFSET)
    }

    pub fn fps_row(&self) -> io::Result<u16> {
        self.row(FPS_OFFSET)
    }

    pub fn mirror_row(&self) -> io::Result<u16> {
        self.row(MIRROR_OFFSET)
    }

    pub fn columns_row(&self) -> io::Result<u16> {
        self.row(COLUMNS_OFFSET)
    }

    pub fn counters_row(&self) -> io::Result<u16> {
        self.row(LAST_ROW_OFFSET)
    }
}

/// Values shown in the stats block, already in display order.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub fps: f32,
    pub mirror: bool,
    pub presence: PresenceVector,
    pub counters: CounterList,
}

fn truncate_and_pad_in_place(text: &mut String, width: usize) {
    if width == 0 {
        text.clear();
        return;
    }

    let mut seen_chars = 0usize;
    let mut truncate_byte = None;
    for (idx, _) in text.char_indices() {
        if seen_chars == width {
            truncate_byte = Some(idx);
            break;
        }
        seen_chars += 1;
    }

    if let Some(idx) = truncate_byte {
        text.truncate(idx);
    } else {
        for _ in seen_chars..width {
            text.push(' ');
        }
    }
}

fn format_error() -> io::Error {
    io::Error::other("failed to format dashboard line")
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

fn put_line(
    stdout: &mut impl Write,
    line: &mut String,
    row: u16,
    width: usize,
) -> io::Result<()> {
    truncate_and_pad_in_place(line, width);
    queue!(stdout, cursor::MoveTo(0, row), Print(line.as_str()))
}

/// Clears the screen and draws the heatmap frame and legend, plus the
/// initial stats block when stats are on. Called once; everything after
/// this is rewritten in place.
pub fn draw_static_layout(
    config: &Config,
    layout: &DashboardLayout,
    stdout: &mut impl Write,
) -> io::Result<()> {
    let inner = "━".repeat(layout.n_h * CELL_WIDTH);
    let blank = " ".repeat(layout.n_h * CELL_WIDTH);

    queue!(
        stdout,
        terminal::Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        Print(format!("┏{inner}┓"))
    )?;
    for i in 0..layout.n_v {
        queue!(
            stdout,
            cursor::MoveTo(0, terminal_coord(i + 1)?),
            Print(format!("┃{blank}┃"))
        )?;
    }
    queue!(
        stdout,
        cursor::MoveTo(0, layout.row(1)?),
        Print(format!("┗{inner}┛")),
        cursor::MoveTo(0, layout.range_row()?),
        Print(format!(
            "Range: {:.1}m to {:.1}m",
            config.range.min, config.range.max
        ))
    )?;
    let controls_row = usize::from(layout.controls_row()?);
    for (i, text) in CONTROLS.iter().enumerate() {
        queue!(stdout, cursor::MoveTo(0, terminal_coord(controls_row + i)?), Print(*text))?;
    }

    if !config.show_stats {
        return Ok(());
    }
    let initial = StatsSnapshot {
        fps: 0.0,
        mirror: config.mirror_mode,
        presence: PresenceVector::absent(layout.n_h),
        counters: CounterList(vec![0; layout.n_h]),
    };
    draw_stats(layout, &initial, stdout)
}

pub fn draw_stats(
    layout: &DashboardLayout,
    stats: &StatsSnapshot,
    stdout: &mut impl Write,
) -> io::Result<()> {
    let mut line = String::with_capacity(layout.stats_width);
    write!(line, "FPS: {:.1}", stats.fps).map_err(|_| format_error())?;
    put_line(stdout, &mut line, layout.fps_row()?, layout.stats_width)?;

    draw_mirror_line(layout, stats.mirror, stdout)?;

    line.clear();
    write!(line, "Columns: {}", stats.presence).map_err(|_| format_error())?;
    put_line(stdout, &mut line, layout.columns_row()?, layout.stats_width)?;

    line.clear();
    write!(line, "Counters: {}", stats.counters).map_err(|_| format_error())?;
    put_line(stdout, &mut line, layout.counters_row()?, layout.stats_width)?;

    queue!(stdout, ResetColor)
}

pub fn draw_mirror_line(
    layout: &DashboardLayout,
    mirror: bool,
    stdout: &mut impl Write,
) -> io::Result<()> {
    let mut line = format!("Mirror: {}", on_off(mirror));
    put_line(stdout, &mut line, layout.mirror_row()?, layout.stats_width)
}

/// Blanks the stats block when stats are switched off.
pub fn clear_stats(layout: &DashboardLayout, stdout: &mut impl Write) -> io::Result<()> {
    let mut line = String::with_capacity(layout.stats_width);
    for row in layout.fps_row()?..=layout.counters_row()? {
        line.clear();
        put_line(stdout, &mut line, row, layout.stats_width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> (Config, DashboardLayout) {
        let config = Config {
            n_h: 4,
            n_v: 2,
            ..Config::default()
        };
        let layout = DashboardLayout::new(&config);
        (config, layout)
    }

    fn rendered(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("dashboard output is utf-8")
    }

    #[test]
    fn pad_and_truncate() {
        let mut s = String::from("FPS: 1.0");
        truncate_and_pad_in_place(&mut s, 10);
        assert_eq!(s, "FPS: 1.0  ");
        truncate_and_pad_in_place(&mut s, 3);
        assert_eq!(s, "FPS");
        truncate_and_pad_in_place(&mut s, 0);
        assert!(s.is_empty());
    }

    #[test]
    fn rows_follow_box_height() {
        let (_, layout) = layout();
        assert_eq!(layout.range_row().expect("row"), 5);
        assert_eq!(layout.controls_row().expect("row"), 6);
        assert_eq!(layout.fps_row().expect("row"), 12);
        assert_eq!(layout.counters_row().expect("row"), 15);
    }

    #[test]
    fn rows_past_the_terminal_are_errors() {
        let config = Config {
            n_v: 65_530,
            ..Config::default()
        };
        let layout = DashboardLayout::new(&config);
        assert!(layout.range_row().is_ok());
        assert!(layout.counters_row().is_err());
        let mut out = Vec::new();
        let err = draw_static_layout(&config, &layout, &mut out)
            .expect_err("layout taller than the terminal");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn stats_width_fits_widest_counter_line() {
        let config = Config {
            n_h: 40,
            counter_ceiling: 65_535,
            ..Config::default()
        };
        let layout = DashboardLayout::new(&config);
        let full = CounterList(vec![65_535; 40]).to_string();
        assert!(layout.stats_width >= "Counters: ".len() + full.len());
    }

    #[test]
    fn static_layout_draws_box_and_legend() {
        let (config, layout) = layout();
        let mut out = Vec::new();
        draw_static_layout(&config, &layout, &mut out).expect("draw layout");
        let text = rendered(out);
        assert!(text.contains("┏━━━━━━━━┓"));
        assert!(text.contains("┃        ┃"));
        assert!(text.contains("┗━━━━━━━━┛"));
        assert!(text.contains("Range: 0.2m to 10.0m"));
        assert!(text.contains("'m' - Toggle mirror mode"));
        assert!(text.contains("Counters: [0, 0, 0, 0]"));
        assert!(text.contains("Mirror: OFF"));
    }

    #[test]
    fn static_layout_skips_stats_when_hidden() {
        let (config, layout) = layout();
        let config = Config {
            show_stats: false,
            ..config
        };
        let mut out = Vec::new();
        draw_static_layout(&config, &layout, &mut out).expect("draw layout");
        let text = rendered(out);
        assert!(text.contains("Range: 0.2m to 10.0m"));
        for label in ["FPS:", "Mirror:", "Columns:", "Counters:"] {
            assert!(!text.contains(label), "{label} drawn while stats are hidden");
        }
    }

    #[test]
    fn stats_lines_are_rewritten_in_place() {
        let (_, layout) = layout();
        let stats = StatsSnapshot {
            fps: 29.96,
            mirror: true,
            presence: PresenceVector::new(vec![false, true, false, false]),
            counters: CounterList(vec![0, 3, 0, 0]),
        };
        let mut out = Vec::new();
        draw_stats(&layout, &stats, &mut out).expect("draw stats");
        let text = rendered(out);
        assert!(text.contains("\x1b[13;1HFPS: 30.0"));
        assert!(text.contains("Mirror: ON"));
        assert!(text.contains("Columns: 0,1,0,0"));
        assert!(text.contains("Counters: [0, 3, 0, 0]"));
        assert!(!text.contains("\x1b[2J"));
    }

    #[test]
    fn clear_stats_blanks_each_line() {
        let (_, layout) = layout();
        let mut out = Vec::new();
        clear_stats(&layout, &mut out).expect("clear stats");
        let text = rendered(out);
        let blank = " ".repeat(layout.stats_width);
        assert_eq!(text.matches(blank.as_str()).count(), 4);
        assert!(!text.contains("FPS"));
    }
}
