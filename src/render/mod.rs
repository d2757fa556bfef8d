pub mod dashboard;
pub mod heatmap;

use crossterm::style::Color;
use std::io;

use crate::config::DistanceRange;

/// Zero-based screen coordinate as crossterm's `u16`. `u16::MAX` itself is
/// refused because `MoveTo` emits coordinates one-based.
pub fn terminal_coord(value: usize) -> io::Result<u16> {
    u16::try_from(value)
        .ok()
        .filter(|v| *v < u16::MAX)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("screen coordinate {value} is outside the terminal"),
            )
        })
}

pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as f32 - 8.0) / 247.0 * 24.0) as u8;
    }
    let ri = (r as f32 / 255.0 * 5.0 + 0.5) as u8;
    let gi = (g as f32 / 255.0 * 5.0 + 0.5) as u8;
    let bi = (b as f32 / 255.0 * 5.0 + 0.5) as u8;
    16 + 36 * ri + 6 * gi + bi
}

pub fn make_color(rgb: [u8; 3], use_truecolor: bool) -> Color {
    let [r, g, b] = rgb;
    if use_truecolor {
        Color::Rgb { r, g, b }
    } else {
        Color::AnsiValue(rgb_to_ansi256(r, g, b))
    }
}

/// Checks the usual environment hints for 24-bit colour support.
pub fn detect_truecolor() -> bool {
    match std::env::var("COLORTERM") {
        Ok(val) => !val.is_empty() && (val == "truecolor" || val == "24bit"),
        Err(_) => match std::env::var("TERM_PROGRAM") {
            Ok(prog) => prog != "Apple_Terminal",
            Err(_) => match std::env::var("TERM") {
                Ok(term) => {
                    term.contains("ghostty") || term.contains("kitty") || term.contains("wezterm")
                }
                Err(_) => false,
            },
        },
    }
}

// --- Buckets ---

pub const LEVEL_COUNT: u8 = 5;

/// Glyphs from nearest to farthest level. Every cell is two columns wide.
pub const LEVEL_GLYPHS: [&str; LEVEL_COUNT as usize] = ["██", "▓▓", "▒▒", "░░", "··"];
pub const INVALID_GLYPH: &str = "  ";

const LEVEL_COLORS: [[u8; 3]; LEVEL_COUNT as usize] = [
    [255, 72, 48],
    [255, 168, 40],
    [232, 232, 64],
    [64, 200, 160],
    [72, 120, 255],
];

/// Visual class of one distance reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// Level `0` is the nearest slice of the range.
    Level(u8),
    Invalid,
}

impl Bucket {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Level(level) => LEVEL_GLYPHS[usize::from(level.min(LEVEL_COUNT - 1))],
            Self::Invalid => INVALID_GLYPH,
        }
    }

    pub fn color(self) -> Option<[u8; 3]> {
        match self {
            Self::Level(level) => Some(LEVEL_COLORS[usize::from(level.min(LEVEL_COUNT - 1))]),
            Self::Invalid => None,
        }
    }
}

/// Splits `range` into equal slices; anything outside it is `Invalid`.
/// Non-decreasing in distance across the whole range.
pub fn bucket_for(distance: f32, range: DistanceRange) -> Bucket {
    if !range.contains(distance) {
        return Bucket::Invalid;
    }
    let t = (distance - range.min) / range.span();
    let level = (t * LEVEL_COUNT as f32).floor() as i64;
    Bucket::Level(level.clamp(0, i64::from(LEVEL_COUNT - 1)) as u8)
}
