use crossterm::{
    cursor, queue,
    style::{Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

use super::{bucket_for, make_color, terminal_coord, Bucket};
use crate::analysis::display_column;
use crate::config::DistanceRange;
use crate::grid::Grid;

/// Terminal cell of the heatmap's top-left corner (the border).
pub const HEATMAP_ORIGIN: (u16, u16) = (0, 0);
pub const CELL_WIDTH: usize = 2;

/// What is currently drawn, per display position. `None` means nothing
/// has been drawn there yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    n_h: usize,
    n_v: usize,
    cells: Vec<Option<Bucket>>,
}

impl RenderBuffer {
    #[cfg(test)]
    pub fn n_h(&self) -> usize {
        self.n_h
    }

    #[cfg(test)]
    pub fn n_v(&self) -> usize {
        self.n_v
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, display_col: usize) -> Option<Bucket> {
        if row >= self.n_v || display_col >= self.n_h {
            return None;
        }
        self.cells[row * self.n_h + display_col]
    }

    fn matches(&self, grid: &Grid) -> bool {
        self.n_h == grid.n_h() && self.n_v == grid.n_v()
    }
}

pub fn create_buffer(n_h: usize, n_v: usize) -> RenderBuffer {
    RenderBuffer {
        n_h,
        n_v,
        cells: vec![None; n_h.saturating_mul(n_v)],
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeatmapStyle {
    pub range: DistanceRange,
    pub use_truecolor: bool,
}

fn cell_position(row: usize, display_col: usize) -> io::Result<(u16, u16)> {
    let x = display_col
        .checked_mul(CELL_WIDTH)
        .and_then(|x| x.checked_add(usize::from(HEATMAP_ORIGIN.0) + 1));
    let y = row.checked_add(usize::from(HEATMAP_ORIGIN.1) + 1);
    match (x, y) {
        (Some(x), Some(y)) => Ok((terminal_coord(x)?, terminal_coord(y)?)),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "heatmap cell lies outside terminal coordinates",
        )),
    }
}

// --- Diff render ---

/// Draws every cell whose bucket differs from `previous` and returns the
/// buffer describing the screen afterwards. Unchanged cells produce no
/// output at all, so a repeated grid writes zero bytes.
///
/// A `previous` buffer sized for another layout is discarded and the
/// whole grid is drawn.
pub fn create_console_heatmap(
    grid: &Grid,
    previous: RenderBuffer,
    mirror: bool,
    style: &HeatmapStyle,
    out: &mut impl Write,
) -> io::Result<RenderBuffer> {
    let mut buffer = if previous.matches(grid) {
        previous
    } else {
        create_buffer(grid.n_h(), grid.n_v())
    };

    let n_h = grid.n_h();
    let mut last_color: Option<[u8; 3]> = None;
    let mut wrote_any = false;

    for row in 0..grid.n_v() {
        for col in 0..n_h {
            let distance = grid.get(row, col).unwrap_or_default();
            let bucket = bucket_for(distance, style.range);
            let dc = display_column(col, n_h, mirror);
            let slot = &mut buffer.cells[row * n_h + dc];
            if *slot == Some(bucket) {
                continue;
            }

            let (x, y) = cell_position(row, dc)?;
            queue!(out, cursor::MoveTo(x, y))?;
            if let Some(color) = bucket.color() {
                if last_color != Some(color) {
                    queue!(out, SetForegroundColor(make_color(color, style.use_truecolor)))?;
                    last_color = Some(color);
                }
            }
            queue!(out, Print(bucket.glyph()))?;
            *slot = Some(bucket);
            wrote_any = true;
        }
    }

    if wrote_any {
        queue!(out, ResetColor)?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::INVALID_DISTANCE;
    use proptest::prelude::*;

    fn style() -> HeatmapStyle {
        HeatmapStyle {
            range: DistanceRange::new(0.2, 10.0).expect("valid range"),
            use_truecolor: false,
        }
    }

    fn sample_grid() -> Grid {
        Grid::new(3, 2, vec![0.5, INVALID_DISTANCE, 4.0, 9.9, 2.5, -1.0]).expect("3x2 grid")
    }

    #[test]
    fn first_draw_covers_every_cell() {
        let grid = sample_grid();
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(3, 2), false, &style(), &mut out)
            .expect("render into memory");
        assert!(!out.is_empty());
        for row in 0..2 {
            for col in 0..3 {
                let expected = bucket_for(grid.get(row, col).expect("in bounds"), style().range);
                assert_eq!(buffer.get(row, col), Some(expected));
            }
        }
    }

    #[test]
    fn identical_grid_writes_nothing_second_time() {
        let grid = sample_grid();
        let mut out = Vec::new();
        let first = create_console_heatmap(&grid, create_buffer(3, 2), false, &style(), &mut out)
            .expect("first render");

        let mut second_out = Vec::new();
        let second = create_console_heatmap(&grid, first.clone(), false, &style(), &mut second_out)
            .expect("second render");
        assert!(second_out.is_empty());
        assert_eq!(second, first);
    }

    #[test]
    fn only_changed_cell_is_redrawn() {
        let grid = Grid::new(4, 1, vec![1.0; 4]).expect("4x1 grid");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(4, 1), false, &style(), &mut out)
            .expect("first render");

        let changed = Grid::new(4, 1, vec![1.0, 1.0, INVALID_DISTANCE, 1.0]).expect("4x1 grid");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&changed, buffer, false, &style(), &mut out)
            .expect("second render");
        let text = String::from_utf8(out).expect("ansi output is utf-8");
        // Column 2 sits at x = 1 + 2*2 = 5, row 0 at y = 1 (1-based: 2;6).
        assert!(text.starts_with("\x1b[2;6H"));
        assert_eq!(text.matches('H').count(), 1);
        assert_eq!(buffer.get(0, 2), Some(Bucket::Invalid));
    }

    #[test]
    fn small_change_within_bucket_is_not_redrawn() {
        let grid = Grid::new(1, 1, vec![1.0]).expect("1x1 grid");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(1, 1), false, &style(), &mut out)
            .expect("first render");
        let nudged = Grid::new(1, 1, vec![1.01]).expect("1x1 grid");
        let mut out = Vec::new();
        create_console_heatmap(&nudged, buffer, false, &style(), &mut out).expect("second render");
        assert!(out.is_empty());
    }

    #[test]
    fn mismatched_previous_buffer_is_replaced() {
        let grid = sample_grid();
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(7, 7), false, &style(), &mut out)
            .expect("render with stale buffer");
        assert_eq!((buffer.n_h(), buffer.n_v()), (3, 2));
        assert!(buffer.get(1, 2).is_some());
    }

    #[test]
    fn empty_grid_renders_nothing() {
        let grid = Grid::new(0, 0, Vec::new()).expect("empty grid");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(0, 0), true, &style(), &mut out)
            .expect("render empty grid");
        assert!(out.is_empty());
        assert_eq!(buffer, create_buffer(0, 0));
    }

    #[test]
    fn grid_wider_than_the_terminal_is_an_error() {
        let grid = Grid::new(40_000, 1, vec![1.0; 40_000]).expect("wide grid");
        let mut out = Vec::new();
        let err = create_console_heatmap(&grid, create_buffer(0, 0), false, &style(), &mut out)
            .expect_err("columns past u16 cannot be addressed");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn mirror_toggle_redraws_moved_cells() {
        let mut cells = vec![INVALID_DISTANCE; 10];
        cells[3] = 1.5;
        let grid = Grid::new(10, 1, cells).expect("10x1 grid");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, create_buffer(10, 1), false, &style(), &mut out)
            .expect("plain render");
        let mut out = Vec::new();
        let buffer = create_console_heatmap(&grid, buffer, true, &style(), &mut out)
            .expect("mirrored render");
        assert_eq!(buffer.get(0, 6), Some(Bucket::Level(0)));
        assert_eq!(buffer.get(0, 3), Some(Bucket::Invalid));
        assert_eq!(String::from_utf8(out).expect("utf-8").matches('H').count(), 2);
    }

    proptest! {
        #[test]
        fn prop_mirror_is_a_column_permutation(
            n_h in 1usize..8,
            n_v in 1usize..5,
            seed in proptest::collection::vec(-1.0f32..12.0, 40),
        ) {
            let cells: Vec<f32> = seed.iter().copied().cycle().take(n_h * n_v).collect();
            let grid = Grid::new(n_h, n_v, cells).expect("sized to layout");
            let mut sink = Vec::new();
            let plain = create_console_heatmap(&grid, create_buffer(n_h, n_v), false, &style(), &mut sink)
                .expect("plain render");
            let mirrored = create_console_heatmap(&grid, create_buffer(n_h, n_v), true, &style(), &mut sink)
                .expect("mirrored render");
            for row in 0..n_v {
                for col in 0..n_h {
                    prop_assert_eq!(plain.get(row, col), mirrored.get(row, n_h - 1 - col));
                }
            }
        }
    }
}
