use rayon::prelude::*;
use std::fmt;

use crate::config::DistanceRange;
use crate::grid::Grid;

/// One presence flag per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceVector(Vec<bool>);

impl PresenceVector {
    #[cfg(test)]
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    pub fn absent(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// Same flags in reversed column order.
    pub fn mirrored(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }
}

impl fmt::Display for PresenceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, present) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(if *present { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// --- Column reduction ---

/// A column is present if any one of its cells is inside `range`.
///
/// With `mirror` set the finished vector is reversed, so column
/// `n_h - 1 - x` lands at index `x`.
pub fn analyze_columns(grid: &Grid, range: DistanceRange, mirror: bool) -> PresenceVector {
    let flags: Vec<bool> = (0..grid.n_h())
        .into_par_iter()
        .map(|col| grid.column(col).any(|d| range.contains(d)))
        .collect();

    let presence = PresenceVector(flags);
    if mirror {
        presence.mirrored()
    } else {
        presence
    }
}

/// Maps a physical column to where it is drawn.
pub fn display_column(col: usize, n_h: usize, mirror: bool) -> usize {
    if mirror {
        n_h.saturating_sub(1).saturating_sub(col)
    } else {
        col
    }
}
