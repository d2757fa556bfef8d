use std::fmt;

/// Distance reported for a cell with no valid stereo return.
pub const INVALID_DISTANCE: f32 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    NonFinite {
        index: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "grid has {actual} cells but the configured layout needs {expected}"
            ),
            Self::NonFinite { index } => {
                write!(f, "grid cell {index} holds a non-finite distance")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// One frame of per-cell distances in metres, row-major.
///
/// Values `<= 0` are the "no valid return" sentinel. A grid is never
/// mutated after construction; consumers derive their own state from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    n_h: usize,
    n_v: usize,
    cells: Vec<f32>,
}

impl Grid {
    pub fn new(n_h: usize, n_v: usize, cells: Vec<f32>) -> Result<Self, GridError> {
        let expected = n_h.saturating_mul(n_v);
        if cells.len() != expected {
            return Err(GridError::LengthMismatch {
                expected,
                actual: cells.len(),
            });
        }
        if let Some(index) = cells.iter().position(|d| !d.is_finite()) {
            return Err(GridError::NonFinite { index });
        }
        Ok(Self { n_h, n_v, cells })
    }

    #[cfg(test)]
    pub fn invalid(n_h: usize, n_v: usize) -> Self {
        Self {
            n_h,
            n_v,
            cells: vec![INVALID_DISTANCE; n_h.saturating_mul(n_v)],
        }
    }

    pub fn n_h(&self) -> usize {
        self.n_h
    }

    pub fn n_v(&self) -> usize {
        self.n_v
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[cfg(test)]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.n_v || col >= self.n_h {
            return None;
        }
        self.cells.get(row * self.n_h + col).copied()
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f32> + '_ {
        let n_h = self.n_h;
        let len = if col < n_h { self.n_v } else { 0 };
        (0..len).map(move |row| self.cells[row * n_h + col])
    }
}

/// Inclusive range test; the invalid sentinel is never in range.
pub fn is_in_range(distance: f32, min: f32, max: f32) -> bool {
    distance > 0.0 && distance >= min && distance <= max
}
