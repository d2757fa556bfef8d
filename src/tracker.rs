use std::fmt;

use crate::analysis::PresenceVector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "presence vector has {actual} columns, tracker was configured for {expected}"
            ),
        }
    }
}

impl std::error::Error for TrackerError {}

/// Run length of consecutive present frames, per physical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyTracker {
    position_counters: Vec<u32>,
    ceiling: u32,
}

impl OccupancyTracker {
    pub fn new(n_h: usize, ceiling: u32) -> Self {
        Self {
            position_counters: vec![0; n_h],
            ceiling: ceiling.max(1),
        }
    }

    /// Present columns count up (saturating at the ceiling), absent ones drop to zero.
    pub fn update(&mut self, presence: &PresenceVector) -> Result<(), TrackerError> {
        if presence.len() != self.position_counters.len() {
            return Err(TrackerError::LengthMismatch {
                expected: self.position_counters.len(),
                actual: presence.len(),
            });
        }

        for (counter, present) in self.position_counters.iter_mut().zip(presence.iter()) {
            *counter = if present {
                counter.saturating_add(1).min(self.ceiling)
            } else {
                0
            };
        }
        Ok(())
    }

    pub fn position_counters(&self) -> &[u32] {
        &self.position_counters
    }

    /// Counters reordered to match a mirrored display; storage is untouched.
    pub fn display_counters(&self, mirror: bool) -> CounterList {
        let mut counters = self.position_counters.clone();
        if mirror {
            counters.reverse();
        }
        CounterList(counters)
    }
}

/// Counters formatted as a bracketed list, e.g. `[0, 3, 0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterList(pub Vec<u32>);

impl fmt::Display for CounterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, counter) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{counter}")?;
        }
        f.write_str("]")
    }
}
