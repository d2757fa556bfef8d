use std::fs;
use std::path::Path;
use std::time::Instant;

use super::{FramePacer, GridSampler, SampleError};
use crate::grid::Grid;

/// Parses a text capture: one frame per line, `n_h * n_v` distances in
/// metres separated by commas and/or whitespace. Blank lines and lines
/// starting with `#` are skipped.
pub fn parse_capture(text: &str, n_h: usize, n_v: usize) -> Result<Vec<Grid>, SampleError> {
    let mut frames = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let cells = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<f32>().map_err(|e| SampleError::Parse {
                    line: idx + 1,
                    message: format!("'{field}' is not a distance: {e}"),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let grid = Grid::new(n_h, n_v, cells).map_err(|e| SampleError::Parse {
            line: idx + 1,
            message: e.to_string(),
        })?;
        frames.push(grid);
    }
    Ok(frames)
}

/// Plays a recorded capture back at a fixed rate, looping at the end.
pub struct ReplaySampler {
    frames: Vec<Grid>,
    cursor: usize,
    pacer: FramePacer,
}

impl ReplaySampler {
    pub fn new(frames: Vec<Grid>, fps: f32) -> Self {
        Self {
            frames,
            cursor: 0,
            pacer: FramePacer::new(fps),
        }
    }

    pub fn open(path: &Path, n_h: usize, n_v: usize, fps: f32) -> Result<Self, SampleError> {
        let text = fs::read_to_string(path).map_err(|e| SampleError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let frames = parse_capture(&text, n_h, n_v)?;
        if frames.is_empty() {
            return Err(SampleError::EmptyCapture {
                path: path.display().to_string(),
            });
        }
        tracing::info!(path = %path.display(), frames = frames.len(), "loaded depth capture");
        Ok(Self::new(frames, fps))
    }

    fn advance(&mut self) -> Option<Grid> {
        let grid = self.frames.get(self.cursor)?.clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Some(grid)
    }
}

impl GridSampler for ReplaySampler {
    fn poll(&mut self) -> Result<Option<Grid>, SampleError> {
        if !self.pacer.ready(Instant::now()) {
            return Ok(None);
        }
        Ok(self.advance())
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
