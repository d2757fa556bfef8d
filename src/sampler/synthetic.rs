use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use super::{FramePacer, GridSampler, SampleError};
use crate::config::DistanceRange;
use crate::grid::{Grid, INVALID_DISTANCE};

const OBJECT_COUNT: usize = 3;
const NOISE_RETURN_PROBABILITY: f64 = 0.01;
const DROPOUT_PROBABILITY: f64 = 0.08;

// --- Procedural scene ---

#[derive(Debug, Clone)]
struct Blob {
    /// Centre, in fractional columns.
    center: f32,
    /// Columns per second.
    velocity: f32,
    half_width: f32,
    depth: f32,
    top_row: usize,
    bottom_row: usize,
}

impl Blob {
    fn random(rng: &mut impl Rng, n_h: usize, n_v: usize, range: DistanceRange) -> Self {
        let cols = n_h.max(1) as f32;
        let top_row = rng.random_range(0..n_v.max(1));
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            center: rng.random_range(0.0..cols),
            velocity: rng.random_range(0.5_f32..2.5_f32) * direction,
            half_width: rng.random_range(0.4_f32..1.2_f32),
            depth: rng.random_range(range.min..=range.max),
            top_row,
            bottom_row: rng.random_range(top_row..n_v.max(1)),
        }
    }

    fn step(&mut self, dt: f32, n_h: usize) {
        let cols = n_h as f32;
        self.center += self.velocity * dt;
        if self.center < 0.0 {
            self.center = -self.center;
            self.velocity = self.velocity.abs();
        } else if self.center > cols {
            self.center = (2.0 * cols - self.center).max(0.0);
            self.velocity = -self.velocity.abs();
        }
    }

    fn covers(&self, row: usize, col: usize) -> bool {
        let c = col as f32 + 0.5;
        row >= self.top_row && row <= self.bottom_row && (c - self.center).abs() <= self.half_width
    }
}

/// Blobs drifting across the columns at fixed depths, with dropouts and
/// the odd stray return mixed in.
pub struct SyntheticSampler {
    n_h: usize,
    n_v: usize,
    range: DistanceRange,
    rng: StdRng,
    blobs: Vec<Blob>,
    pacer: FramePacer,
    last_frame: Option<Instant>,
}

impl SyntheticSampler {
    pub fn new(n_h: usize, n_v: usize, range: DistanceRange, fps: f32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let blobs = (0..OBJECT_COUNT)
            .map(|_| Blob::random(&mut rng, n_h, n_v, range))
            .collect();
        Self {
            n_h,
            n_v,
            range,
            rng,
            blobs,
            pacer: FramePacer::new(fps),
            last_frame: None,
        }
    }

    /// Advances the scene by `dt` seconds and samples every cell.
    pub fn next_grid(&mut self, dt: f32) -> Result<Grid, SampleError> {
        for blob in &mut self.blobs {
            blob.step(dt, self.n_h);
        }

        let mut cells = Vec::with_capacity(self.n_h * self.n_v);
        for row in 0..self.n_v {
            for col in 0..self.n_h {
                let nearest = self
                    .blobs
                    .iter()
                    .filter(|b| b.covers(row, col))
                    .map(|b| b.depth)
                    .min_by(f32::total_cmp);

                let distance = match nearest {
                    Some(_) if self.rng.random_bool(DROPOUT_PROBABILITY) => INVALID_DISTANCE,
                    Some(depth) => {
                        let jitter = self.rng.random_range(-0.03_f32..0.03_f32) * depth;
                        (depth + jitter).clamp(self.range.min, self.range.max)
                    }
                    None if self.rng.random_bool(NOISE_RETURN_PROBABILITY) => {
                        self.rng.random_range(self.range.min..=self.range.max)
                    }
                    None => INVALID_DISTANCE,
                };
                cells.push(distance);
            }
        }

        Grid::new(self.n_h, self.n_v, cells).map_err(SampleError::from)
    }
}

impl GridSampler for SyntheticSampler {
    fn poll(&mut self) -> Result<Option<Grid>, SampleError> {
        let now = Instant::now();
        if !self.pacer.ready(now) {
            return Ok(None);
        }
        let dt = self
            .last_frame
            .map(|t| now.duration_since(t).as_secs_f32())
            .unwrap_or_else(|| self.pacer.interval().as_secs_f32());
        self.last_frame = Some(now);
        self.next_grid(dt).map(Some)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
