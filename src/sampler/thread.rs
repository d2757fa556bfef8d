use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{GridSampler, SampleError};
use crate::grid::Grid;

const IDLE_BACKOFF: Duration = Duration::from_millis(2);

/// Single-slot handoff: a newer frame replaces an unread one, so the
/// reader never works through a backlog.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Result<Grid, SampleError>>>,
}

impl LatestFrame {
    fn lock(&self) -> MutexGuard<'_, Option<Result<Grid, SampleError>>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn publish(&self, frame: Result<Grid, SampleError>) {
        let mut slot = self.lock();
        // A pending failure must reach the reader; later frames do not hide it.
        if matches!(*slot, Some(Err(_))) {
            return;
        }
        *slot = Some(frame);
    }

    /// Takes the newest frame, or `Ok(None)` if nothing arrived since the last take.
    pub fn take(&self) -> Result<Option<Grid>, SampleError> {
        self.lock().take().transpose()
    }
}

pub struct SamplerHandle {
    latest: Arc<LatestFrame>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn take_latest(&self) -> Result<Option<Grid>, SampleError> {
        self.latest.take()
    }

    /// Asks the sampler to stop after its current poll and waits for it.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("sampler thread panicked during shutdown");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn spawn_sampler_thread(
    mut sampler: Box<dyn GridSampler>,
) -> Result<SamplerHandle, SampleError> {
    let latest = Arc::new(LatestFrame::default());
    let stop = Arc::new(AtomicBool::new(false));
    let name = sampler.name();

    let thread_latest = Arc::clone(&latest);
    let thread_stop = Arc::clone(&stop);
    let join = std::thread::Builder::new()
        .name(format!("depthwatch-{name}"))
        .spawn(move || {
            tracing::info!(source = name, "sampler started");
            while !thread_stop.load(Ordering::Acquire) {
                match sampler.poll() {
                    Ok(Some(grid)) => thread_latest.publish(Ok(grid)),
                    Ok(None) => std::thread::sleep(IDLE_BACKOFF),
                    Err(err) => {
                        tracing::error!(source = name, %err, "sampler failed");
                        thread_latest.publish(Err(err));
                        break;
                    }
                }
            }
            tracing::info!(source = name, "sampler stopped");
        })
        .map_err(|e| SampleError::DeviceUnavailable(format!("cannot start sampler thread: {e}")))?;

    Ok(SamplerHandle {
        latest,
        stop,
        join: Some(join),
    })
}
