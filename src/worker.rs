//! Reader Worker: one per dataset handle, sampling chip coordinates and
//! filling slots.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, MutexGuard};
use std::thread;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::backend::{BandHandle, DatasetHandle};
use crate::config::TuningConfig;
use crate::ring::{SlotData, SlotRing};
use crate::types::{DataType, Mode};

/// Per-worker session context: everything a reader thread needs that is
/// shared read-only across workers and therefore needs no lock.
pub struct WorkerShared {
    pub ring: Arc<SlotRing>,
    pub mode: Arc<AtomicU8>,
    pub window_size: i32,
    pub width: i32,
    pub height: i32,
    pub band_count: i32,
    pub bands: Vec<i32>,
    pub imagery_dt: DataType,
    pub label_dt: DataType,
    pub tuning: TuningConfig,
}

/// Resources exclusively owned by one worker.
pub struct WorkerOwned {
    pub id: u64,
    pub imagery_dataset: DatasetHandle,
    pub imagery_first_band: BandHandle,
    pub label_dataset: Option<DatasetHandle>,
    /// Worker-local copy of the band list; `GDALDatasetRasterIO` takes a
    /// mutable band-map pointer even though it does not write through it.
    pub bands: Vec<i32>,
}

pub(crate) fn current_mode(mode: &AtomicU8) -> Mode {
    Mode::from_u8(mode.load(Ordering::Acquire))
}

/// Entry point run on the worker's dedicated thread. Returns when `mode`
/// is no longer `Training`/`Evaluation`.
pub fn run(shared: &WorkerShared, owned: &mut WorkerOwned) {
    let mut rng = SmallRng::seed_from_u64(owned.id);

    while current_mode(&shared.mode).is_producing() {
        let mode = current_mode(&shared.mode);
        let (cx, cy) = sample_chip_coords(shared, &mut rng, mode, &owned.imagery_first_band);
        let x = cx * shared.window_size;
        let y = cy * shared.window_size;

        let mut guard = match claim_empty_slot(shared, &mut rng) {
            Some(g) => g,
            None => return, // mode changed to a non-producing state mid-search
        };

        if let Err(e) = owned.imagery_dataset.read_window(
            shared.imagery_dt,
            &mut owned.bands,
            x,
            y,
            shared.window_size,
            &mut guard.imagery,
        ) {
            log::warn!("reader-{}: imagery read at ({x},{y}) failed: {e}", owned.id);
            drop(guard);
            thread::sleep(shared.tuning.read_retry_backoff);
            continue;
        }

        if let Some(label_dataset) = owned.label_dataset.as_ref() {
            let label_buf = guard
                .label
                .as_mut()
                .expect("label buffer must exist when a label dataset is configured");
            if let Err(e) =
                label_dataset.read_window(shared.label_dt, &mut [1], x, y, shared.window_size, label_buf)
            {
                log::warn!("reader-{}: label read at ({x},{y}) failed: {e}", owned.id);
                drop(guard);
                thread::sleep(shared.tuning.read_retry_backoff);
                continue;
            }
        }

        guard.ready = true;
        drop(guard);
        thread::sleep(shared.tuning.post_publish_backoff);
    }
}

/// Rejection-samples chip-grid coordinates satisfying both the mode's
/// partition predicate (the `mod 7` rule) and the coverage predicate,
/// using the chip-grid coordinate sum, not pixel coordinates.
fn sample_chip_coords(
    shared: &WorkerShared,
    rng: &mut SmallRng,
    mode: Mode,
    first_band: &BandHandle,
) -> (i32, i32) {
    let max_cx = shared.width / shared.window_size;
    let max_cy = shared.height / shared.window_size;
    debug_assert!(max_cx > 0 && max_cy > 0, "raster smaller than one window");

    loop {
        let cx = rng.gen_range(0..max_cx);
        let cy = rng.gen_range(0..max_cy);

        let partition_ok = match mode {
            Mode::Training => (cx + cy) % 7 != 0,
            Mode::Evaluation => (cx + cy) % 7 == 0,
            Mode::Inference | Mode::Stopped => unreachable!("worker loop only runs while producing"),
        };
        if !partition_ok {
            continue;
        }

        let x = cx * shared.window_size;
        let y = cy * shared.window_size;
        if first_band.window_is_empty(x, y, shared.window_size) {
            continue;
        }

        return (cx, cy);
    }
}

/// Searches for a claimable (unlocked and `Empty`) slot, round-robin from a
/// random start index. Returns `None` if `mode`
/// changes to a non-producing state while searching, in which case any held
/// lock has already been released by the time this returns.
fn claim_empty_slot<'a>(
    shared: &'a WorkerShared,
    rng: &mut SmallRng,
) -> Option<MutexGuard<'a, SlotData>> {
    let m = shared.ring.len();
    let mut idx = rng.gen_range(0..m);

    loop {
        if !current_mode(&shared.mode).is_producing() {
            return None;
        }

        if let Some(guard) = shared.ring.try_lock(idx) {
            if !guard.ready {
                return Some(guard);
            }
            // Slot is Full; release (guard drops here) and keep looking.
        }

        idx = (idx + 1) % m;
        thread::sleep(shared.tuning.slot_contention_backoff);
    }
}
