//! Session Controller: owns the full lifecycle from `start` to `stop`.
//! Session state lives in a handle rather than process globals; `stop`
//! consumes the handle so there is no way to call a method on a
//! torn-down session.

use std::cell::UnsafeCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::backend::DatasetHandle;
use crate::config::TuningConfig;
use crate::error::ChipError;
use crate::ring::SlotRing;
use crate::types::{DataType, Mode};
use crate::worker::{self, WorkerOwned, WorkerShared};

/// Parameters for `SessionHandle::start`.
pub struct StartParams {
    pub n: usize,
    pub m: usize,
    pub imagery_path: PathBuf,
    pub label_path: Option<PathBuf>,
    pub imagery_dt: DataType,
    pub label_dt: DataType,
    pub mode: Mode,
    pub window_size: i32,
    pub bands: Vec<i32>,
    pub tuning: TuningConfig,
}

impl StartParams {
    /// Builds `StartParams` from the raw integer codes a host speaks across
    /// a C ABI or similar non-Rust boundary: GDAL data-type codes for
    /// `imagery_dt`/`label_dt` and the `0..=3` mode codes
    /// (Stopped/Training/Evaluation/Inference), converting each to its typed
    /// Rust representation and rejecting unsupported values up front.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_codes(
        n: usize,
        m: usize,
        imagery_path: PathBuf,
        label_path: Option<PathBuf>,
        imagery_dt_code: i32,
        label_dt_code: i32,
        mode_code: i32,
        window_size: i32,
        bands: Vec<i32>,
        tuning: TuningConfig,
    ) -> Result<Self, ChipError> {
        Ok(Self {
            n,
            m,
            imagery_path,
            label_path,
            imagery_dt: DataType::from_gdal_code(imagery_dt_code)?,
            label_dt: DataType::from_gdal_code(label_dt_code)?,
            mode: Mode::from_code(mode_code)?,
            window_size,
            bands,
            tuning,
        })
    }
}

/// Per-worker-index storage for dataset handles, shared across the worker's
/// own thread and (for index 0, in Inference mode) the synchronous
/// inference path.
///
/// # Safety
/// Each index is touched by exactly one logical owner at a time: either the
/// worker thread with that id (while `mode` is `Training`/`Evaluation`), or
/// `get_inference_chip` reading index 0 (only reachable while `mode` is
/// `Inference`). A worker thread only ever takes `get_mut` on its slot after
/// observing `mode` as `Training`/`Evaluation` (see the spawn closure in
/// `start`, which checks `mode` *before* calling `get_mut` rather than
/// inside `worker::run`); `get_inference_chip` only takes `get` on slot 0
/// after observing `mode` as `Inference`. Since `mode` is a single `AtomicU8`
/// written once before any thread is spawned, these two checks can never
/// both pass for the same snapshot of `mode`, so a worker thread's `&mut`
/// and the inference path's `&` are never live over the same slot at the
/// same time — not just "in practice", but because the mutable borrow is
/// never taken at all on the branch where the shared borrow is reachable.
struct WorkerResources {
    slots: Vec<UnsafeCell<WorkerOwned>>,
}

// `WorkerOwned` (and therefore `UnsafeCell<WorkerOwned>`) is already `Send`
// structurally; only `Sync` needs the explicit, safety-commented opt-in.
unsafe impl Sync for WorkerResources {}

impl WorkerResources {
    fn get(&self, id: usize) -> &WorkerOwned {
        unsafe { &*self.slots[id].get() }
    }

    #[allow(clippy::mut_from_ref)]
    fn get_mut(&self, id: usize) -> &mut WorkerOwned {
        unsafe { &mut *self.slots[id].get() }
    }
}

/// A live session. Dropping without calling `stop` leaks worker threads;
/// always pair `start` with `stop`.
pub struct SessionHandle {
    pub(crate) shared: Arc<WorkerShared>,
    resources: Arc<WorkerResources>,
    threads: Vec<JoinHandle<()>>,
    width: i32,
    height: i32,
    has_label: bool,
    pub(crate) current: std::cell::Cell<u64>,
}

impl SessionHandle {
    /// Opens datasets, allocates the slot ring, and spawns `N` worker
    /// threads.
    ///
    /// Validates configuration before any backend call; the first
    /// violation is reported as `ChipError::Configuration`.
    pub fn start(params: StartParams) -> Result<Self, ChipError> {
        validate(&params)?;

        let imagery0 = DatasetHandle::open_read_only(&params.imagery_path)?;
        let (width, height) = imagery0.raster_size();

        let mut imagery_datasets = Vec::with_capacity(params.n);
        imagery_datasets.push(imagery0);
        for _ in 1..params.n {
            imagery_datasets.push(DatasetHandle::open_read_only(&params.imagery_path)?);
        }

        let has_label = params.label_path.is_some();
        let mut label_datasets: Vec<Option<DatasetHandle>> = Vec::with_capacity(params.n);
        for _ in 0..params.n {
            let ds = match &params.label_path {
                Some(path) => Some(DatasetHandle::open_read_only(path)?),
                None => None,
            };
            label_datasets.push(ds);
        }

        let mut slots = Vec::with_capacity(params.n);
        for (id, imagery_dataset) in imagery_datasets.into_iter().enumerate() {
            let imagery_first_band = imagery_dataset.band(1)?;
            let owned = WorkerOwned {
                id: id as u64,
                imagery_dataset,
                imagery_first_band,
                label_dataset: label_datasets[id].take(),
                bands: params.bands.clone(),
            };
            slots.push(UnsafeCell::new(owned));
        }
        let resources = Arc::new(WorkerResources { slots });

        let imagery_len = params.imagery_dt.word_size() * params.bands.len() * (params.window_size as usize).pow(2);
        let label_len = has_label.then(|| params.label_dt.word_size() * (params.window_size as usize).pow(2));
        let ring = Arc::new(SlotRing::new(params.m, imagery_len, label_len));

        // Set mode before spawning so workers observe the intended mode on entry.
        let mode = Arc::new(AtomicU8::new(params.mode.as_u8()));

        let shared = Arc::new(WorkerShared {
            ring: Arc::clone(&ring),
            mode: Arc::clone(&mode),
            window_size: params.window_size,
            width,
            height,
            band_count: params.bands.len() as i32,
            bands: params.bands.clone(),
            imagery_dt: params.imagery_dt,
            label_dt: params.label_dt,
            tuning: params.tuning,
        });

        let mut threads = Vec::with_capacity(params.n);
        for id in 0..params.n {
            let shared = Arc::clone(&shared);
            let resources = Arc::clone(&resources);
            let handle = std::thread::Builder::new()
                .name(format!("reader-{id}"))
                .spawn(move || {
                    // Check before acquiring `&mut` on this slot, not after: in
                    // Inference mode this must return without ever touching
                    // `resources`, so a concurrent `get_inference_chip` call
                    // taking `&WorkerOwned` on slot 0 never aliases a `&mut`
                    // held by this thread.
                    if !worker::current_mode(&shared.mode).is_producing() {
                        return;
                    }
                    let owned = resources.get_mut(id);
                    worker::run(&shared, owned);
                })
                .map_err(|e| {
                    ChipError::Configuration(format!("failed to spawn reader-{id}: {e}"))
                })?;
            threads.push(handle);
        }

        log::info!(
            "session started: N={} M={} mode={:?} window_size={} bands={:?} raster={width}x{height}",
            params.n, params.m, params.mode, params.window_size, shared.bands
        );

        Ok(Self {
            shared,
            resources,
            threads,
            width,
            height,
            has_label,
            current: std::cell::Cell::new(0),
        })
    }

    /// Raster width in pixels, captured during `start`.
    pub fn get_width(&self) -> i32 {
        self.width
    }

    /// Raster height in pixels, captured during `start`.
    pub fn get_height(&self) -> i32 {
        self.height
    }

    pub fn has_label(&self) -> bool {
        self.has_label
    }

    /// Worker 0's resources, used by `get_inference_chip`.
    pub(crate) fn worker_zero(&self) -> &WorkerOwned {
        self.resources.get(0)
    }

    /// Sets `mode = Stopped`, joins all workers, closes all dataset handles,
    /// and frees all slot buffers. Consuming `self` makes
    /// "no direct transitions between modes" and "no calls after stop" a
    /// compile-time property.
    pub fn stop(mut self) {
        self.shared.mode.store(Mode::Stopped.as_u8(), Ordering::Release);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        log::info!("session stopped");
        // `self.resources` drops here, closing every dataset handle; `self.shared`
        // (and the `SlotRing` it owns) drops here, freeing every slot buffer.
    }
}

fn validate(params: &StartParams) -> Result<(), ChipError> {
    if params.n == 0 {
        return Err(ChipError::Configuration("N must be > 0".into()));
    }
    if params.m == 0 {
        return Err(ChipError::Configuration("M must be > 0".into()));
    }
    if params.window_size <= 0 {
        return Err(ChipError::Configuration("window_size must be > 0".into()));
    }
    if params.bands.is_empty() {
        return Err(ChipError::Configuration("bands must not be empty".into()));
    }
    if params.mode == Mode::Stopped {
        return Err(ChipError::Configuration(
            "start cannot be called with mode = Stopped".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Builds a minimal single-slot session directly (no worker threads),
    /// to exercise `get_next`'s scan logic in isolation.
    fn bare_session(mode: Mode) -> SessionHandle {
        let imagery = DatasetHandle::create_in_memory(8, 8).expect("in-memory dataset");
        let imagery_first_band = imagery.band(1).expect("band 1");
        let owned = WorkerOwned {
            id: 0,
            imagery_dataset: imagery,
            imagery_first_band,
            label_dataset: None,
            bands: vec![1],
        };
        let resources = Arc::new(WorkerResources {
            slots: vec![UnsafeCell::new(owned)],
        });

        let ring = Arc::new(SlotRing::new(1, 8 * 8, None));
        let mode = Arc::new(AtomicU8::new(mode.as_u8()));
        let shared = Arc::new(WorkerShared {
            ring,
            mode,
            window_size: 8,
            width: 8,
            height: 8,
            band_count: 1,
            bands: vec![1],
            imagery_dt: DataType::Byte,
            label_dt: DataType::Byte,
            tuning: TuningConfig::default(),
        });

        SessionHandle {
            shared,
            resources,
            threads: Vec::new(),
            width: 8,
            height: 8,
            has_label: false,
            current: Cell::new(0),
        }
    }

    /// `get_next` must not spin forever once it observes the session has
    /// been driven to `Stopped`; it reports `ChipError::SessionStopped`
    /// instead (no worker thread will ever fill the one slot here, so the
    /// scan would otherwise never terminate).
    #[test]
    fn get_next_reports_session_stopped_once_mode_flips() {
        let session = bare_session(Mode::Stopped);

        let mut buf = vec![0u8; 8 * 8];
        let err = session.get_next(&mut buf, None).unwrap_err();
        assert!(matches!(err, ChipError::SessionStopped));
    }
}
