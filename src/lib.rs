//! Concurrent, bounded-buffer raster chip reader for ML training pipelines.
//!
//! A pool of reader worker threads samples spatial windows ("chips") out of
//! an imagery raster (and, optionally, a co-registered label raster),
//! filling a fixed-size ring of slot buffers. A single foreground consumer
//! drains one chip at a time via [`SessionHandle::get_next`], hiding raster
//! I/O latency behind the worker pool. A separate, synchronous
//! [`SessionHandle::get_inference_chip`] path serves single-chip reads
//! outside of training.
//!
//! ```no_run
//! # use std::path::PathBuf;
//! # use chips::{init, deinit, DataType, Mode, SessionHandle, StartParams, TuningConfig};
//! init();
//! let session = SessionHandle::start(StartParams {
//!     n: 4,
//!     m: 8,
//!     imagery_path: PathBuf::from("scene.tif"),
//!     label_path: None,
//!     imagery_dt: DataType::Byte,
//!     label_dt: DataType::Byte,
//!     mode: Mode::Training,
//!     window_size: 256,
//!     bands: vec![1, 2, 3],
//!     tuning: TuningConfig::default(),
//! }).expect("start session");
//!
//! let mut imagery = vec![0u8; 3 * 256 * 256];
//! session.get_next(&mut imagery, None).expect("get_next never fails on a live session");
//!
//! session.stop();
//! deinit();
//! ```

mod backend;
mod config;
mod consumer;
mod error;
mod logging;
mod ring;
mod session;
mod types;
mod worker;

pub use config::TuningConfig;
pub use error::{ChipError, GdalError};
pub use logging::init_logger;
pub use session::{SessionHandle, StartParams};
pub use types::{DataType, Mode};

/// One-time process initialization of the raster backend.
///
/// Must be called once before the first `SessionHandle::start`. Safe to
/// call more than once; GDAL's driver registration is itself idempotent.
pub fn init() {
    backend::global_register();
}

/// Process teardown of the raster backend. Call after the last session has
/// been stopped and no further sessions will start.
pub fn deinit() {
    backend::global_teardown();
}
