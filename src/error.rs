//! Error types for the chip reader.
//!
//! Configuration and backend-open failures are fatal at `start`.
//! Backend-read failures inside worker loops are handled locally (resample
//! and retry) and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// A GDAL `CPLErr` code paired with the driver's last error message.
#[derive(Debug, Error)]
#[error("GDAL error {code}: {message}")]
pub struct GdalError {
    pub code: i32,
    pub message: String,
}

impl GdalError {
    /// Captures the current GDAL error state (`CPLGetLastErrorMsg`) under the given code.
    pub(crate) fn capture(code: i32) -> Self {
        let message = crate::backend::raw::last_error_message();
        Self { code, message }
    }
}

/// Errors that can surface from the public API.
#[derive(Debug, Error)]
pub enum ChipError {
    /// Bad mode code, zero `window_size`, unsupported data type, `N=0`, `M=0`, ...
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure to open an imagery or label dataset during `start`.
    #[error("failed to open raster dataset `{path}`: {source}")]
    BackendOpen {
        path: PathBuf,
        #[source]
        source: GdalError,
    },

    /// A fatal (caller-visible) backend read failure. Worker-loop reads never
    /// produce this variant; they resample and retry silently instead.
    #[error("raster read failed: {source}")]
    BackendRead {
        #[source]
        source: GdalError,
    },

    /// A caller-supplied buffer did not match the session's fixed slot layout.
    #[error("buffer size mismatch: expected {expected} bytes, got {got}")]
    BufferSize { expected: usize, got: usize },

    /// `get_next` observed the session transition to `Stopped` while scanning
    /// for a ready slot.
    #[error("session stopped while waiting for the next chip")]
    SessionStopped,
}
