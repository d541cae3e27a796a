//! Thin, typed wrapper over the GDAL calls the core needs.
//!
//! Each `DatasetHandle` owns exactly one `GDALDatasetH`. GDAL does not
//! guarantee thread-safety on a single handle, so handles are never shared
//! between threads; they are moved into the worker (or the inference path)
//! that owns them for the session's lifetime and closed on `Drop`.

use std::ffi::CString;
use std::os::raw::c_void;
use std::path::Path;
use std::ptr;

use gdal_sys::{GDALAccess, GDALDataType, GDALRWFlag};

use crate::backend::raw::{self, DATA_COVERAGE_STATUS_EMPTY};
use crate::error::{ChipError, GdalError};
use crate::types::DataType;

/// An open, read-only raster dataset.
///
/// Exclusively owned by one worker thread (or by the inference path, which
/// never runs concurrently with workers). Not `Sync`; `Send` so it can be
/// handed to the thread that will own it.
pub struct DatasetHandle {
    raw: gdal_sys::GDALDatasetH,
}

unsafe impl Send for DatasetHandle {}

impl DatasetHandle {
    /// Opens `path` read-only. Fatal at `start` on failure.
    pub fn open_read_only(path: &Path) -> Result<Self, ChipError> {
        let c_path = CString::new(path.as_os_str().to_string_lossy().into_owned())
            .map_err(|_| ChipError::Configuration(format!("path is not representable as a C string: {}", path.display())))?;

        let raw = unsafe { gdal_sys::GDALOpen(c_path.as_ptr(), GDALAccess::GA_ReadOnly) };
        if raw.is_null() {
            return Err(ChipError::BackendOpen {
                path: path.to_path_buf(),
                source: GdalError::capture(raw::last_error_no()),
            });
        }
        Ok(Self { raw })
    }

    /// Creates a throwaway single-band Byte dataset via GDAL's in-memory
    /// `MEM` driver, for unit tests that need a real `DatasetHandle` without
    /// touching disk.
    #[cfg(test)]
    pub(crate) fn create_in_memory(width: i32, height: i32) -> Result<Self, ChipError> {
        global_register();

        let driver_name = CString::new("MEM").unwrap();
        let driver = unsafe { gdal_sys::GDALGetDriverByName(driver_name.as_ptr()) };
        if driver.is_null() {
            return Err(ChipError::Configuration("MEM driver not registered".into()));
        }

        let empty_path = CString::new("").unwrap();
        let raw = unsafe {
            gdal_sys::GDALCreate(
                driver,
                empty_path.as_ptr(),
                width,
                height,
                1,
                GDALDataType::GDT_Byte,
                ptr::null_mut(),
            )
        };
        if raw.is_null() {
            return Err(ChipError::BackendOpen {
                path: Path::new("<in-memory>").to_path_buf(),
                source: GdalError::capture(raw::last_error_no()),
            });
        }
        Ok(Self { raw })
    }

    /// `(width, height)` in pixels.
    pub fn raster_size(&self) -> (i32, i32) {
        unsafe {
            (
                gdal_sys::GDALGetRasterXSize(self.raw),
                gdal_sys::GDALGetRasterYSize(self.raw),
            )
        }
    }

    /// Fetches a 1-based band handle. The returned handle is valid only as
    /// long as `self` is alive; callers (workers) hold both together.
    pub fn band(&self, index: i32) -> Result<BandHandle, ChipError> {
        let raw = unsafe { gdal_sys::GDALGetRasterBand(self.raw, index) };
        if raw.is_null() {
            return Err(ChipError::Configuration(format!(
                "dataset has no band {index}"
            )));
        }
        Ok(BandHandle { raw })
    }

    /// Reads a `width x height` pixel window at `(x, y)` for the given bands
    /// and data type into `dst`, tightly packed, plane-major/row-major.
    /// `bands.is_empty()` reads all bands.
    ///
    /// This is the path used for both imagery and label reads; the caller
    /// picks `bands` accordingly (`&[]` for "all bands" semantics is not
    /// used here — both imagery and label reads always pass an explicit
    /// band list).
    pub fn read_window(
        &self,
        dt: DataType,
        bands: &mut [i32],
        x: i32,
        y: i32,
        window_size: i32,
        dst: &mut [u8],
    ) -> Result<(), ChipError> {
        let band_count = bands.len() as i32;
        let err = unsafe {
            gdal_sys::GDALDatasetRasterIO(
                self.raw,
                GDALRWFlag::GF_Read,
                x,
                y,
                window_size,
                window_size,
                dst.as_mut_ptr() as *mut c_void,
                window_size,
                window_size,
                dt.to_gdal(),
                band_count,
                bands.as_mut_ptr(),
                0,
                0,
                0,
            )
        };
        if err != gdal_sys::CPLErr::CE_None {
            return Err(ChipError::BackendRead {
                source: GdalError::capture(raw::last_error_no()),
            });
        }
        Ok(())
    }
}

impl Drop for DatasetHandle {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe {
                gdal_sys::GDALClose(self.raw);
            }
        }
    }
}

/// A raster band handle, used only for coverage queries. Coverage status
/// is queried on the imagery's first band only.
pub struct BandHandle {
    raw: gdal_sys::GDALRasterBandH,
}

unsafe impl Send for BandHandle {}

impl BandHandle {
    /// True iff the given pixel window reports as entirely empty (no data).
    pub fn window_is_empty(&self, x: i32, y: i32, window_size: i32) -> bool {
        let status = unsafe {
            gdal_sys::GDALGetDataCoverageStatus(
                self.raw,
                x,
                y,
                window_size,
                window_size,
                0,
                ptr::null_mut(),
            )
        };
        status & DATA_COVERAGE_STATUS_EMPTY != 0
    }
}

/// One-time process-wide driver registration.
pub fn global_register() {
    unsafe { gdal_sys::GDALAllRegister() };
}

/// Process teardown of the backend.
pub fn global_teardown() {
    unsafe { gdal_sys::GDALDestroyDriverManager() };
}

