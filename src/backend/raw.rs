//! Raw GDAL constants and helpers not exposed by `gdal-sys` as typed items.
//!
//! `gdal-sys` binds the C API 1:1; the coverage-status bitmask and the
//! last-error accessor are plain `#define`s / free functions in `gdal.h`
//! that we mirror here the same way `communications::ioctl` mirrors the
//! kernel driver's raw control-code constants.

use std::ffi::CStr;
use std::os::raw::c_char;

/// `GDAL_DATA_COVERAGE_STATUS_IRREGULAR` (gdal.h).
pub const DATA_COVERAGE_STATUS_IRREGULAR: i32 = 0x01;
/// `GDAL_DATA_COVERAGE_STATUS_EMPTY` (gdal.h).
pub const DATA_COVERAGE_STATUS_EMPTY: i32 = 0x02;
/// `GDAL_DATA_COVERAGE_STATUS_DATA` (gdal.h).
pub const DATA_COVERAGE_STATUS_DATA: i32 = 0x04;

/// Reads `CPLGetLastErrorMsg()` into an owned `String`.
///
/// Returns an empty string if GDAL has no error message recorded, which can
/// happen for non-CPL failures (e.g. a null dataset handle).
pub fn last_error_message() -> String {
    unsafe {
        let ptr: *const c_char = gdal_sys::CPLGetLastErrorMsg();
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}

/// `CPLGetLastErrorNo()`.
pub fn last_error_no() -> i32 {
    unsafe { gdal_sys::CPLGetLastErrorNo() }
}
