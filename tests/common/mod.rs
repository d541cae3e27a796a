//! Shared fixture builder for the scenario tests in `tests/scenarios.rs`:
//! a synthetic single-band Byte GeoTIFF built at test time with raw
//! `gdal-sys` calls, the same way the crate's own backend adapter talks
//! to GDAL.

use std::ffi::CString;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::sync::Once;

static GDAL_INIT: Once = Once::new();

pub fn ensure_gdal_registered() {
    GDAL_INIT.call_once(chips::init);
}

/// Pixel formula used for the imagery fixture: `(x + y*width) mod 256`.
pub fn imagery_pixel(x: i32, y: i32, width: i32) -> u8 {
    ((x as i64 + y as i64 * width as i64).rem_euclid(256)) as u8
}

/// A distinct formula for the label fixture, used to check the imagery and
/// label round-trip independently (invariant 7).
pub fn label_pixel(x: i32, y: i32) -> u8 {
    ((x as i64 * 2 + y as i64).rem_euclid(256)) as u8
}

/// Writes a `width x height` single-band Byte GeoTIFF at `path`, filled via
/// `pixel_fn(x, y)`.
pub fn write_byte_geotiff(path: &Path, width: i32, height: i32, pixel_fn: impl Fn(i32, i32) -> u8) {
    ensure_gdal_registered();

    let driver_name = CString::new("GTiff").unwrap();
    let driver = unsafe { gdal_sys::GDALGetDriverByName(driver_name.as_ptr()) };
    assert!(!driver.is_null(), "GTiff driver not registered");

    let c_path = CString::new(path.to_str().expect("path must be valid UTF-8")).unwrap();
    let dataset = unsafe {
        gdal_sys::GDALCreate(
            driver,
            c_path.as_ptr(),
            width,
            height,
            1,
            gdal_sys::GDALDataType::GDT_Byte,
            std::ptr::null_mut(),
        )
    };
    assert!(!dataset.is_null(), "failed to create {}", path.display());

    let mut buf = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            buf[(y * width + x) as usize] = pixel_fn(x, y);
        }
    }

    let band = unsafe { gdal_sys::GDALGetRasterBand(dataset, 1) };
    let err = unsafe {
        gdal_sys::GDALRasterIO(
            band,
            gdal_sys::GDALRWFlag::GF_Write,
            0,
            0,
            width,
            height,
            buf.as_mut_ptr() as *mut c_void,
            width,
            height,
            gdal_sys::GDALDataType::GDT_Byte,
            0,
            0,
        )
    };
    assert_eq!(err, gdal_sys::CPLErr::CE_None, "failed to write pixels");

    unsafe { gdal_sys::GDALClose(dataset) };
}

/// Chip-grid side length used by the partition-sampling scenarios: with
/// `window_size = 10` this gives a 70x70 raster tiled into a 7x7 grid of
/// chips, matching the `mod 7` partition rule exactly.
pub const GRID_SIDE: i32 = 7;
pub const BLOCK_WINDOW: i32 = 10;

/// Encodes chip-grid coordinates `(cx, cy)` into a single byte, used to make
/// the partition scenarios decodable without re-deriving GDAL's sampling.
pub fn encode_cell(cx: i32, cy: i32) -> u8 {
    (cy * GRID_SIDE + cx) as u8
}

pub fn decode_cell(value: u8) -> (i32, i32) {
    let v = value as i32;
    (v % GRID_SIDE, v / GRID_SIDE)
}

/// Writes a raster tiled into `GRID_SIDE x GRID_SIDE` blocks of
/// `BLOCK_WINDOW x BLOCK_WINDOW` pixels, each block filled with
/// `encode_cell(cx, cy)`. Reading any one full window back yields a single
/// uniform byte that `decode_cell` inverts.
pub fn write_block_coded_geotiff(path: &Path) {
    let side = GRID_SIDE * BLOCK_WINDOW;
    write_byte_geotiff(path, side, side, |x, y| {
        encode_cell(x / BLOCK_WINDOW, y / BLOCK_WINDOW)
    });
}

/// Builds the 210x210 imagery (+ optional label) fixture used throughout
/// the scenario tests, inside `dir`.
pub fn synthetic_scene(dir: &Path, with_label: bool) -> (PathBuf, Option<PathBuf>) {
    const WIDTH: i32 = 210;
    const HEIGHT: i32 = 210;

    let imagery_path = dir.join("imagery.tif");
    write_byte_geotiff(&imagery_path, WIDTH, HEIGHT, |x, y| imagery_pixel(x, y, WIDTH));

    let label_path = with_label.then(|| {
        let path = dir.join("label.tif");
        write_byte_geotiff(&path, WIDTH, HEIGHT, |x, y| label_pixel(x, y));
        path
    });

    (imagery_path, label_path)
}

/// Creates a tiled, sparse GeoTIFF with no pixel data ever written, so every
/// block is missing on disk and any coverage query over it reports the
/// region as entirely empty.
pub fn write_all_empty_sparse_geotiff(path: &Path, width: i32, height: i32) {
    ensure_gdal_registered();

    let driver_name = CString::new("GTiff").unwrap();
    let driver = unsafe { gdal_sys::GDALGetDriverByName(driver_name.as_ptr()) };
    assert!(!driver.is_null(), "GTiff driver not registered");

    let c_path = CString::new(path.to_str().expect("path must be valid UTF-8")).unwrap();
    let sparse_opt = CString::new("SPARSE_OK=YES").unwrap();
    let tiled_opt = CString::new("TILED=YES").unwrap();
    let mut options: Vec<*mut std::os::raw::c_char> = vec![
        sparse_opt.as_ptr() as *mut std::os::raw::c_char,
        tiled_opt.as_ptr() as *mut std::os::raw::c_char,
        std::ptr::null_mut(),
    ];

    let dataset = unsafe {
        gdal_sys::GDALCreate(
            driver,
            c_path.as_ptr(),
            width,
            height,
            1,
            gdal_sys::GDALDataType::GDT_Byte,
            options.as_mut_ptr(),
        )
    };
    assert!(!dataset.is_null(), "failed to create sparse {}", path.display());

    // No GDALRasterIO write call: every tile stays unwritten on disk, so
    // GDALGetDataCoverageStatus reports the whole raster as empty.
    unsafe { gdal_sys::GDALClose(dataset) };
}
