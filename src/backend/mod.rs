//! Raster Backend Adapter: the only module that speaks GDAL directly.
//! Everything above this layer works with `DatasetHandle` and
//! `BandHandle`, never raw `gdal_sys` types.

pub mod dataset;
pub(crate) mod raw;

pub use dataset::{global_register, global_teardown, BandHandle, DatasetHandle};
