//! Session-wide value types: pixel data types, operating mode, and the
//! band list. These are written once by `start` and read-only thereafter,
//! so they need no synchronization once captured in `Session`.

use crate::error::ChipError;
use gdal_sys::GDALDataType;

/// Supported pixel data types, each mapped to its GDAL type code and byte width.
///
/// Any GDAL type not listed here is a configuration error at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

impl DataType {
    /// Byte width of one sample of this type.
    pub fn word_size(self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
            DataType::CInt16 => 4,
            DataType::CInt32 => 8,
            DataType::CFloat32 => 8,
            DataType::CFloat64 => 16,
        }
    }

    /// The raw GDAL data type code used in `GDALDatasetRasterIO` calls.
    pub(crate) fn to_gdal(self) -> GDALDataType::Type {
        match self {
            DataType::Byte => GDALDataType::GDT_Byte,
            DataType::UInt16 => GDALDataType::GDT_UInt16,
            DataType::Int16 => GDALDataType::GDT_Int16,
            DataType::UInt32 => GDALDataType::GDT_UInt32,
            DataType::Int32 => GDALDataType::GDT_Int32,
            DataType::Float32 => GDALDataType::GDT_Float32,
            DataType::Float64 => GDALDataType::GDT_Float64,
            DataType::CInt16 => GDALDataType::GDT_CInt16,
            DataType::CInt32 => GDALDataType::GDT_CInt32,
            DataType::CFloat32 => GDALDataType::GDT_CFloat32,
            DataType::CFloat64 => GDALDataType::GDT_CFloat64,
        }
    }

    /// Maps a raw GDAL type code to a `DataType`, rejecting anything
    /// unsupported. Used by `StartParams::from_raw_codes` for hosts that
    /// speak raw integer codes instead of the typed Rust API.
    pub fn from_gdal_code(code: i32) -> Result<Self, ChipError> {
        match code as u32 {
            x if x == GDALDataType::GDT_Byte => Ok(DataType::Byte),
            x if x == GDALDataType::GDT_UInt16 => Ok(DataType::UInt16),
            x if x == GDALDataType::GDT_Int16 => Ok(DataType::Int16),
            x if x == GDALDataType::GDT_UInt32 => Ok(DataType::UInt32),
            x if x == GDALDataType::GDT_Int32 => Ok(DataType::Int32),
            x if x == GDALDataType::GDT_Float32 => Ok(DataType::Float32),
            x if x == GDALDataType::GDT_Float64 => Ok(DataType::Float64),
            x if x == GDALDataType::GDT_CInt16 => Ok(DataType::CInt16),
            x if x == GDALDataType::GDT_CInt32 => Ok(DataType::CInt32),
            x if x == GDALDataType::GDT_CFloat32 => Ok(DataType::CFloat32),
            x if x == GDALDataType::GDT_CFloat64 => Ok(DataType::CFloat64),
            other => Err(ChipError::Configuration(format!(
                "unsupported GDAL data type code {other}"
            ))),
        }
    }
}

/// Session operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Stopped = 0,
    Training = 1,
    Evaluation = 2,
    Inference = 3,
}

impl Mode {
    /// Maps a raw mode code (0-3) to a `Mode`. Used by
    /// `StartParams::from_raw_codes` for hosts that speak raw integer codes
    /// instead of the typed Rust API.
    pub fn from_code(code: i32) -> Result<Self, ChipError> {
        match code {
            0 => Ok(Mode::Stopped),
            1 => Ok(Mode::Training),
            2 => Ok(Mode::Evaluation),
            3 => Ok(Mode::Inference),
            other => Err(ChipError::Configuration(format!(
                "invalid mode code {other}; expected 0-3"
            ))),
        }
    }

    /// True while workers should be sampling and publishing chips.
    pub fn is_producing(self) -> bool {
        matches!(self, Mode::Training | Mode::Evaluation)
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Mode::Training,
            2 => Mode::Evaluation,
            3 => Mode::Inference,
            _ => Mode::Stopped,
        }
    }
}
