//! Error types for AVI export

use crate::chunks::FourCC;
use crate::encode::FieldType;
use crate::types::StreamType;
use thiserror::Error;

/// Result type for AVI operations
pub type Result<T> = std::result::Result<T, AviError>;

/// Errors that can occur while assembling or writing an AVI file
#[derive(Error, Debug)]
pub enum AviError {
    /// IO error while writing or seeking the destination
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-positive frame dimensions
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    /// Zero frames per second
    #[error("Invalid frame rate: {0} fps")]
    InvalidFrameRate(u32),

    /// Data added to a stream that was never initialized
    #[error("{0} stream used before initialization")]
    UninitializedStream(StreamType),

    /// A header field without a value at render time
    #[error("Incomplete header: {record}.{field} is not set")]
    IncompleteHeader {
        record: &'static str,
        field: &'static str,
    },

    /// A header field value that does not fit its declared width
    #[error("Field {field} value {value} does not fit in {field_type}")]
    FieldOverflow {
        field: &'static str,
        value: i64,
        field_type: FieldType,
    },

    /// Palette data with the wrong shape
    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    /// A tag that is not exactly four bytes
    #[error("Invalid FourCC: {0:?}")]
    InvalidFourCC(String),

    /// RIFF root node that is not a list
    #[error("RIFF form {0} is not a list")]
    NotAList(FourCC),
}
