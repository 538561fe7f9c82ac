//! Error types for NIfTI reading and writing.

use thiserror::Error;

/// Errors raised while decoding or encoding NIfTI-1 images.
#[derive(Error, Debug)]
pub enum NiftiError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tried to read past the end of the buffer.
    #[error("buffer underflow at offset {pos}: need {need} bytes, {have} remaining")]
    BufferUnderflow {
        /// Cursor position
        pos: usize,
        /// Bytes requested
        need: usize,
        /// Bytes left
        have: usize,
    },

    /// Malformed header or payload.
    #[error("invalid NIfTI: {0}")]
    Format(String),

    /// Well-formed but outside what this reader handles (NIfTI-2, complex voxels, ...).
    #[error("unsupported NIfTI feature: {0}")]
    Unsupported(String),

    /// gzip stream could not be inflated.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Image dimensions do not agree with an operation.
    #[error("shape mismatch: {0}")]
    Shape(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, NiftiError>;

impl From<NiftiError> for sl_core::Error {
    fn from(e: NiftiError) -> Self {
        match e {
            NiftiError::Io(io) => sl_core::Error::Io(io),
            other => sl_core::Error::Image(other.to_string()),
        }
    }
}
