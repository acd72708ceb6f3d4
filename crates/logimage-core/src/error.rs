//! Error types shared across the logimage workspace.
//!
//! One enum covers the whole pipeline: byte-level I/O, wire-format parsing,
//! bit-packed decoding and colorimetric conversion. Allocation failures are
//! not modeled; buffer allocation follows normal Rust semantics.

use thiserror::Error;

/// Result type alias using [`CodecError`] as the error type.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while reading or writing a DPX/Cineon image.
///
/// # Categories
///
/// - **I/O**: [`Io`](CodecError::Io), [`Truncated`](CodecError::Truncated)
/// - **Format**: [`UnknownFormat`](CodecError::UnknownFormat),
///   [`InvalidHeader`](CodecError::InvalidHeader),
///   [`UnsupportedBitDepth`](CodecError::UnsupportedBitDepth),
///   [`UnsupportedPacking`](CodecError::UnsupportedPacking),
///   [`UnsupportedDescriptor`](CodecError::UnsupportedDescriptor),
///   [`UnknownTransfer`](CodecError::UnknownTransfer)
/// - **Argument**: [`InvalidDimensions`](CodecError::InvalidDimensions),
///   [`BufferSize`](CodecError::BufferSize),
///   [`NotReadable`](CodecError::NotReadable) / [`NotWritable`](CodecError::NotWritable)
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying file or stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before the expected image or header data.
    #[error("truncated file: unexpected end of data")]
    Truncated,

    /// The first four bytes match neither DPX nor Cineon magic.
    #[error("unknown file format: not DPX or Cineon")]
    UnknownFormat,

    /// A header field carries a value the format does not allow.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Sample bit depth outside the supported set (1, 8, 10, 12, 16),
    /// or a depth the writer does not emit.
    #[error("unsupported bit depth: {bits}")]
    UnsupportedBitDepth {
        /// Bits per sample found in the element header.
        bits: u32,
    },

    /// A (bit depth, packing) combination the codec does not handle.
    #[error("unsupported packing {packing} for {bits}-bit samples")]
    UnsupportedPacking {
        /// Bits per sample of the element.
        bits: u32,
        /// Raw packing code.
        packing: u16,
    },

    /// Element descriptor not supported for the requested direction.
    #[error("unsupported descriptor: {0}")]
    UnsupportedDescriptor(&'static str),

    /// Transfer characteristic code with no defined conversion.
    #[error("unknown transfer characteristic: {code}")]
    UnknownTransfer {
        /// Raw transfer code from the element header.
        code: u8,
    },

    /// Image dimensions are zero, overflow, or break a format invariant.
    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Which invariant failed.
        reason: String,
    },

    /// Caller-provided pixel buffer has the wrong length.
    #[error("pixel buffer holds {actual} floats, expected {expected}")]
    BufferSize {
        /// Required number of floats.
        expected: usize,
        /// Length of the buffer that was passed in.
        actual: usize,
    },

    /// The handle was created for writing and cannot decode.
    #[error("image was opened for writing, not reading")]
    NotReadable,

    /// The handle was opened for reading and cannot encode.
    #[error("image was opened for reading, not writing")]
    NotWritable,
}

impl CodecError {
    /// Creates an [`CodecError::InvalidHeader`] error.
    #[inline]
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Creates an [`CodecError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an I/O-level error (including truncation).
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Truncated)
    }

    /// Returns `true` if the file was structurally valid but uses a feature
    /// this codec does not implement.
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBitDepth { .. }
                | Self::UnsupportedPacking { .. }
                | Self::UnsupportedDescriptor(_)
                | Self::UnknownTransfer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CodecError = io_err.into();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_unsupported_classification() {
        assert!(CodecError::UnsupportedBitDepth { bits: 24 }.is_unsupported());
        assert!(CodecError::UnknownTransfer { code: 12 }.is_unsupported());
        assert!(!CodecError::Truncated.is_unsupported());
    }

    #[test]
    fn test_messages_carry_values() {
        let err = CodecError::UnsupportedPacking { bits: 10, packing: 3 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('3'));

        let err = CodecError::invalid_dimensions(3, 2, "width must be even");
        assert!(err.to_string().contains("3x2"));
    }
}
