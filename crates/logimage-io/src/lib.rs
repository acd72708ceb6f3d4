//! # logimage-io
//!
//! Reading and writing of DPX (SMPTE 268M) and Cineon motion-picture
//! image files.
//!
//! Both formats store "log images": one or more bit-packed elements with a
//! colorimetric transfer, most famously the 10-bit printing-density
//! encoding of film scans. This crate decodes any supported layout into
//! normalized RGBA floats and encodes RGBA back into the classic layouts.
//!
//! # Quick Start
//!
//! ```ignore
//! use logimage_io::{open, create, CreateOptions, SourceFormat};
//!
//! // Read any supported file (format auto-detected by magic number).
//! let mut image = open("scan.0001.dpx")?;
//! let (width, height, channels) = image.size();
//! let rgba = image.read_rgba(true)?; // linear RGB out
//!
//! // Write a 10-bit log DPX.
//! let mut out = create(
//!     "out.0001.dpx",
//!     &CreateOptions {
//!         format: SourceFormat::Dpx,
//!         width,
//!         height,
//!         bits_per_sample: 10,
//!         logarithmic: true,
//!         ..CreateOptions::default()
//!     },
//! )?;
//! out.write_rgba(&rgba, true)?;
//! ```
//!
//! # Supported Layouts
//!
//! | Direction | Bit depths | Packing | Descriptors |
//! |-----------|------------|---------|-------------|
//! | Read | 1, 8, 10, 12, 16 | tight and filled | RGB(A), ABGR, Y(A), CbYCr variants, planar primaries |
//! | Write | 8, 10, 12, 16 | filled method A | RGB, RGBA |
//!
//! Depth and composite-video elements are skipped on read; YCbCr cannot be
//! written. Files are uncompressed in both formats.
//!
//! # Diagnostics
//!
//! All logging goes through [`tracing`]; install a subscriber to see
//! per-file debug output. There is no global verbosity state.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cineon;
mod codec;
mod convert;
mod dpx;
mod image;
mod merge;

pub mod detect;
pub mod source;

pub use detect::{is_cineon, is_dpx, Format};
pub use image::{CreateOptions, LogImage};

// The data model is part of this crate's API surface.
pub use logimage_core::{
    CodecError, Descriptor, LogElement, Packing, Result, SourceFormat, Transfer,
};

use source::{ReadSeek, WriteSeek};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read};
use std::path::Path;

/// Opens a log image file, detecting DPX vs Cineon by magic number.
///
/// # Errors
///
/// [`CodecError::UnknownFormat`] when the magic matches neither format,
/// plus the usual I/O and header validation failures.
pub fn open<P: AsRef<Path>>(path: P) -> Result<LogImage> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);

    let mut head = [0u8; 4];
    match reader.read_exact(&mut head) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(CodecError::UnknownFormat)
        }
        Err(e) => return Err(e.into()),
    }
    open_stream(Format::from_bytes(&head), Box::new(reader))
}

/// Opens a log image from a complete in-memory file.
///
/// The buffer is copied so the handle owns its source, mirroring the
/// file-backed case.
pub fn open_from_memory(data: &[u8]) -> Result<LogImage> {
    let format = Format::from_bytes(data);
    open_stream(format, Box::new(Cursor::new(data.to_vec())))
}

fn open_stream(format: Format, reader: Box<dyn ReadSeek + Send>) -> Result<LogImage> {
    match format {
        Format::Dpx => dpx::open(reader),
        Format::Cineon => cineon::open(reader),
        Format::Unknown => Err(CodecError::UnknownFormat),
    }
}

/// Creates a new log image file and returns a write-mode handle.
///
/// The header is written immediately; pixel data follows through
/// [`LogImage::write_rgba`]. Cineon output ignores the reference, gamma,
/// alpha and logarithmic options (its semantics are fixed).
pub fn create<P: AsRef<Path>>(path: P, options: &CreateOptions) -> Result<LogImage> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("untitled")
        .to_string();
    let writer: Box<dyn WriteSeek + Send> = Box::new(BufWriter::new(File::create(path)?));

    match options.format {
        SourceFormat::Dpx => dpx::create(writer, &file_name, options),
        SourceFormat::Cineon => cineon::create(writer, &file_name, options),
    }
}
