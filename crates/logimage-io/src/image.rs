//! The log image handle: an open DPX or Cineon file plus its global
//! parameters, with the decode and encode pipelines as methods.

use crate::codec::{self, PlaneGeometry};
use crate::convert::{self, ImageParams};
use crate::merge;
use crate::source::{ReadSeek, WriteSeek};
use logimage_core::{CodecError, LogElement, Result, SourceFormat};
use std::fmt;
use tracing::debug;

/// Byte stream backing a handle. Reading and writing are exclusive: a
/// handle is opened for one direction and stays that way.
pub(crate) enum Stream {
    Reader(Box<dyn ReadSeek + Send>),
    Writer(Box<dyn WriteSeek + Send>),
}

/// An open log image file.
///
/// Created by [`crate::open`], [`crate::open_from_memory`] or
/// [`crate::create`]. Owns the underlying byte stream; dropping the handle
/// releases it.
///
/// All pixel exchange happens as `width * height * 4` RGBA floats in
/// `[0, 1]`, regardless of how many channels the file stores.
pub struct LogImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) depth: u32,
    pub(crate) elements: Vec<LogElement>,
    pub(crate) is_msb: bool,
    pub(crate) src_format: SourceFormat,
    pub(crate) reference_black: f32,
    pub(crate) reference_white: f32,
    pub(crate) gamma: f32,
    pub(crate) stream: Stream,
}

/// Parameters for creating a new file.
///
/// `reference_white`, `reference_black` and `gamma` only apply to DPX;
/// Cineon has fixed film semantics and ignores them, along with
/// `logarithmic` and `has_alpha`.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Container to write.
    pub format: SourceFormat,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bits per sample: 8, 10, 12 or 16 for DPX, 10 for Cineon.
    pub bits_per_sample: u32,
    /// Encode with the printing-density transfer instead of linear.
    pub logarithmic: bool,
    /// Store an alpha channel (RGBA element instead of RGB).
    pub has_alpha: bool,
    /// Reference white code value.
    pub reference_white: f32,
    /// Reference black code value.
    pub reference_black: f32,
    /// Film gamma.
    pub gamma: f32,
    /// Creator string recorded in the file header.
    pub creator: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            format: SourceFormat::Dpx,
            width: 0,
            height: 0,
            bits_per_sample: 10,
            logarithmic: false,
            has_alpha: false,
            reference_white: 685.0,
            reference_black: 95.0,
            gamma: 1.7,
            creator: "logimage".to_string(),
        }
    }
}

impl LogImage {
    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total channel count across the file's decodable elements.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// `(width, height, depth)` in one call.
    #[inline]
    pub fn size(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    /// Container format this handle came from.
    #[inline]
    pub fn source_format(&self) -> SourceFormat {
        self.src_format
    }

    /// `true` when the file stores words most-significant-byte first.
    #[inline]
    pub fn is_msb(&self) -> bool {
        self.is_msb
    }

    /// Reference black code value used by the printing-density curve.
    #[inline]
    pub fn reference_black(&self) -> f32 {
        self.reference_black
    }

    /// Reference white code value used by the printing-density curve.
    #[inline]
    pub fn reference_white(&self) -> f32 {
        self.reference_white
    }

    /// Film gamma used by the printing-density curve.
    #[inline]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// The file's element descriptions, in declaration order.
    #[inline]
    pub fn elements(&self) -> &[LogElement] {
        &self.elements
    }

    fn image_params(&self) -> ImageParams {
        ImageParams {
            width: self.width,
            height: self.height,
            reference_black: self.reference_black,
            reference_white: self.reference_white,
            gamma: self.gamma,
        }
    }

    /// Decodes the whole image to `width * height * 4` RGBA floats.
    ///
    /// With `linear` set, the result is linear RGB; otherwise it is left in
    /// display (sRGB) space. Planar files are merged into one composite
    /// before colorimetric conversion; `Depth` and `Composite` elements are
    /// skipped.
    pub fn read_rgba(&mut self, linear: bool) -> Result<Vec<f32>> {
        let geom = PlaneGeometry {
            width: self.width,
            height: self.height,
            is_msb: self.is_msb,
            forward_ten_bit: self.depth == 1 && self.src_format == SourceFormat::Dpx,
        };
        let image = self.image_params();
        let loadable: Vec<LogElement> = self
            .elements
            .iter()
            .filter(|e| !e.descriptor.is_unsupported())
            .cloned()
            .collect();

        let stream = match &mut self.stream {
            Stream::Reader(r) => r.as_mut(),
            Stream::Writer(_) => return Err(CodecError::NotReadable),
        };

        match loadable.as_slice() {
            [] => Err(CodecError::UnsupportedDescriptor(
                "file contains no decodable elements",
            )),
            [element] => {
                let plane = codec::read_element(stream, geom, element)?;
                convert::element_to_rgba(&plane, &image, element, linear)
            }
            _ => {
                debug!(count = loadable.len(), "decoding planar elements");
                let mut planes = Vec::with_capacity(loadable.len());
                for element in &loadable {
                    planes.push(codec::read_element(stream, geom, element)?);
                }
                let (merged, composite) =
                    merge::merge_planes(self.width, self.height, &loadable, &planes)?;
                convert::element_to_rgba(&merged, &image, &composite, linear)
            }
        }
    }

    /// Encodes `width * height * 4` RGBA floats into the file.
    ///
    /// With `linear` set, the input is linear RGB and is converted to sRGB
    /// before the element transfer applies. The handle must come from
    /// [`crate::create`].
    pub fn write_rgba(&mut self, data: &[f32], linear: bool) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if data.len() != expected {
            return Err(CodecError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        let element = self.elements[0].clone();
        let image = self.image_params();
        let encoded = convert::rgba_to_element(data, &image, &element, linear)?;

        let geom = PlaneGeometry {
            width: self.width,
            height: self.height,
            is_msb: self.is_msb,
            forward_ten_bit: false,
        };
        let stream = match &mut self.stream {
            Stream::Writer(w) => w.as_mut(),
            Stream::Reader(_) => return Err(CodecError::NotWritable),
        };
        codec::write_element(stream, geom, &element, &encoded)?;
        stream.flush()?;
        Ok(())
    }
}

impl fmt::Debug for LogImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .field("elements", &self.elements)
            .field("is_msb", &self.is_msb)
            .field("src_format", &self.src_format)
            .field("reference_black", &self.reference_black)
            .field("reference_white", &self.reference_white)
            .field("gamma", &self.gamma)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logimage_core::{Descriptor, Packing, Transfer};
    use std::io::Cursor;

    fn reader_handle() -> LogImage {
        LogImage {
            width: 1,
            height: 1,
            depth: 3,
            elements: vec![LogElement {
                descriptor: Descriptor::Rgb,
                depth: 3,
                bits_per_sample: 16,
                packing: Packing::Packed,
                transfer: Transfer::Linear,
                data_offset: 0,
                ref_low_data: 0,
                ref_high_data: 65535,
                ref_low_quantity: 0.0,
                ref_high_quantity: 2.048,
            }],
            is_msb: true,
            src_format: SourceFormat::Dpx,
            reference_black: 95.0,
            reference_white: 685.0,
            gamma: 1.7,
            stream: Stream::Reader(Box::new(Cursor::new(vec![0u8; 6]))),
        }
    }

    #[test]
    fn test_direction_enforced() {
        let mut handle = reader_handle();
        assert!(matches!(
            handle.write_rgba(&[0.0; 4], false),
            Err(CodecError::NotWritable)
        ));
    }

    #[test]
    fn test_buffer_size_checked() {
        let mut handle = reader_handle();
        handle.stream = Stream::Writer(Box::new(Cursor::new(Vec::new())));
        assert!(matches!(
            handle.write_rgba(&[0.0; 7], false),
            Err(CodecError::BufferSize { expected: 4, actual: 7 })
        ));
    }

    #[test]
    fn test_size_accessor() {
        let handle = reader_handle();
        assert_eq!(handle.size(), (1, 1, 3));
    }
}
