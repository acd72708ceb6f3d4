//! Per-element (plane) description of a log image.

use crate::{Descriptor, Packing, Transfer};

/// Description of one image element as stored in the file.
///
/// An element is a channel group with a uniform bit depth and packing:
/// either the whole interleaved image (descriptor `Rgb`, `CbYCr`, ...) or a
/// single plane of a planar layout (`Red`, `Luminance`, ...). A file holds
/// one to eight of these.
#[derive(Debug, Clone)]
pub struct LogElement {
    /// Channel layout of this element.
    pub descriptor: Descriptor,
    /// Samples per pixel within this element. Derived from the descriptor
    /// on open; 1 for a planar primary, up to 4 for interleaved groups.
    pub depth: u32,
    /// Bits per sample: 1, 8, 10, 12 or 16.
    pub bits_per_sample: u32,
    /// Packing mode (meaningful for 10- and 12-bit samples).
    pub packing: Packing,
    /// Colorimetric encoding of the samples.
    pub transfer: Transfer,
    /// Byte offset of this element's pixel data within the file.
    pub data_offset: u32,
    /// Integer code corresponding to reference (video) black.
    pub ref_low_data: u32,
    /// Integer code corresponding to reference (video) white.
    pub ref_high_data: u32,
    /// Quantity represented by `ref_low_data` (e.g. a density of 0.0).
    pub ref_low_quantity: f32,
    /// Quantity represented by `ref_high_data` (e.g. a density of 2.048).
    pub ref_high_quantity: f32,
}

impl LogElement {
    /// Largest code value a sample can take: `(1 << bits_per_sample) - 1`.
    #[inline]
    pub fn max_value(&self) -> u32 {
        (1u32 << self.bits_per_sample) - 1
    }

    /// Row stride in bytes for this element at the given image width.
    ///
    /// Filled rows are padded to 32-bit word boundaries; 12-bit filled and
    /// 16-bit samples are stored one per 16-bit word. Unsupported
    /// combinations return 0 (they are rejected before any row math runs).
    pub fn row_length(&self, width: u32) -> usize {
        let samples = width as usize * self.depth as usize;
        match self.bits_per_sample {
            1 => samples.div_ceil(32) * 4,
            8 => samples.div_ceil(4) * 4,
            10 => match self.packing {
                Packing::Packed => (samples * 10).div_ceil(32) * 4,
                Packing::FilledA | Packing::FilledB => samples.div_ceil(3) * 4,
            },
            12 => match self.packing {
                Packing::Packed => (samples * 12).div_ceil(32) * 4,
                Packing::FilledA | Packing::FilledB => samples * 2,
            },
            16 => samples * 2,
            _ => 0,
        }
    }
}
