//! Bit-packed element codec.
//!
//! Reads one image element (plane) into normalized `[0, 1]` floats and
//! writes one back out, at 1, 8, 10, 12 or 16 bits per sample. The 10- and
//! 12-bit depths exist in two layouts: *filled*, where samples are padded
//! out to 32-bit words, and *packed*, a continuous bit stream where a
//! sample may straddle a word boundary.
//!
//! Samples are produced in row-major order, channels interleaved within the
//! plane. All word reads go through [`crate::source`] so the file's byte
//! order is corrected exactly once.

use crate::source::{self, ReadSeek, WriteSeek};
use logimage_core::{quantize, CodecError, LogElement, Packing, Result};
use std::io::SeekFrom;
use tracing::trace;

/// Geometry and byte-order context shared by every element of one image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlaneGeometry {
    pub width: u32,
    pub height: u32,
    pub is_msb: bool,
    /// Single-channel DPX images walk filled 10-bit words with forward bit
    /// offsets (2, 12, 22) instead of the usual reverse order (22, 12, 2).
    pub forward_ten_bit: bool,
}

impl PlaneGeometry {
    #[inline]
    fn samples_per_row(&self, element: &LogElement) -> usize {
        self.width as usize * element.depth as usize
    }

    #[inline]
    fn sample_count(&self, element: &LogElement) -> usize {
        self.samples_per_row(element) * self.height as usize
    }
}

/// Decodes one element into `width * height * depth` normalized floats.
pub(crate) fn read_element<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    trace!(
        bits = element.bits_per_sample,
        packing = element.packing.code(),
        depth = element.depth,
        offset = element.data_offset,
        "reading element"
    );
    match element.bits_per_sample {
        1 => read_1(r, geom, element),
        8 => read_8(r, geom, element),
        10 => match element.packing {
            Packing::Packed => read_packed(r, geom, element, 10, 0x3ff),
            Packing::FilledA | Packing::FilledB => read_filled_10(r, geom, element),
        },
        12 => match element.packing {
            Packing::Packed => read_packed(r, geom, element, 12, 0xfff),
            Packing::FilledA | Packing::FilledB => read_ushort_12(r, geom, element),
        },
        16 => read_16(r, geom, element),
        bits => Err(CodecError::UnsupportedBitDepth { bits }),
    }
}

/// 1-bit monochrome rows, padded to 32-bit words.
fn read_1<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    r.seek(SeekFrom::Start(element.data_offset as u64))?;

    let per_row = geom.samples_per_row(element);
    let mut data = vec![0.0f32; geom.sample_count(element)];

    for y in 0..geom.height as usize {
        let mut x = 0;
        while x < per_row {
            let word = source::read_u32(r, geom.is_msb)?;
            let mut offset = 0;
            while offset < 32 && x + offset < per_row {
                data[y * per_row + x + offset] = ((word >> offset) & 0x01) as f32;
                offset += 1;
            }
            x += 32;
        }
    }
    Ok(data)
}

/// 8-bit samples; rows are padded to 32-bit boundaries, so each row starts
/// with a seek.
fn read_8<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    let row_length = element.row_length(geom.width) as u64;
    let per_row = geom.samples_per_row(element);
    let mut data = vec![0.0f32; geom.sample_count(element)];
    let mut row = vec![0u8; per_row];

    for y in 0..geom.height as usize {
        r.seek(SeekFrom::Start(element.data_offset as u64 + y as u64 * row_length))?;
        source::read_bytes(r, &mut row)?;
        for (x, &byte) in row.iter().enumerate() {
            data[y * per_row + x] = byte as f32 / 255.0;
        }
    }
    Ok(data)
}

/// 10-bit samples filled to 32-bit words, three per word.
///
/// Method A parks the two pad bits at the low end of the word, method B at
/// the high end. Most files walk each word from its most significant
/// sample down; single-channel DPX material walks upward instead, so both
/// offset orders are implemented.
fn read_filled_10<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    r.seek(SeekFrom::Start(element.data_offset as u64))?;

    let per_row = geom.samples_per_row(element);
    let mut data = vec![0.0f32; geom.sample_count(element)];
    let mut word = 0u32;

    if geom.forward_ten_bit {
        for y in 0..geom.height as usize {
            let mut offset: i32 = 32;
            for x in 0..per_row {
                if offset >= 30 {
                    offset = match element.packing {
                        Packing::FilledA => 2,
                        _ => 0,
                    };
                    word = source::read_u32(r, geom.is_msb)?;
                }
                data[y * per_row + x] = ((word >> offset) & 0x3ff) as f32 / 1023.0;
                offset += 10;
            }
        }
    } else {
        for y in 0..geom.height as usize {
            let mut offset: i32 = -1;
            for x in 0..per_row {
                if offset < 0 {
                    offset = match element.packing {
                        Packing::FilledA => 22,
                        _ => 20,
                    };
                    word = source::read_u32(r, geom.is_msb)?;
                }
                data[y * per_row + x] = ((word >> offset) & 0x3ff) as f32 / 1023.0;
                offset -= 10;
            }
        }
    }
    Ok(data)
}

/// Continuous bit stream (packing 0) at 10 or 12 bits per sample.
///
/// Samples sit low-bits-first within each 32-bit word; when one straddles
/// a word boundary its high part is fetched from the next word and OR-ed
/// onto the carried remainder. Rows restart on a fresh word boundary.
fn read_packed<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
    bits: u32,
    mask: u32,
) -> Result<Vec<f32>> {
    let row_length = element.row_length(geom.width) as u64;
    let per_row = geom.samples_per_row(element);
    let max = mask as f32;
    let mut data = vec![0.0f32; geom.sample_count(element)];
    let mut word = 0u32;

    for y in 0..geom.height as usize {
        r.seek(SeekFrom::Start(element.data_offset as u64 + y as u64 * row_length))?;

        let mut carried = 0u32;
        let mut offset: u32 = 0;
        let mut spill: u32 = 0;

        for x in 0..per_row {
            if spill != 0 {
                offset = bits - spill;
                spill = 0;
                carried = 0;
            } else if offset == 32 {
                offset = 0;
            } else if offset + bits > 32 {
                // Sample split across two words: keep the low part.
                carried = word >> offset;
                spill = 32 - offset;
                offset = 0;
            }

            if offset == 0 {
                word = source::read_u32(r, geom.is_msb)?;
            }
            data[y * per_row + x] = ((((word << spill) >> offset) & mask) | carried) as f32 / max;
            offset += bits;
        }
    }
    Ok(data)
}

/// 12-bit samples stored one per 16-bit word: method A right-pads (sample
/// in the high bits), method B left-pads (sample in the low bits).
fn read_ushort_12<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    r.seek(SeekFrom::Start(element.data_offset as u64))?;

    let mut data = vec![0.0f32; geom.sample_count(element)];
    for value in data.iter_mut() {
        let pixel = source::read_u16(r, geom.is_msb)?;
        let code = match element.packing {
            Packing::FilledA => pixel >> 4,
            _ => pixel & 0x0fff,
        };
        *value = code as f32 / 4095.0;
    }
    Ok(data)
}

/// 16-bit samples, one per word.
fn read_16<R: ReadSeek + ?Sized>(
    r: &mut R,
    geom: PlaneGeometry,
    element: &LogElement,
) -> Result<Vec<f32>> {
    r.seek(SeekFrom::Start(element.data_offset as u64))?;

    let mut data = vec![0.0f32; geom.sample_count(element)];
    for value in data.iter_mut() {
        let pixel = source::read_u16(r, geom.is_msb)?;
        *value = pixel as f32 / 65535.0;
    }
    Ok(data)
}

/// Encodes one element from `width * height * depth` normalized floats.
///
/// Only the layouts the format writers emit are supported: 8-bit, 10-bit
/// filled method A, 12-bit in left-shifted 16-bit words, and 16-bit. The
/// stream is positioned at the element's data offset first.
pub(crate) fn write_element<W: WriteSeek + ?Sized>(
    w: &mut W,
    geom: PlaneGeometry,
    element: &LogElement,
    data: &[f32],
) -> Result<()> {
    trace!(
        bits = element.bits_per_sample,
        depth = element.depth,
        "writing element"
    );
    w.seek(SeekFrom::Start(element.data_offset as u64))?;
    match element.bits_per_sample {
        8 => write_8(w, geom, element, data),
        10 => match element.packing {
            Packing::FilledA => write_filled_10(w, geom, element, data),
            p => Err(CodecError::UnsupportedPacking {
                bits: 10,
                packing: p.code(),
            }),
        },
        12 => match element.packing {
            Packing::FilledA => write_ushort_12(w, geom, element, data),
            p => Err(CodecError::UnsupportedPacking {
                bits: 12,
                packing: p.code(),
            }),
        },
        16 => write_16(w, geom, element, data),
        bits => Err(CodecError::UnsupportedBitDepth { bits }),
    }
}

fn write_8<W: WriteSeek + ?Sized>(
    w: &mut W,
    geom: PlaneGeometry,
    element: &LogElement,
    data: &[f32],
) -> Result<()> {
    let row_length = element.row_length(geom.width);
    let per_row = geom.samples_per_row(element);
    let mut row = vec![0u8; row_length];

    for y in 0..geom.height as usize {
        for x in 0..per_row {
            row[x] = quantize(data[y * per_row + x], 255) as u8;
        }
        source::write_bytes(w, &row)?;
    }
    Ok(())
}

/// Packs three 10-bit samples per 32-bit word, most significant first,
/// with the two pad bits at the low end (filled method A).
fn write_filled_10<W: WriteSeek + ?Sized>(
    w: &mut W,
    geom: PlaneGeometry,
    element: &LogElement,
    data: &[f32],
) -> Result<()> {
    let words_per_row = element.row_length(geom.width) / 4;
    let per_row = geom.samples_per_row(element);
    let mut row = vec![0u32; words_per_row];

    for y in 0..geom.height as usize {
        row.fill(0);
        let mut index = 0;
        let mut word = 0u32;
        let mut offset: i32 = 22;

        for x in 0..per_row {
            word |= quantize(data[y * per_row + x], 1023) << offset;
            offset -= 10;
            if offset < 0 {
                row[index] = word;
                index += 1;
                word = 0;
                offset = 22;
            }
        }
        if word != 0 {
            row[index] = word;
        }

        for &word in &row {
            source::write_u32(w, word, geom.is_msb)?;
        }
    }
    Ok(())
}

/// 12-bit samples left-shifted into 16-bit words (filled method A).
fn write_ushort_12<W: WriteSeek + ?Sized>(
    w: &mut W,
    geom: PlaneGeometry,
    element: &LogElement,
    data: &[f32],
) -> Result<()> {
    let per_row = geom.samples_per_row(element);
    for y in 0..geom.height as usize {
        for x in 0..per_row {
            let code = quantize(data[y * per_row + x], 4095) as u16;
            source::write_u16(w, code << 4, geom.is_msb)?;
        }
    }
    Ok(())
}

fn write_16<W: WriteSeek + ?Sized>(
    w: &mut W,
    geom: PlaneGeometry,
    element: &LogElement,
    data: &[f32],
) -> Result<()> {
    let per_row = geom.samples_per_row(element);
    for y in 0..geom.height as usize {
        for x in 0..per_row {
            let code = quantize(data[y * per_row + x], 65535) as u16;
            source::write_u16(w, code, geom.is_msb)?;
        }
    }
    Ok(())
}
