//! Cineon (Kodak V4.5) header layer.
//!
//! Parses and writes the 1024-byte generic + 1024-byte industry headers
//! and maps them onto the [`LogImage`] data model. Section layout:
//!
//! | Offset | Size | Section |
//! |--------|------|---------|
//! | 0 | 192 | File information |
//! | 192 | 488 | Image information (8 channel blocks) |
//! | 680 | 32 | Data format information |
//! | 712 | 312 | Origination information |
//! | 1024 | 1024 | Film industry |
//!
//! Cineon channels carry a two-byte designator (metric, channel) instead
//! of a descriptor code; pixel-interleaved files collapse into one element,
//! channel-interleaved files become planar elements. Samples are always
//! printing density.

use crate::detect::{CINEON_MAGIC, CINEON_MAGIC_SWAPPED};
use crate::image::{CreateOptions, LogImage, Stream};
use crate::source::{self, ReadSeek, WriteSeek};
use logimage_core::{CodecError, Descriptor, LogElement, Packing, Result, SourceFormat, Transfer};
use std::io::SeekFrom;
use tracing::{debug, warn};

/// Byte offset of the image information section.
const IMAGE_SECTION: u64 = 192;
/// Byte offset of the data format section.
const FORMAT_SECTION: u64 = 680;
/// Length of the generic header.
const GENERIC_SIZE: u32 = 1024;
/// Length of the film industry header.
const INDUSTRY_SIZE: u32 = 1024;
/// Pixel data offset written into created files.
const DATA_OFFSET: u32 = 2048;
/// Undefined marker for integer header fields.
const UNDEFINED_U32: u32 = u32::MAX;
/// Channel blocks present in the image section regardless of use.
const MAX_CHANNELS: usize = 8;

/// Fixed film parameters: Cineon carries no usable equivalents on the
/// wire, so the conventional 10-bit values apply.
const REFERENCE_BLACK: f32 = 95.0;
const REFERENCE_WHITE: f32 = 685.0;
const GAMMA: f32 = 1.7;

/// Wire codes for the packing field this codec understands.
const PACKING_TIGHT: u8 = 0;
const PACKING_LONGWORD_LEFT: u8 = 5;
const PACKING_LONGWORD_RIGHT: u8 = 6;

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct FileHeader {
    image_offset: u32,
    generic_size: u32,
    industry_size: u32,
    user_size: u32,
    file_size: u32,
    version: String,
    file_name: String,
    creation_date: String,
    creation_time: String,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct ChannelHeader {
    metric: u8,
    designator: u8,
    bits_per_sample: u8,
    pixels_per_line: u32,
    lines_per_element: u32,
    min_data: f32,
    min_quantity: f32,
    max_data: f32,
    max_quantity: f32,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct ImageHeader {
    orientation: u8,
    num_channels: u8,
    channels: Vec<ChannelHeader>,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct FormatHeader {
    interleave: u8,
    packing: u8,
    data_sign: u8,
    image_sense: u8,
    line_padding: u32,
    channel_padding: u32,
}

fn read_file_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<FileHeader> {
    // Caller has consumed the 4-byte magic.
    Ok(FileHeader {
        image_offset: source::read_u32(r, is_msb)?,
        generic_size: source::read_u32(r, is_msb)?,
        industry_size: source::read_u32(r, is_msb)?,
        user_size: source::read_u32(r, is_msb)?,
        file_size: source::read_u32(r, is_msb)?,
        version: source::read_fixed_str(r, 8)?,
        file_name: source::read_fixed_str(r, 100)?,
        creation_date: source::read_fixed_str(r, 12)?,
        creation_time: source::read_fixed_str(r, 12)?,
    })
}

fn read_channel_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<ChannelHeader> {
    let metric = source::read_u8(r)?;
    let designator = source::read_u8(r)?;
    let bits_per_sample = source::read_u8(r)?;
    let _reserved = source::read_u8(r)?;
    Ok(ChannelHeader {
        metric,
        designator,
        bits_per_sample,
        pixels_per_line: source::read_u32(r, is_msb)?,
        lines_per_element: source::read_u32(r, is_msb)?,
        min_data: source::read_f32(r, is_msb)?,
        min_quantity: source::read_f32(r, is_msb)?,
        max_data: source::read_f32(r, is_msb)?,
        max_quantity: source::read_f32(r, is_msb)?,
    })
}

fn read_image_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<ImageHeader> {
    r.seek(SeekFrom::Start(IMAGE_SECTION))?;
    let orientation = source::read_u8(r)?;
    let num_channels = source::read_u8(r)?;
    let mut pad = [0u8; 2];
    source::read_bytes(r, &mut pad)?;

    let mut channels = Vec::with_capacity(MAX_CHANNELS);
    for _ in 0..MAX_CHANNELS {
        channels.push(read_channel_header(r, is_msb)?);
    }

    Ok(ImageHeader {
        orientation,
        num_channels,
        channels,
    })
}

fn read_format_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<FormatHeader> {
    r.seek(SeekFrom::Start(FORMAT_SECTION))?;
    Ok(FormatHeader {
        interleave: source::read_u8(r)?,
        packing: source::read_u8(r)?,
        data_sign: source::read_u8(r)?,
        image_sense: source::read_u8(r)?,
        line_padding: source::read_u32(r, is_msb)?,
        channel_padding: source::read_u32(r, is_msb)?,
    })
}

/// Maps a Cineon channel designator to an element descriptor.
fn descriptor_for(designator: u8) -> Result<Descriptor> {
    match designator {
        0 => Ok(Descriptor::Luminance),
        1 => Ok(Descriptor::Red),
        2 => Ok(Descriptor::Green),
        3 => Ok(Descriptor::Blue),
        d => Err(CodecError::invalid_header(format!(
            "unknown channel designator {}",
            d
        ))),
    }
}

/// Maps the Cineon packing code onto the shared packing model.
fn packing_for(code: u8, bits: u32) -> Result<Packing> {
    match code {
        PACKING_TIGHT => Ok(Packing::Packed),
        PACKING_LONGWORD_LEFT => Ok(Packing::FilledA),
        PACKING_LONGWORD_RIGHT => Ok(Packing::FilledB),
        other => Err(CodecError::UnsupportedPacking {
            bits,
            packing: other as u16,
        }),
    }
}

/// Opens a Cineon stream: parses the headers and builds the handle.
pub(crate) fn open(mut r: Box<dyn ReadSeek + Send>) -> Result<LogImage> {
    r.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 4];
    source::read_bytes(&mut *r, &mut magic)?;
    let is_msb = match u32::from_be_bytes(magic) {
        CINEON_MAGIC => true,
        CINEON_MAGIC_SWAPPED => false,
        _ => return Err(CodecError::UnknownFormat),
    };

    let file = read_file_header(&mut *r, is_msb)?;
    let image = read_image_header(&mut *r, is_msb)?;
    let format = read_format_header(&mut *r, is_msb)?;

    let num_channels = image.num_channels as usize;
    if num_channels == 0 || num_channels > MAX_CHANNELS {
        return Err(CodecError::invalid_header(format!(
            "channel count {} outside 1..=8",
            image.num_channels
        )));
    }
    let channels = &image.channels[..num_channels];

    let first = &channels[0];
    let width = first.pixels_per_line;
    let height = first.lines_per_element;
    if width == 0 || height == 0 || width == UNDEFINED_U32 || height == UNDEFINED_U32 {
        return Err(CodecError::invalid_dimensions(
            width,
            height,
            "missing pixel dimensions",
        ));
    }
    let bits = first.bits_per_sample as u32;
    if !matches!(bits, 1 | 8 | 10 | 12 | 16) {
        return Err(CodecError::UnsupportedBitDepth { bits });
    }
    for channel in channels {
        if channel.bits_per_sample as u32 != bits
            || channel.pixels_per_line != width
            || channel.lines_per_element != height
        {
            return Err(CodecError::invalid_header(
                "channels disagree on bit depth or dimensions",
            ));
        }
    }

    let packing = packing_for(format.packing, bits)?;
    if format.line_padding != 0 && format.line_padding != UNDEFINED_U32 {
        warn!(padding = format.line_padding, "ignoring line padding");
    }
    if format.channel_padding != 0 && format.channel_padding != UNDEFINED_U32 {
        warn!(padding = format.channel_padding, "ignoring channel padding");
    }

    let max_value = (1u32 << bits) - 1;
    let base_element = |descriptor: Descriptor, channel: &ChannelHeader| LogElement {
        descriptor,
        depth: descriptor.channels(),
        bits_per_sample: bits,
        packing,
        transfer: Transfer::PrintingDensity,
        data_offset: file.image_offset,
        ref_low_data: if channel.min_data.is_nan() {
            0
        } else {
            channel.min_data as u32
        },
        ref_high_data: if channel.max_data.is_nan() {
            max_value
        } else {
            channel.max_data as u32
        },
        ref_low_quantity: if channel.min_quantity.is_nan() {
            0.0
        } else {
            channel.min_quantity
        },
        ref_high_quantity: if channel.max_quantity.is_nan() {
            2.048
        } else {
            channel.max_quantity
        },
    };

    let elements = match format.interleave {
        // Pixel interleave: the channels describe one interleaved element.
        0 => {
            let descriptor = match num_channels {
                1 => descriptor_for(first.designator)?,
                3 => Descriptor::Rgb,
                n => {
                    return Err(CodecError::invalid_header(format!(
                        "{} pixel-interleaved channels have no descriptor",
                        n
                    )))
                }
            };
            let mut element = base_element(descriptor, first);
            element.depth = num_channels as u32;
            vec![element]
        }
        // Channel interleave: one planar element per channel, planes
        // stored back to back.
        2 => {
            let mut elements = Vec::with_capacity(num_channels);
            let mut offset = file.image_offset;
            for channel in channels {
                let descriptor = descriptor_for(channel.designator)?;
                let mut element = base_element(descriptor, channel);
                element.data_offset = offset;
                let plane_size = height as u64 * element.row_length(width) as u64;
                offset = offset
                    .checked_add(plane_size as u32)
                    .ok_or_else(|| CodecError::invalid_header("plane offsets overflow"))?;
                elements.push(element);
            }
            elements
        }
        other => {
            return Err(CodecError::invalid_header(format!(
                "unsupported interleave {}",
                other
            )))
        }
    };

    let depth: u32 = elements.iter().map(|e| e.depth).sum();
    debug!(
        width,
        height,
        depth,
        num_channels,
        is_msb,
        interleave = format.interleave,
        "opened Cineon"
    );

    Ok(LogImage {
        width,
        height,
        depth,
        elements,
        is_msb,
        src_format: SourceFormat::Cineon,
        reference_black: REFERENCE_BLACK,
        reference_white: REFERENCE_WHITE,
        gamma: GAMMA,
        stream: Stream::Reader(r),
    })
}

/// Creates a Cineon stream: writes the full header region and returns a
/// write-mode handle positioned at the pixel data.
///
/// Only the classic layout is written: 10-bit RGB, pixel interleaved,
/// longword-filled left-justified. The reference and gamma options are
/// ignored; Cineon semantics are fixed.
pub(crate) fn create(
    mut w: Box<dyn WriteSeek + Send>,
    file_name: &str,
    options: &CreateOptions,
) -> Result<LogImage> {
    if options.bits_per_sample != 10 {
        return Err(CodecError::UnsupportedBitDepth {
            bits: options.bits_per_sample,
        });
    }
    if options.width == 0 || options.height == 0 {
        return Err(CodecError::invalid_dimensions(
            options.width,
            options.height,
            "image must have at least one pixel",
        ));
    }

    let is_msb = true;
    let element = LogElement {
        descriptor: Descriptor::Rgb,
        depth: 3,
        bits_per_sample: 10,
        packing: Packing::FilledA,
        transfer: Transfer::PrintingDensity,
        data_offset: DATA_OFFSET,
        ref_low_data: 0,
        ref_high_data: 1023,
        ref_low_quantity: 0.0,
        ref_high_quantity: 2.048,
    };

    let image_size = options.height as u64 * element.row_length(options.width) as u64;
    let file_size = DATA_OFFSET as u64 + image_size;

    // File information section.
    source::write_u32(&mut *w, CINEON_MAGIC, is_msb)?;
    source::write_u32(&mut *w, DATA_OFFSET, is_msb)?;
    source::write_u32(&mut *w, GENERIC_SIZE, is_msb)?;
    source::write_u32(&mut *w, INDUSTRY_SIZE, is_msb)?;
    source::write_u32(&mut *w, 0, is_msb)?; // no user data
    source::write_u32(&mut *w, file_size as u32, is_msb)?;
    source::write_fixed_str(&mut *w, "V4.5", 8)?;
    source::write_fixed_str(&mut *w, file_name, 100)?;
    source::write_fixed_str(&mut *w, "", 12)?;
    source::write_fixed_str(&mut *w, "", 12)?;
    source::write_bytes(&mut *w, &[0u8; 36])?;

    // Image information section: three channels, R then G then B.
    source::write_u8(&mut *w, 0)?; // top-to-bottom, left-to-right
    source::write_u8(&mut *w, 3)?;
    source::write_bytes(&mut *w, &[0u8; 2])?;
    for designator in 1..=3u8 {
        source::write_u8(&mut *w, 0)?; // universal metric
        source::write_u8(&mut *w, designator)?;
        source::write_u8(&mut *w, 10)?;
        source::write_u8(&mut *w, 0)?;
        source::write_u32(&mut *w, options.width, is_msb)?;
        source::write_u32(&mut *w, options.height, is_msb)?;
        source::write_f32(&mut *w, 0.0, is_msb)?;
        source::write_f32(&mut *w, 0.0, is_msb)?;
        source::write_f32(&mut *w, 1023.0, is_msb)?;
        source::write_f32(&mut *w, 2.048, is_msb)?;
    }
    for _ in 3..MAX_CHANNELS {
        source::write_bytes(&mut *w, &[0u8; 28])?;
    }
    for _ in 0..8 {
        source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // chromaticities
    }
    source::write_fixed_str(&mut *w, "", 200)?;
    source::write_bytes(&mut *w, &[0u8; 28])?;

    // Data format section.
    source::write_u8(&mut *w, 0)?; // pixel interleave
    source::write_u8(&mut *w, PACKING_LONGWORD_LEFT)?;
    source::write_u8(&mut *w, 0)?; // unsigned
    source::write_u8(&mut *w, 0)?; // positive sense
    source::write_u32(&mut *w, 0, is_msb)?; // line padding
    source::write_u32(&mut *w, 0, is_msb)?; // channel padding
    source::write_bytes(&mut *w, &[0u8; 20])?;

    // Origination section.
    source::write_u32(&mut *w, 0, is_msb)?; // x offset
    source::write_u32(&mut *w, 0, is_msb)?; // y offset
    source::write_fixed_str(&mut *w, file_name, 100)?;
    source::write_fixed_str(&mut *w, "", 12)?;
    source::write_fixed_str(&mut *w, "", 12)?;
    source::write_fixed_str(&mut *w, &options.creator, 64)?;
    source::write_fixed_str(&mut *w, "", 32)?;
    source::write_fixed_str(&mut *w, "", 32)?;
    for _ in 0..3 {
        source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // pitch x/y, gamma
    }
    source::write_bytes(&mut *w, &[0u8; 40])?;

    // Film industry section.
    source::write_bytes(&mut *w, &[0u8; INDUSTRY_SIZE as usize])?;

    debug!(
        width = options.width,
        height = options.height,
        "created Cineon"
    );

    Ok(LogImage {
        width: options.width,
        height: options.height,
        depth: 3,
        elements: vec![element],
        is_msb,
        src_format: SourceFormat::Cineon,
        reference_black: REFERENCE_BLACK,
        reference_white: REFERENCE_WHITE,
        gamma: GAMMA,
        stream: Stream::Writer(w),
    })
}
