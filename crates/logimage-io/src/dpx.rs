//! DPX (SMPTE 268M-2003) header layer.
//!
//! Parses and writes the 2048-byte generic + industry header region and
//! maps it onto the [`LogImage`] data model. Section layout:
//!
//! | Offset | Size | Section |
//! |--------|------|---------|
//! | 0 | 768 | File information |
//! | 768 | 640 | Image information (8 element blocks) |
//! | 1408 | 256 | Image orientation |
//! | 1664 | 256 | Film industry |
//! | 1920 | 128 | Television industry |
//!
//! Undefined integer fields read as `0xFFFF_FFFF` and undefined floats as
//! NaN; the open path substitutes the documented defaults for both.

use crate::detect::{DPX_MAGIC, DPX_MAGIC_SWAPPED};
use crate::image::{CreateOptions, LogImage, Stream};
use crate::source::{self, ReadSeek, WriteSeek};
use logimage_core::{CodecError, Descriptor, LogElement, Packing, Result, SourceFormat, Transfer};
use std::io::SeekFrom;
use tracing::{debug, warn};

/// Byte offset of the image information section.
const IMAGE_SECTION: u64 = 768;
/// Byte offset of the television industry section.
const TV_SECTION: u64 = 1920;
/// Length of the generic header sections (file + image + orientation).
const GENERIC_SIZE: u32 = 1664;
/// Length of the industry header sections (film + television).
const INDUSTRY_SIZE: u32 = 384;
/// Pixel data offset written into created files.
const DATA_OFFSET: u32 = 8192;
/// Undefined marker for integer header fields.
const UNDEFINED_U32: u32 = u32::MAX;
/// Element blocks present in the image section regardless of use.
const MAX_ELEMENTS: usize = 8;

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct FileHeader {
    image_offset: u32,
    version: String,
    file_size: u32,
    ditto_key: u32,
    generic_size: u32,
    industry_size: u32,
    user_size: u32,
    file_name: String,
    creation_date: String,
    creator: String,
    project: String,
    copyright: String,
    encryption_key: u32,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct ElementHeader {
    data_sign: u32,
    ref_low_data: u32,
    ref_low_quantity: f32,
    ref_high_data: u32,
    ref_high_quantity: f32,
    descriptor: u8,
    transfer: u8,
    colorimetric: u8,
    bit_size: u8,
    packing: u16,
    encoding: u16,
    data_offset: u32,
    eol_padding: u32,
    eo_image_padding: u32,
    description: String,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct ImageHeader {
    orientation: u16,
    num_elements: u16,
    pixels_per_line: u32,
    lines_per_element: u32,
    elements: Vec<ElementHeader>,
}

/// Television industry block; only the levels and gamma are consumed.
#[derive(Debug, Clone)]
struct TvHeader {
    gamma: f32,
    black_level: f32,
    break_point: f32,
    white_level: f32,
}

fn read_file_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<FileHeader> {
    // Caller has consumed the 4-byte magic.
    let image_offset = source::read_u32(r, is_msb)?;
    let version = source::read_fixed_str(r, 8)?;
    let file_size = source::read_u32(r, is_msb)?;
    let ditto_key = source::read_u32(r, is_msb)?;
    let generic_size = source::read_u32(r, is_msb)?;
    let industry_size = source::read_u32(r, is_msb)?;
    let user_size = source::read_u32(r, is_msb)?;
    let file_name = source::read_fixed_str(r, 100)?;
    let creation_date = source::read_fixed_str(r, 24)?;
    let creator = source::read_fixed_str(r, 100)?;
    let project = source::read_fixed_str(r, 200)?;
    let copyright = source::read_fixed_str(r, 200)?;
    let encryption_key = source::read_u32(r, is_msb)?;

    Ok(FileHeader {
        image_offset,
        version,
        file_size,
        ditto_key,
        generic_size,
        industry_size,
        user_size,
        file_name,
        creation_date,
        creator,
        project,
        copyright,
        encryption_key,
    })
}

fn read_element_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<ElementHeader> {
    Ok(ElementHeader {
        data_sign: source::read_u32(r, is_msb)?,
        ref_low_data: source::read_u32(r, is_msb)?,
        ref_low_quantity: source::read_f32(r, is_msb)?,
        ref_high_data: source::read_u32(r, is_msb)?,
        ref_high_quantity: source::read_f32(r, is_msb)?,
        descriptor: source::read_u8(r)?,
        transfer: source::read_u8(r)?,
        colorimetric: source::read_u8(r)?,
        bit_size: source::read_u8(r)?,
        packing: source::read_u16(r, is_msb)?,
        encoding: source::read_u16(r, is_msb)?,
        data_offset: source::read_u32(r, is_msb)?,
        eol_padding: source::read_u32(r, is_msb)?,
        eo_image_padding: source::read_u32(r, is_msb)?,
        description: source::read_fixed_str(r, 32)?,
    })
}

fn read_image_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<ImageHeader> {
    r.seek(SeekFrom::Start(IMAGE_SECTION))?;
    let orientation = source::read_u16(r, is_msb)?;
    let num_elements = source::read_u16(r, is_msb)?;
    let pixels_per_line = source::read_u32(r, is_msb)?;
    let lines_per_element = source::read_u32(r, is_msb)?;

    let mut elements = Vec::with_capacity(MAX_ELEMENTS);
    for _ in 0..MAX_ELEMENTS {
        elements.push(read_element_header(r, is_msb)?);
    }

    Ok(ImageHeader {
        orientation,
        num_elements,
        pixels_per_line,
        lines_per_element,
        elements,
    })
}

fn read_tv_header<R: ReadSeek + ?Sized>(r: &mut R, is_msb: bool) -> Result<TvHeader> {
    r.seek(SeekFrom::Start(TV_SECTION))?;
    let _time_code = source::read_u32(r, is_msb)?;
    let _user_bits = source::read_u32(r, is_msb)?;
    let mut flags = [0u8; 4];
    source::read_bytes(r, &mut flags)?;
    let _horizontal_sample_rate = source::read_f32(r, is_msb)?;
    let _vertical_sample_rate = source::read_f32(r, is_msb)?;
    let _frame_rate = source::read_f32(r, is_msb)?;
    let _time_offset = source::read_f32(r, is_msb)?;
    let gamma = source::read_f32(r, is_msb)?;
    let black_level = source::read_f32(r, is_msb)?;
    let _black_gain = source::read_f32(r, is_msb)?;
    let break_point = source::read_f32(r, is_msb)?;
    let white_level = source::read_f32(r, is_msb)?;

    Ok(TvHeader {
        gamma,
        black_level,
        break_point,
        white_level,
    })
}

fn element_from_header(
    header: &ElementHeader,
    image_offset: u32,
) -> Result<LogElement> {
    let descriptor = Descriptor::from_dpx_code(header.descriptor).ok_or_else(|| {
        CodecError::invalid_header(format!("unknown descriptor code {}", header.descriptor))
    })?;
    let bits = header.bit_size as u32;
    if !matches!(bits, 1 | 8 | 10 | 12 | 16) {
        return Err(CodecError::UnsupportedBitDepth { bits });
    }
    let packing = Packing::from_code(header.packing).ok_or(CodecError::UnsupportedPacking {
        bits,
        packing: header.packing,
    })?;
    let transfer = Transfer::from_code(header.transfer).ok_or(CodecError::UnknownTransfer {
        code: header.transfer,
    })?;

    let max_value = (1u32 << bits) - 1;
    let data_offset = if header.data_offset == UNDEFINED_U32 {
        image_offset
    } else {
        header.data_offset
    };
    let ref_low_data = if header.ref_low_data == UNDEFINED_U32 {
        0
    } else {
        header.ref_low_data
    };
    let ref_high_data = if header.ref_high_data == UNDEFINED_U32 {
        max_value
    } else {
        header.ref_high_data
    };
    let ref_low_quantity = if header.ref_low_quantity.is_nan() {
        0.0
    } else {
        header.ref_low_quantity
    };
    let ref_high_quantity = if header.ref_high_quantity.is_nan() {
        if transfer.is_density() {
            2.048
        } else {
            0.0
        }
    } else {
        header.ref_high_quantity
    };

    Ok(LogElement {
        descriptor,
        depth: descriptor.channels(),
        bits_per_sample: bits,
        packing,
        transfer,
        data_offset,
        ref_low_data,
        ref_high_data,
        ref_low_quantity,
        ref_high_quantity,
    })
}

/// Opens a DPX stream: parses the headers and builds the handle.
pub(crate) fn open(mut r: Box<dyn ReadSeek + Send>) -> Result<LogImage> {
    r.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 4];
    source::read_bytes(&mut *r, &mut magic)?;
    let is_msb = match u32::from_be_bytes(magic) {
        DPX_MAGIC => true,
        DPX_MAGIC_SWAPPED => false,
        _ => return Err(CodecError::UnknownFormat),
    };

    let file = read_file_header(&mut *r, is_msb)?;
    let image = read_image_header(&mut *r, is_msb)?;
    let tv = read_tv_header(&mut *r, is_msb)?;

    let width = image.pixels_per_line;
    let height = image.lines_per_element;
    if width == 0 || height == 0 || width == UNDEFINED_U32 || height == UNDEFINED_U32 {
        return Err(CodecError::invalid_dimensions(
            width,
            height,
            "missing pixel dimensions",
        ));
    }
    let num_elements = image.num_elements as usize;
    if num_elements == 0 || num_elements > MAX_ELEMENTS {
        return Err(CodecError::invalid_header(format!(
            "element count {} outside 1..=8",
            image.num_elements
        )));
    }

    let mut elements = Vec::with_capacity(num_elements);
    for header in &image.elements[..num_elements] {
        elements.push(element_from_header(header, file.image_offset)?);
    }

    if num_elements == 1
        && elements[0].descriptor.requires_even_width()
        && width % 2 != 0
    {
        return Err(CodecError::invalid_dimensions(
            width,
            height,
            "subsampled chroma requires an even width",
        ));
    }

    let depth: u32 = elements
        .iter()
        .filter(|e| !e.descriptor.is_unsupported())
        .map(|e| e.depth)
        .sum();
    let max_value = elements[0].max_value() as f32;

    let gamma = if tv.gamma.is_nan() || tv.gamma == 0.0 {
        1.7
    } else {
        tv.gamma
    };
    let default_black = 95.0 / 1023.0 * max_value;
    let default_white = 685.0 / 1023.0 * max_value;
    let (reference_black, reference_white) = if tv.black_level.is_nan()
        || tv.white_level.is_nan()
        || tv.white_level <= tv.black_level
        || tv.black_level < 0.0
        || tv.white_level > max_value
    {
        (default_black, default_white)
    } else {
        (tv.black_level, tv.white_level)
    };
    if !tv.break_point.is_nan() && tv.break_point != reference_white {
        // Soft-clip knees are not modeled; the curve clips at white.
        warn!(break_point = tv.break_point, "ignoring soft-clip break point");
    }

    debug!(
        width,
        height,
        depth,
        num_elements,
        is_msb,
        version = %file.version,
        "opened DPX"
    );

    Ok(LogImage {
        width,
        height,
        depth,
        elements,
        is_msb,
        src_format: SourceFormat::Dpx,
        reference_black,
        reference_white,
        gamma,
        stream: Stream::Reader(r),
    })
}

fn write_element_header<W: WriteSeek + ?Sized>(
    w: &mut W,
    element: &LogElement,
    is_msb: bool,
) -> Result<()> {
    source::write_u32(w, 0, is_msb)?; // unsigned data
    source::write_u32(w, element.ref_low_data, is_msb)?;
    source::write_f32(w, element.ref_low_quantity, is_msb)?;
    source::write_u32(w, element.ref_high_data, is_msb)?;
    source::write_f32(w, element.ref_high_quantity, is_msb)?;
    let descriptor = element
        .descriptor
        .dpx_code()
        .ok_or(CodecError::UnsupportedDescriptor("internal-only descriptor"))?;
    source::write_u8(w, descriptor)?;
    source::write_u8(w, element.transfer.code())?;
    source::write_u8(w, element.transfer.code())?; // colorimetric mirrors transfer
    source::write_u8(w, element.bits_per_sample as u8)?;
    source::write_u16(w, element.packing.code(), is_msb)?;
    source::write_u16(w, 0, is_msb)?; // uncompressed
    source::write_u32(w, element.data_offset, is_msb)?;
    source::write_u32(w, 0, is_msb)?; // end-of-line padding
    source::write_u32(w, 0, is_msb)?; // end-of-image padding
    source::write_fixed_str(w, "", 32)
}

/// Creates a DPX stream: writes the full header region and returns a
/// write-mode handle positioned at the pixel data.
pub(crate) fn create(
    mut w: Box<dyn WriteSeek + Send>,
    file_name: &str,
    options: &CreateOptions,
) -> Result<LogImage> {
    if !matches!(options.bits_per_sample, 8 | 10 | 12 | 16) {
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
    let descriptor = if options.has_alpha {
        Descriptor::Rgba
    } else {
        Descriptor::Rgb
    };
    let transfer = if options.logarithmic {
        Transfer::PrintingDensity
    } else {
        Transfer::Linear
    };
    let packing = match options.bits_per_sample {
        10 | 12 => Packing::FilledA,
        _ => Packing::Packed,
    };
    let max_value = (1u32 << options.bits_per_sample) - 1;

    let element = LogElement {
        descriptor,
        depth: descriptor.channels(),
        bits_per_sample: options.bits_per_sample,
        packing,
        transfer,
        data_offset: DATA_OFFSET,
        ref_low_data: 0,
        ref_high_data: max_value,
        ref_low_quantity: 0.0,
        ref_high_quantity: 2.048,
    };

    let max = max_value as f32;
    let (reference_black, reference_white) = if options.reference_white <= options.reference_black
        || options.reference_black < 0.0
        || options.reference_white > max
    {
        (95.0 / 1023.0 * max, 685.0 / 1023.0 * max)
    } else {
        (options.reference_black, options.reference_white)
    };
    let gamma = if options.gamma > 0.0 { options.gamma } else { 1.7 };

    let image_size = options.height as u64 * element.row_length(options.width) as u64;
    let file_size = DATA_OFFSET as u64 + image_size;

    // File information section.
    source::write_u32(&mut *w, DPX_MAGIC, is_msb)?;
    source::write_u32(&mut *w, DATA_OFFSET, is_msb)?;
    source::write_fixed_str(&mut *w, "V2.0", 8)?;
    source::write_u32(&mut *w, file_size as u32, is_msb)?;
    source::write_u32(&mut *w, 1, is_msb)?; // ditto key: frames differ only in data
    source::write_u32(&mut *w, GENERIC_SIZE, is_msb)?;
    source::write_u32(&mut *w, INDUSTRY_SIZE, is_msb)?;
    source::write_u32(&mut *w, 0, is_msb)?; // no user data
    source::write_fixed_str(&mut *w, file_name, 100)?;
    source::write_fixed_str(&mut *w, "", 24)?;
    source::write_fixed_str(&mut *w, &options.creator, 100)?;
    source::write_fixed_str(&mut *w, "", 200)?;
    source::write_fixed_str(&mut *w, "", 200)?;
    source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // unencrypted
    source::write_bytes(&mut *w, &[0u8; 104])?;

    // Image information section.
    source::write_u16(&mut *w, 0, is_msb)?; // left-to-right, top-to-bottom
    source::write_u16(&mut *w, 1, is_msb)?;
    source::write_u32(&mut *w, options.width, is_msb)?;
    source::write_u32(&mut *w, options.height, is_msb)?;
    write_element_header(&mut *w, &element, is_msb)?;
    for _ in 1..MAX_ELEMENTS {
        source::write_bytes(&mut *w, &[0u8; 72])?;
    }
    source::write_bytes(&mut *w, &[0u8; 52])?;

    // Orientation and film industry sections carry nothing we track.
    source::write_bytes(&mut *w, &[0u8; 256])?;
    source::write_bytes(&mut *w, &[0u8; 256])?;

    // Television industry section: levels and gamma for reopening.
    source::write_u32(&mut *w, 0, is_msb)?; // time code
    source::write_u32(&mut *w, 0, is_msb)?; // user bits
    source::write_bytes(&mut *w, &[0u8; 4])?;
    for _ in 0..4 {
        source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // sample rates, frame rate, offset
    }
    source::write_f32(&mut *w, gamma, is_msb)?;
    source::write_f32(&mut *w, reference_black, is_msb)?;
    source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // black gain
    source::write_f32(&mut *w, reference_white, is_msb)?; // break point at white
    source::write_f32(&mut *w, reference_white, is_msb)?;
    source::write_u32(&mut *w, UNDEFINED_U32, is_msb)?; // integration times
    source::write_bytes(&mut *w, &[0u8; 76])?;

    // Pad up to the pixel data offset.
    let pad = vec![0u8; (DATA_OFFSET - 2048) as usize];
    source::write_bytes(&mut *w, &pad)?;

    debug!(
        width = options.width,
        height = options.height,
        bits = options.bits_per_sample,
        ?descriptor,
        "created DPX"
    );

    let depth = element.depth;
    Ok(LogImage {
        width: options.width,
        height: options.height,
        depth,
        elements: vec![element],
        is_msb,
        src_format: SourceFormat::Dpx,
        reference_black,
        reference_white,
        gamma,
        stream: Stream::Writer(w),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create as create_file, open as open_file};
    use logimage_core::SourceFormat;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_header_roundtrip() {
        let path = temp_path("logimage_dpx_header.dpx");
        let options = CreateOptions {
            format: SourceFormat::Dpx,
            width: 6,
            height: 4,
            bits_per_sample: 10,
            logarithmic: true,
            has_alpha: false,
            reference_white: 685.0,
            reference_black: 95.0,
            gamma: 1.7,
            creator: "header test".to_string(),
        };
        {
            let mut image = create_file(&path, &options).unwrap();
            let data = vec![0.5f32; 6 * 4 * 4];
            image.write_rgba(&data, false).unwrap();
        }

        let image = open_file(&path).unwrap();
        assert_eq!(image.size(), (6, 4, 3));
        assert!(image.is_msb());
        assert_eq!(image.source_format(), SourceFormat::Dpx);
        assert_eq!(image.gamma(), 1.7);
        assert_eq!(image.reference_black(), 95.0);
        assert_eq!(image.reference_white(), 685.0);

        let element = &image.elements()[0];
        assert_eq!(element.descriptor, Descriptor::Rgb);
        assert_eq!(element.bits_per_sample, 10);
        assert_eq!(element.packing, Packing::FilledA);
        assert_eq!(element.transfer, Transfer::PrintingDensity);
        assert_eq!(element.data_offset, DATA_OFFSET);
        assert_eq!(element.ref_high_data, 1023);
        assert_eq!(element.ref_high_quantity, 2.048);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_reference_levels_fall_back() {
        let path = temp_path("logimage_dpx_badrefs.dpx");
        let options = CreateOptions {
            width: 2,
            height: 2,
            bits_per_sample: 10,
            reference_white: 10.0,
            reference_black: 600.0, // inverted on purpose
            ..CreateOptions::default()
        };
        {
            let mut image = create_file(&path, &options).unwrap();
            image.write_rgba(&vec![0.0f32; 16], false).unwrap();
        }
        let image = open_file(&path).unwrap();
        assert_eq!(image.reference_black(), 95.0);
        assert_eq!(image.reference_white(), 685.0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_create_rejects_unsupported_depths() {
        let path = temp_path("logimage_dpx_badbits.dpx");
        let options = CreateOptions {
            width: 2,
            height: 2,
            bits_per_sample: 24,
            ..CreateOptions::default()
        };
        assert!(matches!(
            create_file(&path, &options),
            Err(CodecError::UnsupportedBitDepth { bits: 24 })
        ));
        let _ = std::fs::remove_file(&path);
    }
}
