//! Colorimetric conversion between decoded elements and RGBA floats.
//!
//! The read path turns an unpacked element buffer (any descriptor) into
//! `width * height * 4` RGBA floats; the write path goes back, but only
//! for the RGB and RGBA descriptors the format writers emit. Printing
//! density and sRGB curves are applied through code-indexed LUTs built per
//! call; YCbCr variants go through the standard-selected matrix.

use logimage_core::{quantize, CodecError, Descriptor, LogElement, Result, Transfer};
use logimage_transfer::{printing_density, srgb, ycbcr, FilmParams};

/// Image-wide parameters the converter needs besides the element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageParams {
    pub width: u32,
    pub height: u32,
    pub reference_black: f32,
    pub reference_white: f32,
    pub gamma: f32,
}

impl ImageParams {
    #[inline]
    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn film_params(&self, element: &LogElement) -> FilmParams {
        FilmParams {
            reference_black: self.reference_black,
            reference_white: self.reference_white,
            gamma: self.gamma,
            density_range: element.ref_high_quantity,
            max_value: element.max_value(),
        }
    }
}

/// Builds the printing-density LUT for the requested direction.
fn density_lut(image: &ImageParams, element: &LogElement, decode: bool) -> Vec<f32> {
    let params = image.film_params(element);
    if decode {
        printing_density::log_to_lin_lut(&params)
    } else {
        printing_density::lin_to_log_lut(&params)
    }
}

/// Selects and scales the YCbCr conversion matrix for an element.
fn conversion_matrix(element: &LogElement) -> Result<ycbcr::Matrix> {
    let max = element.max_value() as f32;
    let (scale_y, scale_cbcr) = ycbcr::scale_factors(
        element.ref_low_data as f32 / max,
        element.ref_high_data as f32 / max,
    );
    let base = match element.transfer {
        Transfer::Linear => &ycbcr::UNITY,
        Transfer::Smpte240M => &ycbcr::SMPTE_240M,
        Transfer::Ccir709 => &ycbcr::CCIR_709_1,
        Transfer::Ccir601Bg | Transfer::Ccir601M => &ycbcr::CCIR_601,
        t => return Err(CodecError::UnknownTransfer { code: t.code() }),
    };
    Ok(ycbcr::scaled(base, scale_y, scale_cbcr))
}

#[inline]
fn mul_row(m: &ycbcr::Matrix, row: usize, y: f32, cb: f32, cr: f32) -> f32 {
    (y * m[row * 3] + cb * m[row * 3 + 1] + cr * m[row * 3 + 2]).clamp(0.0, 1.0)
}

/// Converts a decoded element buffer into RGBA floats.
///
/// `src` holds `width * height * element.depth` samples. When `linear_out`
/// is set the result is converted from sRGB to linear RGB as a final pass
/// (alpha untouched).
pub(crate) fn element_to_rgba(
    src: &[f32],
    image: &ImageParams,
    element: &LogElement,
    linear_out: bool,
) -> Result<Vec<f32>> {
    let pixels = image.pixel_count();
    let mut dst = vec![0.0f32; pixels * 4];

    match element.descriptor {
        Descriptor::Rgb => rgb_to_rgba(src, &mut dst, image, element)?,
        Descriptor::Rgba => rgba_passthrough(src, &mut dst, image, element, true)?,
        Descriptor::Abgr => abgr_to_rgba(src, &mut dst, image, element)?,
        Descriptor::Luminance => luminance_to_rgba(src, &mut dst, image, element, false)?,
        Descriptor::Ya => luminance_to_rgba(src, &mut dst, image, element, true)?,
        Descriptor::CbYCr => cbycr_to_rgba(src, &mut dst, image, element, false)?,
        Descriptor::CbYCrA => cbycr_to_rgba(src, &mut dst, image, element, true)?,
        Descriptor::CbYCrY => cbycry_to_rgba(src, &mut dst, image, element, false)?,
        Descriptor::CbYACrYA => cbycry_to_rgba(src, &mut dst, image, element, true)?,
        Descriptor::Red
        | Descriptor::Green
        | Descriptor::Blue
        | Descriptor::Alpha
        | Descriptor::Chrominance => {
            return Err(CodecError::UnsupportedDescriptor(
                "lone plane cannot convert to RGBA",
            ))
        }
        Descriptor::Depth | Descriptor::Composite => {
            return Err(CodecError::UnsupportedDescriptor(
                "depth and composite elements are not decodable",
            ))
        }
    }

    if linear_out {
        let lut = srgb::eotf_lut(element.max_value());
        let max = element.max_value();
        for pixel in dst.chunks_exact_mut(4) {
            for channel in &mut pixel[..3] {
                *channel = lut[quantize(*channel, max) as usize];
            }
        }
    }
    Ok(dst)
}

/// Converts RGBA floats into an element buffer for encoding.
///
/// Only `Rgb` and `Rgba` targets are writable. When `linear_in` is set the
/// input is first converted from linear RGB to sRGB.
pub(crate) fn rgba_to_element(
    src: &[f32],
    image: &ImageParams,
    element: &LogElement,
    linear_in: bool,
) -> Result<Vec<f32>> {
    let pixels = image.pixel_count();

    let encoded;
    let src: &[f32] = if linear_in {
        let lut = srgb::oetf_lut(element.max_value());
        let max = element.max_value();
        let mut tmp = src.to_vec();
        for pixel in tmp.chunks_exact_mut(4) {
            for channel in &mut pixel[..3] {
                *channel = lut[quantize(*channel, max) as usize];
            }
        }
        encoded = tmp;
        &encoded
    } else {
        src
    };

    let mut dst = vec![0.0f32; pixels * element.depth as usize];
    match element.descriptor {
        Descriptor::Rgb => rgba_to_rgb(src, &mut dst, image, element)?,
        Descriptor::Rgba => rgba_passthrough(src, &mut dst, image, element, false)?,
        _ => {
            return Err(CodecError::UnsupportedDescriptor(
                "only RGB and RGBA elements can be written",
            ))
        }
    }
    Ok(dst)
}

/// RGB element to RGBA: copy three channels, alpha set to 1.
fn rgb_to_rgba(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
) -> Result<()> {
    match element.transfer {
        Transfer::Unspecified
        | Transfer::UserDefined
        | Transfer::Linear
        | Transfer::Logarithmic => {
            for i in 0..image.pixel_count() {
                dst[i * 4..i * 4 + 3].copy_from_slice(&src[i * 3..i * 3 + 3]);
                dst[i * 4 + 3] = 1.0;
            }
            Ok(())
        }
        Transfer::PrintingDensity => {
            let lut = density_lut(image, element, true);
            let max = element.max_value();
            for i in 0..image.pixel_count() {
                for c in 0..3 {
                    dst[i * 4 + c] = lut[quantize(src[i * 3 + c], max) as usize];
                }
                dst[i * 4 + 3] = 1.0;
            }
            Ok(())
        }
        t => Err(CodecError::UnknownTransfer { code: t.code() }),
    }
}

/// RGBA to RGB for encoding: drop alpha.
fn rgba_to_rgb(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
) -> Result<()> {
    match element.transfer {
        Transfer::Unspecified
        | Transfer::UserDefined
        | Transfer::Linear
        | Transfer::Logarithmic => {
            for i in 0..image.pixel_count() {
                dst[i * 3..i * 3 + 3].copy_from_slice(&src[i * 4..i * 4 + 3]);
            }
            Ok(())
        }
        Transfer::PrintingDensity => {
            let lut = density_lut(image, element, false);
            let max = element.max_value();
            for i in 0..image.pixel_count() {
                for c in 0..3 {
                    dst[i * 3 + c] = lut[quantize(src[i * 4 + c], max) as usize];
                }
            }
            Ok(())
        }
        t => Err(CodecError::UnknownTransfer { code: t.code() }),
    }
}

/// RGBA to RGBA in either direction: alpha passes through untouched and
/// `decode` picks the density LUT orientation.
fn rgba_passthrough(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
    decode: bool,
) -> Result<()> {
    match element.transfer {
        Transfer::UserDefined | Transfer::Linear | Transfer::Logarithmic => {
            dst.copy_from_slice(&src[..dst.len()]);
            Ok(())
        }
        Transfer::PrintingDensity => {
            let lut = density_lut(image, element, decode);
            let max = element.max_value();
            for i in 0..image.pixel_count() {
                for c in 0..3 {
                    dst[i * 4 + c] = lut[quantize(src[i * 4 + c], max) as usize];
                }
                dst[i * 4 + 3] = src[i * 4 + 3];
            }
            Ok(())
        }
        t => Err(CodecError::UnknownTransfer { code: t.code() }),
    }
}

/// ABGR element to RGBA: reverse the channel order.
fn abgr_to_rgba(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
) -> Result<()> {
    match element.transfer {
        Transfer::UserDefined | Transfer::Linear | Transfer::Logarithmic => {
            for i in 0..image.pixel_count() {
                for c in 0..4 {
                    dst[i * 4 + c] = src[i * 4 + 3 - c];
                }
            }
            Ok(())
        }
        Transfer::PrintingDensity => {
            let lut = density_lut(image, element, true);
            let max = element.max_value();
            for i in 0..image.pixel_count() {
                for c in 0..3 {
                    dst[i * 4 + c] = lut[quantize(src[i * 4 + 3 - c], max) as usize];
                }
                dst[i * 4 + 3] = src[i * 4];
            }
            Ok(())
        }
        t => Err(CodecError::UnknownTransfer { code: t.code() }),
    }
}

/// Luminance (optionally with alpha) replicated across R, G and B using
/// the luma row of the conversion matrix.
fn luminance_to_rgba(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
    has_alpha: bool,
) -> Result<()> {
    let m = conversion_matrix(element)?;
    let ref_low = element.ref_low_data as f32 / element.max_value() as f32;
    let depth = if has_alpha { 2 } else { 1 };

    for i in 0..image.pixel_count() {
        let value = ((src[i * depth] - ref_low) * m[0]).clamp(0.0, 1.0);
        dst[i * 4] = value;
        dst[i * 4 + 1] = value;
        dst[i * 4 + 2] = value;
        dst[i * 4 + 3] = if has_alpha { src[i * depth + 1] } else { 1.0 };
    }
    Ok(())
}

/// 4:4:4 CbYCr (optionally with alpha) to RGBA.
fn cbycr_to_rgba(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
    has_alpha: bool,
) -> Result<()> {
    let m = conversion_matrix(element)?;
    let ref_low = element.ref_low_data as f32 / element.max_value() as f32;
    let depth = if has_alpha { 4 } else { 3 };

    for i in 0..image.pixel_count() {
        let cb = src[i * depth] - 0.5;
        let y = src[i * depth + 1] - ref_low;
        let cr = src[i * depth + 2] - 0.5;
        dst[i * 4] = mul_row(&m, 0, y, cb, cr);
        dst[i * 4 + 1] = mul_row(&m, 1, y, cb, cr);
        dst[i * 4 + 2] = mul_row(&m, 2, y, cb, cr);
        dst[i * 4 + 3] = if has_alpha { src[i * depth + 3] } else { 1.0 };
    }
    Ok(())
}

/// 4:2:2 CbYCrY (and its alpha variant CbYACrYA) to RGBA: one chroma pair
/// shared by two luma samples. The image width is even by invariant.
fn cbycry_to_rgba(
    src: &[f32],
    dst: &mut [f32],
    image: &ImageParams,
    element: &LogElement,
    has_alpha: bool,
) -> Result<()> {
    let m = conversion_matrix(element)?;
    let ref_low = element.ref_low_data as f32 / element.max_value() as f32;
    let unit = if has_alpha { 6 } else { 4 };

    for i in 0..image.pixel_count() / 2 {
        let s = &src[i * unit..i * unit + unit];
        let (cb, y1, a1, cr, y2, a2) = if has_alpha {
            (s[0] - 0.5, s[1] - ref_low, s[2], s[3] - 0.5, s[4] - ref_low, s[5])
        } else {
            (s[0] - 0.5, s[1] - ref_low, 1.0, s[2] - 0.5, s[3] - ref_low, 1.0)
        };

        let d = &mut dst[i * 8..i * 8 + 8];
        d[0] = mul_row(&m, 0, y1, cb, cr);
        d[1] = mul_row(&m, 1, y1, cb, cr);
        d[2] = mul_row(&m, 2, y1, cb, cr);
        d[3] = a1;
        d[4] = mul_row(&m, 0, y2, cb, cr);
        d[5] = mul_row(&m, 1, y2, cb, cr);
        d[6] = mul_row(&m, 2, y2, cb, cr);
        d[7] = a2;
    }
    Ok(())
}
