//! sRGB transfer function and its code-indexed lookup tables.
//!
//! The piecewise IEC 61966-2-1 curve: a linear segment near black joined to
//! a 2.4 power curve. Decoded log images pass through this on their way to
//! linear RGB, and linear input passes through it before log encoding.
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

/// sRGB EOTF: decodes an sRGB-encoded value to linear light.
///
/// Negative inputs clamp to 0.
#[inline]
pub fn eotf(v: f32) -> f32 {
    if v < 0.04045 {
        if v < 0.0 {
            0.0
        } else {
            v * (1.0 / 12.92)
        }
    } else {
        ((v + 0.055) * (1.0 / 1.055)).powf(2.4)
    }
}

/// sRGB OETF: encodes linear light to sRGB.
///
/// Negative inputs clamp to 0.
#[inline]
pub fn oetf(l: f32) -> f32 {
    if l < 0.0031308 {
        if l < 0.0 {
            0.0
        } else {
            l * 12.92
        }
    } else {
        1.055 * l.powf(1.0 / 2.4) - 0.055
    }
}

/// Builds the sRGB -> linear decode table with `max_value + 1` entries
/// indexed by code value.
pub fn eotf_lut(max_value: u32) -> Vec<f32> {
    (0..=max_value)
        .map(|i| eotf(i as f32 / max_value as f32))
        .collect()
}

/// Builds the linear -> sRGB encode table with `max_value + 1` entries
/// indexed by code value.
pub fn oetf_lut(max_value: u32) -> Vec<f32> {
    (0..=max_value)
        .map(|i| oetf(i as f32 / max_value as f32))
        .collect()
}
