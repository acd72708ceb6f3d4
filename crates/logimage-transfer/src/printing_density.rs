//! Printing-density transfer: the negative-film logarithmic curve used by
//! Cineon and log-encoded DPX.
//!
//! Code values represent printing density relative to a reference white;
//! the curve maps them to linear light through the film's response. The
//! shape is controlled by the reference black/white codes, the film gamma,
//! and the density range covered by the element's code space.
//!
//! # Range
//!
//! - Codes: `[0, max_value]` integer
//! - Linear: `[0, 1]` at reference white, above 1 for brighter codes
//!
//! # Reference
//!
//! Kodak Cineon 4.5 specification, SMPTE 268M annex

/// Gamma of camera negative film stock.
pub const NEGATIVE_FILM_GAMMA: f32 = 0.6;

/// Soft-clip width in code values. Fixed at 0: `break_point` coincides with
/// the reference white, so the knee branch of the decode curve is dead.
const SOFT_CLIP: f32 = 0.0;

/// Film response parameters for one element.
///
/// `density_range` is the element's `ref_high_quantity` (total density
/// spanned by the code space, conventionally 2.048), and `max_value` is
/// `(1 << bits) - 1`.
#[derive(Debug, Clone, Copy)]
pub struct FilmParams {
    /// Code value of reference black (default 95 at 10 bits).
    pub reference_black: f32,
    /// Code value of reference white (default 685 at 10 bits).
    pub reference_white: f32,
    /// Display gamma the encoding targets (default 1.7).
    pub gamma: f32,
    /// Density covered by the full code range (default 2.048).
    pub density_range: f32,
    /// Largest code value.
    pub max_value: u32,
}

impl Default for FilmParams {
    fn default() -> Self {
        Self {
            reference_black: 95.0,
            reference_white: 685.0,
            gamma: 1.7,
            density_range: 2.048,
            max_value: 1023,
        }
    }
}

impl FilmParams {
    /// Density per code step.
    #[inline]
    fn step(&self) -> f32 {
        self.density_range / self.max_value as f32
    }

    /// Exponent of the film curve for a code distance from reference white.
    #[inline]
    fn exponent(&self, code_delta: f32) -> f32 {
        code_delta * self.step() / NEGATIVE_FILM_GAMMA * self.gamma / 1.7
    }

    /// Gain normalizing the curve so reference black lands on 0 and
    /// reference white on `max_value`.
    #[inline]
    fn gain(&self) -> f32 {
        self.max_value as f32
            / (1.0 - 10f32.powf(self.exponent(self.reference_black - self.reference_white)))
    }
}

/// Builds the log -> linear decode table, `max_value + 1` entries indexed
/// by code value.
///
/// Codes below reference black map to 0.0; reference white maps to exactly
/// 1.0; codes above it decode to super-white values greater than 1.
pub fn log_to_lin_lut(params: &FilmParams) -> Vec<f32> {
    let max = params.max_value as f32;
    let break_point = params.reference_white - SOFT_CLIP;
    let gain = params.gain();
    let offset = gain - max;
    let knee_offset = 10f32.powf(params.exponent(break_point - params.reference_white)) * gain - offset;
    let knee_gain = (max - knee_offset) / (5.0 * SOFT_CLIP).powf(SOFT_CLIP / 100.0);

    (0..=params.max_value)
        .map(|i| {
            let code = i as f32;
            if code < params.reference_black {
                0.0
            } else if code > break_point {
                ((code - break_point).powf(SOFT_CLIP / 100.0) * knee_gain + knee_offset) / max
            } else {
                (10f32.powf(params.exponent(code - params.reference_white)) * gain - offset) / max
            }
        })
        .collect()
}

/// Builds the linear -> log encode table, the numeric inverse of
/// [`log_to_lin_lut`] above reference black.
///
/// Entries whose curve argument is not strictly positive (possible with
/// degenerate reference values) emit 0.0 instead of evaluating `log10`
/// outside its domain.
pub fn lin_to_log_lut(params: &FilmParams) -> Vec<f32> {
    let max = params.max_value as f32;
    let gain = params.gain();
    let offset = gain - max;
    let step = params.step();

    (0..=params.max_value)
        .map(|i| {
            let arg = (i as f32 + offset) / gain;
            if arg <= 0.0 || !arg.is_finite() {
                0.0
            } else {
                (params.reference_white
                    + arg.powf(1.7 / params.gamma).log10() / (step / NEGATIVE_FILM_GAMMA))
                    / max
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_region_is_zero() {
        let lut = log_to_lin_lut(&FilmParams::default());
        for (i, &v) in lut.iter().enumerate().take(95) {
            assert_eq!(v, 0.0, "code {} below reference black", i);
        }
    }

    #[test]
    fn test_white_point_is_unity() {
        let lut = log_to_lin_lut(&FilmParams::default());
        assert!((lut[685] - 1.0).abs() < 1e-4, "white decodes to {}", lut[685]);
        // Codes above reference white decode to super-white.
        assert!(lut[1023] > 1.0);
    }

    #[test]
    fn test_monotonic_above_black() {
        let lut = log_to_lin_lut(&FilmParams::default());
        for i in 96..=1023usize {
            assert!(lut[i] >= lut[i - 1], "not monotonic at code {}", i);
        }
    }

    #[test]
    fn test_encode_endpoints() {
        let params = FilmParams::default();
        let lut = lin_to_log_lut(&params);
        // Linear 0 encodes to reference black, linear 1 to reference white.
        assert!((lut[0] * 1023.0 - 95.0).abs() < 0.5, "black lands on {}", lut[0] * 1023.0);
        assert!((lut[1023] * 1023.0 - 685.0).abs() < 0.5, "white lands on {}", lut[1023] * 1023.0);
    }

    /// Encode is the numeric inverse of decode where both are defined and
    /// the decode slope is steep enough for code rounding not to dominate.
    #[test]
    fn test_decode_encode_inverse() {
        let params = FilmParams::default();
        let decode = log_to_lin_lut(&params);
        let encode = lin_to_log_lut(&params);
        for i in 400..=685usize {
            let lin = decode[i];
            let code = (lin * 1023.0 + 0.5) as usize;
            let back = encode[code] * 1023.0;
            assert!(
                (back - i as f32).abs() <= 1.5,
                "code {} -> lin {} -> code {}",
                i,
                lin,
                back
            );
        }
    }

    #[test]
    fn test_degenerate_references_clamp_to_zero() {
        // Inverted black/white produce a negative gain; the encode table
        // must stay finite and emit 0 where the curve has no inverse.
        let params = FilmParams {
            reference_black: 700.0,
            reference_white: 100.0,
            ..FilmParams::default()
        };
        let lut = lin_to_log_lut(&params);
        for (i, &v) in lut.iter().enumerate() {
            assert!(v.is_finite(), "entry {} is {}", i, v);
        }
    }

    #[test]
    fn test_gamma_scales_curve() {
        let flat = log_to_lin_lut(&FilmParams {
            gamma: 1.0,
            ..FilmParams::default()
        });
        let steep = log_to_lin_lut(&FilmParams {
            gamma: 2.2,
            ..FilmParams::default()
        });
        // Both normalize white to 1.0 but differ in toe response.
        assert!((flat[685] - 1.0).abs() < 1e-4);
        assert!((steep[685] - 1.0).abs() < 1e-4);
        assert!(flat[300] > steep[300]);
    }
}
