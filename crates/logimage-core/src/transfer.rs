//! Transfer characteristics: the colorimetric encoding of an element.

/// Colorimetric encoding of an element's sample values.
///
/// Stored as a one-byte code in the DPX element header. The first five
/// behave identically on the RGB conversion paths (pass-through except
/// [`Transfer::PrintingDensity`]); the last three select the YCbCr
/// conversion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// User defined (code 0). Treated as already-display-ready.
    UserDefined,
    /// Printing density (code 1): negative-film logarithmic encoding.
    PrintingDensity,
    /// Linear (code 2).
    Linear,
    /// Logarithmic (code 3). Pass-through; the log curve is the caller's.
    Logarithmic,
    /// Unspecified video (code 4).
    Unspecified,
    /// SMPTE 240M video (code 5).
    Smpte240M,
    /// ITU-R / CCIR 709-1 video (code 6).
    Ccir709,
    /// CCIR 601-2 system B/G video (code 7).
    Ccir601Bg,
    /// CCIR 601-2 system M / NTSC video (code 8).
    Ccir601M,
}

impl Transfer {
    /// Parses a DPX transfer characteristic code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::UserDefined),
            1 => Some(Self::PrintingDensity),
            2 => Some(Self::Linear),
            3 => Some(Self::Logarithmic),
            4 => Some(Self::Unspecified),
            5 => Some(Self::Smpte240M),
            6 => Some(Self::Ccir709),
            7 => Some(Self::Ccir601Bg),
            8 => Some(Self::Ccir601M),
            _ => None,
        }
    }

    /// DPX wire code.
    pub fn code(&self) -> u8 {
        match self {
            Self::UserDefined => 0,
            Self::PrintingDensity => 1,
            Self::Linear => 2,
            Self::Logarithmic => 3,
            Self::Unspecified => 4,
            Self::Smpte240M => 5,
            Self::Ccir709 => 6,
            Self::Ccir601Bg => 7,
            Self::Ccir601M => 8,
        }
    }

    /// `true` when the element's reference quantities describe a film
    /// density range (used to size the log LUT step).
    pub fn is_density(&self) -> bool {
        matches!(self, Self::PrintingDensity | Self::Logarithmic)
    }
}
