//! Element descriptors: which channels an image element holds.

/// Channel layout of a single image element.
///
/// DPX stores this as a one-byte code per element; Cineon derives it from
/// per-channel designators. An element is either one interleaved channel
/// group (`Rgb`, `CbYCr`, ...) or a single plane of a planar image (`Red`,
/// `Luminance`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// Red plane of a planar image.
    Red,
    /// Green plane of a planar image.
    Green,
    /// Blue plane of a planar image.
    Blue,
    /// Alpha plane. Always merged as the last channel.
    Alpha,
    /// Luminance (Y) plane, or a whole black-and-white image.
    Luminance,
    /// Color-difference (Cb or Cr) plane of a planar YCbCr image.
    Chrominance,
    /// Interleaved R, G, B.
    Rgb,
    /// Interleaved R, G, B, A.
    Rgba,
    /// Interleaved A, B, G, R.
    Abgr,
    /// 4:2:2 YCbCr: Cb, Y, Cr, Y per two pixels.
    CbYCrY,
    /// 4:2:2:4 YCbCr with alpha: Cb, Y, A, Cr, Y, A per two pixels.
    CbYACrYA,
    /// 4:4:4 YCbCr: Cb, Y, Cr per pixel.
    CbYCr,
    /// 4:4:4:4 YCbCr with alpha: Cb, Y, Cr, A per pixel.
    CbYCrA,
    /// Luminance plus alpha. Only produced by the plane merger; never
    /// appears on the wire.
    Ya,
    /// Depth (Z) element. Recognized but never decoded.
    Depth,
    /// Vendor composite video element. Recognized but never decoded.
    Composite,
}

impl Descriptor {
    /// Parses a DPX image-element descriptor code.
    pub fn from_dpx_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Blue),
            4 => Some(Self::Alpha),
            6 => Some(Self::Luminance),
            7 => Some(Self::Chrominance),
            8 => Some(Self::Depth),
            9 => Some(Self::Composite),
            50 => Some(Self::Rgb),
            51 => Some(Self::Rgba),
            52 => Some(Self::Abgr),
            100 => Some(Self::CbYCrY),
            101 => Some(Self::CbYACrYA),
            102 => Some(Self::CbYCr),
            103 => Some(Self::CbYCrA),
            _ => None,
        }
    }

    /// DPX wire code for this descriptor. `None` for [`Descriptor::Ya`],
    /// which exists only in memory.
    pub fn dpx_code(&self) -> Option<u8> {
        match self {
            Self::Red => Some(1),
            Self::Green => Some(2),
            Self::Blue => Some(3),
            Self::Alpha => Some(4),
            Self::Luminance => Some(6),
            Self::Chrominance => Some(7),
            Self::Depth => Some(8),
            Self::Composite => Some(9),
            Self::Rgb => Some(50),
            Self::Rgba => Some(51),
            Self::Abgr => Some(52),
            Self::CbYCrY => Some(100),
            Self::CbYACrYA => Some(101),
            Self::CbYCr => Some(102),
            Self::CbYCrA => Some(103),
            Self::Ya => None,
        }
    }

    /// Samples per pixel stored by an element with this descriptor.
    ///
    /// The 4:2:2 variants average their subsampled chroma over two pixels:
    /// `CbYCrY` carries 4 samples per 2 pixels, `CbYACrYA` 6 per 2.
    pub fn channels(&self) -> u32 {
        match self {
            Self::Red
            | Self::Green
            | Self::Blue
            | Self::Alpha
            | Self::Luminance
            | Self::Chrominance
            | Self::Depth
            | Self::Composite => 1,
            Self::CbYCrY | Self::Ya => 2,
            Self::Rgb | Self::CbYCr | Self::CbYACrYA => 3,
            Self::Rgba | Self::Abgr | Self::CbYCrA => 4,
        }
    }

    /// `true` for descriptors the decoder skips entirely.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Depth | Self::Composite)
    }

    /// `true` when a single element of this kind requires an even image
    /// width (two luma samples share one chroma pair).
    pub fn requires_even_width(&self) -> bool {
        matches!(self, Self::CbYCrY | Self::CbYACrYA)
    }
}
