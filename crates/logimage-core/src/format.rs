//! Container formats sharing the log image data model.

/// Which container a handle was opened from or created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// SMPTE 268M Digital Picture Exchange.
    #[default]
    Dpx,
    /// Kodak Cineon V4.5.
    Cineon,
}

impl SourceFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dpx => "dpx",
            Self::Cineon => "cin",
        }
    }
}
