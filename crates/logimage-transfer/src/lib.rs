//! # logimage-transfer
//!
//! Colorimetric math for DPX/Cineon decoding: transfer curves, their
//! code-indexed lookup tables, and YCbCr conversion matrices.
//!
//! Everything here is pure functions over primitive parameters; the crate
//! has no dependencies and knows nothing about files or headers.
//!
//! # Modules
//!
//! | Module | Covers | Direction |
//! |--------|--------|-----------|
//! | [`printing_density`] | Negative-film log encoding (Cineon curve) | log <-> linear light |
//! | [`srgb`] | IEC 61966-2-1 piecewise curve | sRGB <-> linear |
//! | [`ycbcr`] | SMPTE 240M / CCIR 709-1 / CCIR 601 matrices | YCbCr -> RGB |
//!
//! # LUT convention
//!
//! Sample values travel through the pipeline as normalized `[0, 1]` floats,
//! but every curve is evaluated through a table with `max_value + 1`
//! entries indexed by the integer code (`round(v * max_value)`), where
//! `max_value = (1 << bits) - 1`. Tables are built on demand per
//! conversion call and not cached.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod printing_density;
pub mod srgb;
pub mod ycbcr;

pub use printing_density::FilmParams;
