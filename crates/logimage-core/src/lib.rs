//! # logimage-core
//!
//! Core types for DPX (SMPTE 268M) and Cineon log image files.
//!
//! Both formats share a "log image" data model: a frame is stored as one or
//! more *elements* (channel groups), each with its own sample bit depth,
//! packing mode and transfer characteristic. This crate provides that model:
//!
//! - [`Descriptor`] - Which channels an element holds (R, RGB, CbYCr, ...)
//! - [`Transfer`] - Colorimetric encoding of the element
//! - [`Packing`] - How sub-word samples sit inside 32-bit words
//! - [`LogElement`] - One plane/channel-group description
//! - [`SourceFormat`] - DPX vs Cineon
//! - [`CodecError`] / [`Result`] - Shared error type for the whole workspace
//!
//! ## Crate Structure
//!
//! This crate is the foundation of the workspace and has no internal
//! dependencies:
//!
//! ```text
//! logimage-core (this crate)
//!    ^
//!    |
//!    +-- logimage-transfer (LUT / matrix math)
//!    +-- logimage-io (element codec, header layers, handle API)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod descriptor;
pub mod element;
pub mod error;
pub mod format;
pub mod packing;
pub mod sample;
pub mod transfer;

pub use descriptor::Descriptor;
pub use element::LogElement;
pub use error::{CodecError, Result};
pub use format::SourceFormat;
pub use packing::Packing;
pub use sample::{normalize, quantize};
pub use transfer::Transfer;
