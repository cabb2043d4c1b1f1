//! Common utilities for xfbin.
//!
//! This crate provides the primitives shared by the XFBIN crates:
//!
//! - [`BinaryReader`] - Bounds-checked big-endian reading from byte slices
//! - [`BinaryWriter`] - Big-endian output buffer with alignment and patching
//! - [`padding_for`] - Alignment arithmetic shared by both

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{padding_for, BinaryReader};
pub use writer::BinaryWriter;

/// Re-export zerocopy traits for fixed-layout headers
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Re-export memchr for byte searching
pub use memchr;
