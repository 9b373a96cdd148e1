//! Small helpers for the big-endian layouts used by Palm databases.
//!
//! [`ByteReader`] and [`ByteWriter`] extend any [`std::io::Read`] /
//! [`std::io::Write`] with fixed-width accessors. The `*_at` functions read
//! from a slice at an absolute offset and return `None` instead of panicking
//! when the field does not fit.

pub mod be;

pub use be::{ByteReader, ByteWriter, tag_at, u16_at, u32_at, u64_at};
