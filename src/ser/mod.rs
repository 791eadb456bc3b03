//! Canonical serialization helpers for the commitment engine.
//!
//! The helpers in this module implement the little-endian layouts used by the
//! tree and path codecs. They provide a shared vocabulary for encoding and
//! decoding primitive values with structured error context.

mod bytes;
mod cursor;
mod error;
mod felt;
mod ints;

pub use bytes::ensure_consumed;
pub use cursor::ByteReader;
pub use error::{SerError, SerKind, SerResult};
pub use felt::{read_felt, write_felt};
pub use ints::{
    ensure_u32, read_bool, read_u16, read_u32, read_u64, read_u8, write_bool, write_u16, write_u32,
    write_u64, write_u8,
};
