//! Turns the raw bytes of a downloaded archive into files on disk.
//!
//! Decoding and writing are split: [`decode`] produces an
//! [`EntrySource`] that yields entries lazily, and [`materialize`] consumes
//! any [`EntrySource`] and writes it beneath a destination root, refusing
//! entries whose path would land outside of that root.

mod decode;
mod error;
mod materialize;
pub mod path;

pub use decode::{ArchiveEntry, EntrySource, ZipDecoder, decode};
pub use error::{DecodeError, MaterializeError};
pub use materialize::{MaterializeSummary, materialize};
