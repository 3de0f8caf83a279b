use std::{fmt, io::Cursor, io::Read};

use bytes::Bytes;
use zip::ZipArchive;

use crate::error::DecodeError;

/// A single file or directory record of an archive.
///
/// The content reader borrows from the archive it was decoded from, so an
/// entry has to be consumed before the next one can be requested.
pub struct ArchiveEntry<'a> {
    /// The path exactly as stored in the archive. It has not been validated.
    pub path: String,
    pub is_dir: bool,
    /// Unix permission bits, if the archive recorded them.
    pub mode: Option<u32>,
    pub content: Box<dyn Read + 'a>,
}

impl fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("is_dir", &self.is_dir)
            .field("mode", &self.mode.map(|mode| format!("{mode:o}")))
            .finish_non_exhaustive()
    }
}

/// A lazy, lending sequence of archive entries.
pub trait EntrySource {
    /// Returns the next entry in container order, or `None` once the
    /// archive is exhausted.
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>, DecodeError>>;
}

/// Decodes zip containers held in memory.
pub struct ZipDecoder {
    archive: ZipArchive<Cursor<Bytes>>,
    next: usize,
}

/// Parses the central directory of a zip archive held in `bytes`.
///
/// Only the directory is read up front, the entries themselves are
/// decompressed when their content is read.
pub fn decode(bytes: Bytes) -> Result<ZipDecoder, DecodeError> {
    let archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| DecodeError::InvalidArchive(err.to_string()))?;
    Ok(ZipDecoder { archive, next: 0 })
}

impl ZipDecoder {
    /// Total number of entries in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

impl EntrySource for ZipDecoder {
    fn next_entry(&mut self) -> Option<Result<ArchiveEntry<'_>, DecodeError>> {
        if self.next >= self.archive.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let entry = self
            .archive
            .by_index(index)
            .map(|file| ArchiveEntry {
                path: file.name().to_string(),
                is_dir: file.is_dir(),
                mode: file.unix_mode(),
                content: Box::new(file),
            })
            .map_err(|err| DecodeError::EntryHeader {
                index,
                message: err.to_string(),
            });
        Some(entry)
    }
}
