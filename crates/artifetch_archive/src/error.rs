use std::{path::PathBuf, sync::Arc};

use miette::Diagnostic;
use thiserror::Error;

/// Errors that occur while reading an archive.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum DecodeError {
    #[error("invalid zip archive: {0}")]
    InvalidArchive(String),

    #[error("failed to read entry #{index} of the archive: {message}")]
    EntryHeader { index: usize, message: String },

    #[error("failed to read the contents of '{name}'")]
    Entry {
        name: String,
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors emitted while writing archive entries to disk.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum MaterializeError {
    #[error("entry '{entry}' would be extracted outside of {}", root.display())]
    #[diagnostic(help("the archive contains absolute paths or `..` components"))]
    PathTraversal { entry: String, root: PathBuf },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Decode(#[from] DecodeError),
}

impl MaterializeError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
