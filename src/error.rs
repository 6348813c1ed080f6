// src/error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NlxError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed header: {0}")]
    Header(String),

    #[error("No recording open/close date found in header")]
    MissingDate,

    #[error("Out of range: {what} {index} exceeds length {len}")]
    OutOfRange { what: &'static str, index: usize, len: usize },

    #[error("Inconsistent records at index {index}: {reason}")]
    InconsistentRecords { index: usize, reason: String },

    #[error("Cannot determine sampling rate: {0}")]
    UnknownSampleRate(String),

    #[error("Invalid session path: {0}")]
    InvalidPath(String),

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<NlxError>,
    },
}

/// Coarse classification of an [`NlxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Header,
    MissingDate,
    OutOfRange,
    InconsistentRecords,
    UnknownSampleRate,
    InvalidPath,
}

impl NlxError {
    /// Taxonomy of this error, looking through any file wrapper.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NlxError::Io(_) => ErrorKind::Io,
            NlxError::Header(_) => ErrorKind::Header,
            NlxError::MissingDate => ErrorKind::MissingDate,
            NlxError::OutOfRange { .. } => ErrorKind::OutOfRange,
            NlxError::InconsistentRecords { .. } => ErrorKind::InconsistentRecords,
            NlxError::UnknownSampleRate(_) => ErrorKind::UnknownSampleRate,
            NlxError::InvalidPath(_) => ErrorKind::InvalidPath,
            NlxError::File { source, .. } => source.kind(),
        }
    }

    /// Attach the offending file path. Already-wrapped errors are left alone.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            wrapped @ NlxError::File { .. } => wrapped,
            other => NlxError::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Path of the offending file, if known.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            NlxError::File { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NlxError>;
