// src/record/mapped.rs
use super::{RecordFormat, RecordView};
use crate::error::{NlxError, Result};
use crate::header::HEADER_SIZE;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read-only memory mapping of one recording file.
///
/// The mapping is released when this value is dropped; record views borrow
/// from it and cannot outlive it.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    mmap: Mmap,
}

impl MappedFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < HEADER_SIZE as u64 {
            return Err(NlxError::Header(format!(
                "file is {} bytes, shorter than the {} byte header",
                len, HEADER_SIZE
            )));
        }
        // SAFETY: the mapping is read-only; concurrent truncation of the file
        // by another process is outside what this reader guards against.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(MappedFile { path: path.to_path_buf(), mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// True when the file holds nothing but its header.
    pub fn has_no_records(&self) -> bool {
        self.mmap.len() <= HEADER_SIZE
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.mmap[..HEADER_SIZE]
    }

    pub fn body(&self) -> &[u8] {
        &self.mmap[HEADER_SIZE..]
    }

    pub fn records<F: RecordFormat>(&self, format: F) -> RecordView<'_, F> {
        RecordView::new(self.body(), format)
    }
}
