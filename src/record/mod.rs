// src/record/mod.rs
//! Zero-copy access to the fixed-stride records following the header.
//!
//! A [`RecordView`] borrows the file body and hands out typed record views on
//! demand; nothing is decoded until a field accessor is called. The
//! [`MappedFile`] owner keeps the mapping alive for as long as any view
//! derived from it exists.
//!
//! # Examples
//!
//! ```
//! use nlx_rs::record::{ContinuousFormat, RecordView};
//!
//! let mut body = vec![0u8; 2 * ContinuousFormat::STRIDE];
//! body[0] = 0x10;
//! body[16] = 0x00;
//! body[17] = 0x02; // 512 valid samples
//!
//! let view = RecordView::new(&body, ContinuousFormat);
//! assert_eq!(view.len(), 2);
//! let rec = view.get(0).unwrap();
//! assert_eq!(rec.timestamp(), 0x10);
//! assert_eq!(rec.valid_sample_count(), 512);
//! assert!(view.get(2).is_err());
//! ```

mod layout;
mod mapped;

pub use layout::{
    ContinuousFormat, CscRecord, EventFormat, EventRecord, RecordStamp, SpikeFormat, SpikeRecord,
};
pub use mapped::MappedFile;

use crate::error::{NlxError, Result};
use std::ops::Range;

/// Layout of one record kind
pub trait RecordFormat: Copy {
    /// Borrowed view of one record
    type Record<'a>;

    /// Size of one record in bytes
    fn stride(&self) -> usize;

    /// Overlay a record view on exactly `stride()` bytes.
    fn overlay<'a>(&self, bytes: &'a [u8]) -> Self::Record<'a>;
}

/// Ordered, bounds-checked sequence of records over a borrowed buffer
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a, F: RecordFormat> {
    body: &'a [u8],
    format: F,
}

impl<'a, F: RecordFormat> RecordView<'a, F> {
    /// Overlay `format` on a record body. Trailing bytes that do not fill a
    /// whole record are not addressable.
    pub fn new(body: &'a [u8], format: F) -> Self {
        let stride = format.stride();
        let whole = if stride == 0 { 0 } else { body.len() / stride * stride };
        if whole != body.len() {
            log::warn!(
                "ignoring {} trailing bytes after the last complete record",
                body.len() - whole
            );
        }
        RecordView { body: &body[..whole], format }
    }

    pub fn len(&self) -> usize {
        match self.format.stride() {
            0 => 0,
            stride => self.body.len() / stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> F {
        self.format
    }

    /// Raw bytes of every addressable record.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.body
    }

    pub fn get(&self, index: usize) -> Result<F::Record<'a>> {
        let len = self.len();
        if index >= len {
            return Err(NlxError::OutOfRange { what: "record index", index, len });
        }
        let stride = self.format.stride();
        Ok(self.format.overlay(&self.body[index * stride..(index + 1) * stride]))
    }

    /// Sub-view over `range` of record indices.
    pub fn slice(&self, range: Range<usize>) -> Result<RecordView<'a, F>> {
        let len = self.len();
        if range.start > range.end {
            return Err(NlxError::OutOfRange { what: "record range start", index: range.start, len: range.end });
        }
        if range.end > len {
            return Err(NlxError::OutOfRange { what: "record range end", index: range.end, len });
        }
        let stride = self.format.stride();
        Ok(RecordView {
            body: &self.body[range.start * stride..range.end * stride],
            format: self.format,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = F::Record<'a>> + 'a
    where
        F: 'a,
    {
        let format = self.format;
        let stride = format.stride().max(1);
        self.body.chunks_exact(stride).map(move |chunk| format.overlay(chunk))
    }
}

impl<'a> RecordView<'a, ContinuousFormat> {
    /// Timing fields of every record, in order.
    pub fn stamps(&self) -> impl Iterator<Item = RecordStamp> + 'a {
        self.iter().map(|r| r.stamp())
    }
}
