// src/lib.rs
//! # nlx-rs
//!
//! Reader for Neuralynx recording files: continuous signals (`.ncs`), spike
//! waveforms (`.nse`, `.nst`, `.ntt`) and events (`.nev`).
//!
//! ## Features
//!
//! - **Zero-copy**: records are read-only views over memory-mapped files
//! - **Segment reconstruction**: recording pauses are found from record
//!   timestamps, with rules chosen per acquisition system generation
//! - **Sessions**: a directory of files becomes one multi-channel,
//!   multi-segment dataset, optionally decoded in parallel
//!
//! ## Quick Start
//!
//! ### One continuous file
//!
//! ```rust,no_run
//! use nlx_rs::*;
//!
//! fn main() -> Result<()> {
//!     let file = MappedFile::open("CSC1.ncs")?;
//!     let header = HeaderParser::new().parse(file.header_bytes())?;
//!     let records = file.records(ContinuousFormat);
//!
//!     let segments = SegmentBuilder::build(&records, &header)?;
//!     println!(
//!         "{} records, {} segment(s) at {} Hz",
//!         records.len(),
//!         segments.len(),
//!         segments.used_sample_rate
//!     );
//!     assert!(SegmentVerifier::verify(&records, &segments));
//!     Ok(())
//! }
//! ```
//!
//! ### A whole session
//!
//! ```rust,no_run
//! use nlx_rs::*;
//!
//! fn main() -> Result<()> {
//!     let session = SessionAssembler::new(SessionOptions::new().parallel(true)).open("session_dir")?;
//!
//!     for channel in session.signal_channels() {
//!         println!("{} #{} at {} Hz", channel.key.name, channel.key.id, channel.sampling_rate);
//!     }
//!     for failure in session.failures() {
//!         eprintln!("{}", failure.error);
//!     }
//!     let records = session.signal_records(0, 0)?;
//!     println!("first segment holds {} records", records.len());
//!     Ok(())
//! }
//! ```

// Modules
pub mod error;
pub mod header;
pub mod record;
pub mod segment;
pub mod session;
pub mod types;

mod utils;

pub use error::{ErrorKind, NlxError, Result};

// Type exports
pub use types::{AcquisitionVariant, ConstructionStrategy, FileKind, GapTolerance, HeaderValue};

// Header exports
pub use header::{DateMode, HeaderParser, HeaderProperties, HEADER_SIZE};

// Record exports
pub use record::{
    ContinuousFormat, CscRecord, EventFormat, EventRecord, MappedFile, RecordFormat, RecordStamp,
    RecordView, SpikeFormat, SpikeRecord,
};

// Segment exports
pub use segment::{Segment, SegmentBuilder, SegmentSet, SegmentVerifier};

// Session exports
pub use session::{
    ChannelKey, FileFailure, Session, SessionAssembler, SessionOptions, SessionSegmentTable,
};

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use nlx_rs::prelude::*;
    //! ```

    pub use crate::error::{NlxError, Result};
    pub use crate::header::{DateMode, HeaderParser};
    pub use crate::record::{ContinuousFormat, MappedFile, RecordView};
    pub use crate::segment::{SegmentBuilder, SegmentSet, SegmentVerifier};
    pub use crate::session::{SessionAssembler, SessionOptions};
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
