// src/session/mod.rs
//! Assembling every file of one recording session into a single view.
//!
//! A session is a directory of `.ncs`, `.nse`/`.nst`/`.ntt` and `.nev`
//! files. Each file is mapped and decoded on its own; the per-file segment
//! sets are then merged so that a pause in any channel becomes a session
//! segment boundary.
//!
//! ```no_run
//! use nlx_rs::session::{SessionAssembler, SessionOptions};
//!
//! let session = SessionAssembler::new(
//!     SessionOptions::new().exclude_filenames(["CSC2.ncs"]).parallel(true),
//! )
//! .open("data/session")?;
//!
//! for (i, (start, end)) in session.segment_table().second_limits().iter().enumerate() {
//!     println!("segment {i}: {start:.3}s .. {end:.3}s");
//! }
//! # Ok::<(), nlx_rs::NlxError>(())
//! ```

mod filter;
mod loader;
mod merge;
mod table;

pub use filter::FileFilter;
pub use table::{
    ChannelKey, EventChannel, SessionSegment, SessionSegmentTable, SignalChannel, SignalStream,
    SpikeChannel, RAW_TIME_UNITS_PER_SECOND,
};

use crate::error::{NlxError, Result};
use crate::header::{DateMode, HeaderParser, HeaderProperties};
use crate::record::{ContinuousFormat, RecordView};
use crate::segment::SegmentSet;
use crate::types::FileKind;
use loader::{FileContent, LoadedFile};
use merge::ChannelTiming;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Options controlling how a session is assembled
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    filter: FileFilter,
    date_mode: DateMode,
    strict: bool,
    parallel: bool,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only assemble files with these basenames.
    pub fn include_filenames<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = self.filter.include(names);
        self
    }

    /// Never assemble files with these basenames, even when included.
    pub fn exclude_filenames<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = self.filter.exclude(names);
        self
    }

    pub fn date_mode(mut self, mode: DateMode) -> Self {
        self.date_mode = mode;
        self
    }

    /// Fail the whole session on the first file that fails.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Decode files on worker threads.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }
}

/// A file that could not be decoded
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    /// Always [`NlxError::File`] naming `path`.
    pub error: NlxError,
}

/// Builds a [`Session`] from a directory or a single file
#[derive(Debug, Clone, Default)]
pub struct SessionAssembler {
    options: SessionOptions,
}

impl SessionAssembler {
    pub fn new(options: SessionOptions) -> Self {
        SessionAssembler { options }
    }

    /// Assemble the session at `path`. A file path assembles that file alone
    /// within its directory.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Session> {
        let path = path.as_ref();
        let (root, filter) = if path.is_dir() {
            (path.to_path_buf(), self.options.filter.clone())
        } else if path.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| NlxError::InvalidPath(path.display().to_string()))?;
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (root, self.options.filter.clone().only(name))
        } else {
            return Err(NlxError::InvalidPath(path.display().to_string()));
        };

        let jobs = session_files(&root, &filter)?;
        log::info!("assembling {} file(s) from {}", jobs.len(), root.display());

        let parser = HeaderParser::new().date_mode(self.options.date_mode);
        let results = loader::load_all(&jobs, parser, self.options.parallel);

        let mut files = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for ((path, _), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(e) => {
                    let error = e.in_file(&path);
                    if self.options.strict {
                        return Err(error);
                    }
                    log::warn!("skipping {}", error);
                    failures.push(FileFailure { path, error });
                }
            }
        }

        Ok(Session::assemble(root, files, failures))
    }
}

/// Recording files admitted by `filter`, sorted by path.
fn session_files(root: &Path, filter: &FileFilter) -> Result<Vec<(PathBuf, FileKind)>> {
    let mut jobs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(kind) = FileKind::from_path(&path) else { continue };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        if !filter.admits(name) {
            log::debug!("{} filtered out", name);
            continue;
        }
        jobs.push((path, kind));
    }
    jobs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(jobs)
}

/// Every admitted file of one recording, merged into common segments
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    files: Vec<LoadedFile>,
    streams: Vec<SignalStream>,
    signal_channels: Vec<SignalChannel>,
    spike_channels: Vec<SpikeChannel>,
    event_channels: Vec<EventChannel>,
    table: SessionSegmentTable,
    /// Record range of each signal channel in each session segment.
    signal_ranges: Vec<Vec<Range<usize>>>,
    failures: Vec<FileFailure>,
}

impl Session {
    fn assemble(root: PathBuf, files: Vec<LoadedFile>, failures: Vec<FileFailure>) -> Session {
        let mut streams: Vec<SignalStream> = Vec::new();
        let mut signal_channels = Vec::new();
        let mut spike_channels = Vec::new();
        let mut event_channels = Vec::new();
        let mut timings = Vec::new();
        let mut span: Option<(u64, u64)> = None;

        for (index, file) in files.iter().enumerate() {
            let path = file.path().to_path_buf();
            match &file.content {
                FileContent::Continuous { key, stamps, segments } => {
                    if signal_channels.iter().any(|c: &SignalChannel| &c.key == key) {
                        log::warn!("{} repeats channel {} #{}", path.display(), key.name, key.id);
                    }
                    let rate = segments.used_sample_rate;
                    let stream = match streams.iter().position(|s| s.sampling_rate == rate) {
                        Some(s) => s,
                        None => {
                            streams.push(SignalStream { id: streams.len(), sampling_rate: rate, channels: Vec::new() });
                            streams.len() - 1
                        }
                    };
                    streams[stream].channels.push(signal_channels.len());
                    signal_channels.push(SignalChannel {
                        key: key.clone(),
                        stream,
                        sampling_rate: rate,
                        path,
                        file: index,
                    });
                    timings.push(ChannelTiming { key, stamps, segments });
                }
                FileContent::Spike { entity, channel_id, units, .. } => {
                    spike_channels.extend(units.iter().map(|&unit| SpikeChannel {
                        name: format!("ch{entity}#{channel_id}#{unit}"),
                        unit_id: unit,
                        channel_id: *channel_id,
                        path: path.clone(),
                    }));
                }
                FileContent::Event { entity, pairs, .. } => {
                    event_channels.extend(pairs.iter().map(|&(event_id, ttl_input)| EventChannel {
                        name: format!("{entity} event_id={event_id} ttl={ttl_input}"),
                        event_id,
                        ttl_input,
                        path: path.clone(),
                    }));
                }
            }
            if let Some((lo, hi)) = file.content.span() {
                span = Some(span.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
            }
        }

        let boundaries = merge::boundaries(&timings);
        let (segments, signal_ranges) = merge::split(&timings, &boundaries);

        let mut table = SessionSegmentTable::new(segments);
        if let Some((lo, hi)) = span {
            if table.is_empty() {
                table = SessionSegmentTable::new(vec![SessionSegment {
                    start_time: lo,
                    end_time: hi,
                    ..Default::default()
                }]);
            } else {
                table.extend_to(lo, hi);
            }
        }

        log::info!(
            "session has {} segment(s), {} signal, {} spike and {} event channel(s)",
            table.len(),
            signal_channels.len(),
            spike_channels.len(),
            event_channels.len()
        );

        Session {
            root,
            files,
            streams,
            signal_channels,
            spike_channels,
            event_channels,
            table,
            signal_ranges,
            failures,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn segment_count(&self) -> usize {
        self.table.len()
    }

    pub fn segment_table(&self) -> &SessionSegmentTable {
        &self.table
    }

    pub fn signal_streams(&self) -> &[SignalStream] {
        &self.streams
    }

    pub fn signal_channels(&self) -> &[SignalChannel] {
        &self.signal_channels
    }

    pub fn spike_channels(&self) -> &[SpikeChannel] {
        &self.spike_channels
    }

    pub fn event_channels(&self) -> &[EventChannel] {
        &self.event_channels
    }

    /// Files that failed to decode; empty in strict mode.
    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    /// Parsed header of every assembled file.
    pub fn headers(&self) -> impl Iterator<Item = (&Path, &HeaderProperties)> {
        self.files.iter().map(|f| (f.path(), &f.header))
    }

    /// Per-file segments of a signal channel.
    pub fn segment_set(&self, channel: usize) -> Option<&SegmentSet> {
        let file = &self.files[self.signal_channels.get(channel)?.file];
        match &file.content {
            FileContent::Continuous { segments, .. } => Some(segments),
            _ => None,
        }
    }

    /// Records of signal channel `channel` inside session segment `segment`.
    pub fn signal_records(&self, channel: usize, segment: usize) -> Result<RecordView<'_, ContinuousFormat>> {
        let descriptor = self.signal_channels.get(channel).ok_or(NlxError::OutOfRange {
            what: "signal channel",
            index: channel,
            len: self.signal_channels.len(),
        })?;
        let len = self.table.len();
        let range = self
            .signal_ranges
            .get(channel)
            .and_then(|ranges| ranges.get(segment))
            .ok_or(NlxError::OutOfRange { what: "session segment", index: segment, len })?;
        self.files[descriptor.file]
            .mapped
            .records(ContinuousFormat)
            .slice(range.clone())
    }
}
