// src/session/loader.rs
use super::table::ChannelKey;
use crate::error::Result;
use crate::header::{HeaderParser, HeaderProperties};
use crate::record::{ContinuousFormat, EventFormat, MappedFile, RecordStamp, SpikeFormat};
use crate::segment::{SegmentBuilder, SegmentSet};
use crate::types::FileKind;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

/// What one file contributes to a session
#[derive(Debug)]
pub(crate) enum FileContent {
    Continuous {
        key: ChannelKey,
        stamps: Vec<RecordStamp>,
        segments: SegmentSet,
    },
    Spike {
        entity: String,
        channel_id: u32,
        units: BTreeSet<u32>,
        span: Option<(u64, u64)>,
    },
    Event {
        entity: String,
        pairs: BTreeSet<(i16, i16)>,
        span: Option<(u64, u64)>,
    },
}

impl FileContent {
    /// Earliest and latest spike or event timestamp.
    pub fn span(&self) -> Option<(u64, u64)> {
        match self {
            FileContent::Continuous { .. } => None,
            FileContent::Spike { span, .. } | FileContent::Event { span, .. } => *span,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LoadedFile {
    pub mapped: MappedFile,
    pub header: HeaderProperties,
    pub content: FileContent,
}

impl LoadedFile {
    pub fn path(&self) -> &Path {
        self.mapped.path()
    }
}

fn entity_name(header: &HeaderProperties, path: &Path) -> String {
    header
        .channel_names()
        .first()
        .cloned()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

fn widen(span: Option<(u64, u64)>, t: u64) -> Option<(u64, u64)> {
    Some(match span {
        None => (t, t),
        Some((lo, hi)) => (lo.min(t), hi.max(t)),
    })
}

/// Map one file, parse its header and decode what the session needs from
/// its records. `None` for a file holding only its header.
pub(crate) fn load(path: &Path, kind: FileKind, parser: HeaderParser) -> Result<Option<LoadedFile>> {
    let mapped = MappedFile::open(path)?;
    if mapped.has_no_records() {
        log::info!("{} holds no records, skipping", path.display());
        return Ok(None);
    }
    let header = parser.parse(mapped.header_bytes())?;

    let content = match kind {
        FileKind::Continuous => {
            let stamps: Vec<RecordStamp> = mapped.records(ContinuousFormat).stamps().collect();
            let segments = SegmentBuilder::build_from_stamps(&stamps, &header)?;
            let id = header
                .channel_ids()
                .first()
                .copied()
                .or_else(|| stamps.first().map(|s| s.channel_number))
                .unwrap_or_default();
            FileContent::Continuous {
                key: ChannelKey::new(entity_name(&header, path), id),
                stamps,
                segments,
            }
        }
        FileKind::Spike { subchannels } => {
            let format = SpikeFormat::new(header.waveform_length(), usize::from(subchannels));
            let records = mapped.records(format);
            let mut units = BTreeSet::new();
            let mut span = None;
            for rec in records.iter() {
                units.insert(rec.unit_id());
                span = widen(span, rec.timestamp());
            }
            let channel_id = header
                .channel_ids()
                .first()
                .copied()
                .or_else(|| records.iter().next().map(|r| r.channel_number()))
                .unwrap_or_default();
            FileContent::Spike { entity: entity_name(&header, path), channel_id, units, span }
        }
        FileKind::Event => {
            let mut pairs = BTreeSet::new();
            let mut span = None;
            for rec in mapped.records(EventFormat).iter() {
                pairs.insert((rec.event_id(), rec.ttl_input()));
                span = widen(span, rec.timestamp());
            }
            FileContent::Event { entity: entity_name(&header, path), pairs, span }
        }
    };

    Ok(Some(LoadedFile { mapped, header, content }))
}

pub(crate) type LoadResult = Result<Option<LoadedFile>>;

/// Load every file, in input order.
pub(crate) fn load_all(jobs: &[(PathBuf, FileKind)], parser: HeaderParser, parallel: bool) -> Vec<LoadResult> {
    if !parallel || jobs.len() < 2 {
        return jobs.iter().map(|(path, kind)| load(path, *kind, parser)).collect();
    }

    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(jobs.len());
    log::debug!("loading {} files on {} worker threads", jobs.len(), workers);

    let (job_tx, job_rx) = crossbeam_channel::bounded::<usize>(jobs.len());
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, LoadResult)>();
    for index in 0..jobs.len() {
        // Capacity covers every job and the receiver is alive.
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for index in job_rx.iter() {
                    let (path, kind) = &jobs[index];
                    if done_tx.send((index, load(path, *kind, parser))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(done_tx);

    let mut done: Vec<(usize, LoadResult)> = done_rx.iter().collect();
    done.sort_by_key(|(index, _)| *index);
    done.into_iter().map(|(_, result)| result).collect()
}
