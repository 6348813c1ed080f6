// src/session/table.rs
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Raw timestamps are microseconds.
pub const RAW_TIME_UNITS_PER_SECOND: f64 = 1e6;

/// Identity of one continuous channel: acquisition entity name and numeric id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey {
    pub name: String,
    pub id: u32,
}

impl ChannelKey {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        ChannelKey { name: name.into(), id }
    }
}

/// Continuous channels sharing one sampling rate
#[derive(Debug, Clone, PartialEq)]
pub struct SignalStream {
    pub id: usize,
    pub sampling_rate: f64,
    /// Indices into the session's signal channels.
    pub channels: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalChannel {
    pub key: ChannelKey,
    pub stream: usize,
    pub sampling_rate: f64,
    pub path: PathBuf,
    pub(crate) file: usize,
}

/// One sorted unit of one spike file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeChannel {
    /// `ch{entity}#{channel id}#{unit}`
    pub name: String,
    pub unit_id: u32,
    pub channel_id: u32,
    pub path: PathBuf,
}

/// One distinct `(event id, ttl)` pair of one event file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChannel {
    pub name: String,
    pub event_id: i16,
    pub ttl_input: i16,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSegment {
    pub start_time: u64,
    pub end_time: u64,
    pub sample_counts: BTreeMap<ChannelKey, u64>,
}

impl SessionSegment {
    pub fn start_seconds(&self) -> f64 {
        self.start_time as f64 / RAW_TIME_UNITS_PER_SECOND
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_time as f64 / RAW_TIME_UNITS_PER_SECOND
    }
}

/// Sample counts and time limits of every session segment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSegmentTable {
    segments: Vec<SessionSegment>,
}

impl SessionSegmentTable {
    pub(crate) fn new(segments: Vec<SessionSegment>) -> Self {
        SessionSegmentTable { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SessionSegment] {
        &self.segments
    }

    pub fn get(&self, segment: usize) -> Option<&SessionSegment> {
        self.segments.get(segment)
    }

    /// Valid samples of `channel` in `segment`; zero for a channel without data there.
    pub fn sample_count(&self, segment: usize, channel: &ChannelKey) -> Option<u64> {
        self.segments
            .get(segment)
            .map(|s| s.sample_counts.get(channel).copied().unwrap_or(0))
    }

    pub fn raw_limits(&self) -> Vec<(u64, u64)> {
        self.segments.iter().map(|s| (s.start_time, s.end_time)).collect()
    }

    pub fn second_limits(&self) -> Vec<(f64, f64)> {
        self.segments
            .iter()
            .map(|s| (s.start_seconds(), s.end_seconds()))
            .collect()
    }

    /// Start of the first and end of the last segment.
    pub fn global_limits(&self) -> Option<(u64, u64)> {
        Some((self.segments.first()?.start_time, self.segments.last()?.end_time))
    }

    pub(crate) fn extend_to(&mut self, earliest: u64, latest: u64) {
        if let Some(first) = self.segments.first_mut() {
            first.start_time = first.start_time.min(earliest);
        }
        if let Some(last) = self.segments.last_mut() {
            last.end_time = last.end_time.max(latest);
        }
    }
}
