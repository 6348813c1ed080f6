// src/session/merge.rs
//! Union of per-channel segment boundaries into session segments.

use super::table::{ChannelKey, SessionSegment};
use crate::record::RecordStamp;
use crate::segment::{sample_time, SegmentSet};
use std::ops::Range;

/// Timing of one continuous channel
pub(crate) struct ChannelTiming<'a> {
    pub key: &'a ChannelKey,
    pub stamps: &'a [RecordStamp],
    pub segments: &'a SegmentSet,
}

/// Sorted start and end times of every channel segment. Points closer than
/// the largest gap tolerance collapse onto the earliest of them.
pub(crate) fn boundaries(channels: &[ChannelTiming<'_>]) -> Vec<u64> {
    let tolerance = channels
        .iter()
        .map(|c| c.segments.gap_tolerance_micros)
        .max()
        .unwrap_or(0)
        .max(1);

    let mut points: Vec<u64> = channels
        .iter()
        .flat_map(|c| c.segments.segments.iter())
        .flat_map(|s| [s.start_time, s.end_time])
        .collect();
    points.sort_unstable();

    let mut kept: Vec<u64> = Vec::with_capacity(points.len());
    for p in points {
        match kept.last() {
            Some(&last) if p - last < tolerance => {}
            _ => kept.push(p),
        }
    }
    kept
}

/// Split every channel at the session boundaries. Intervals with no samples
/// in any channel are dropped; for each kept segment the record range of
/// every channel is returned alongside.
pub(crate) fn split(
    channels: &[ChannelTiming<'_>],
    boundaries: &[u64],
) -> (Vec<SessionSegment>, Vec<Vec<Range<usize>>>) {
    let mut segments = Vec::new();
    let mut ranges: Vec<Vec<Range<usize>>> = vec![Vec::new(); channels.len()];

    let intervals = boundaries.len().saturating_sub(1).max(1);
    let final_interval = boundaries.len().saturating_sub(2);
    for (i, &lo) in boundaries.iter().enumerate().take(intervals) {
        // The final interval is open ended so that no trailing record is lost.
        let hi = if i >= final_interval { u64::MAX } else { boundaries[i + 1] };

        let picked: Vec<Range<usize>> = channels
            .iter()
            .map(|c| {
                let start = c.stamps.partition_point(|s| s.timestamp < lo);
                let end = c.stamps.partition_point(|s| s.timestamp < hi).max(start);
                start..end
            })
            .collect();
        if picked.iter().all(|r| r.is_empty()) {
            continue;
        }

        let mut segment = SessionSegment {
            start_time: u64::MAX,
            end_time: 0,
            ..Default::default()
        };
        for (channel, range) in channels.iter().zip(&picked) {
            let records = &channel.stamps[range.clone()];
            let count: u64 = records.iter().map(|s| u64::from(s.valid_sample_count)).sum();
            *segment.sample_counts.entry(channel.key.clone()).or_insert(0) += count;

            if let (Some(first), Some(last)) = (records.first(), records.last()) {
                segment.start_time = segment.start_time.min(first.timestamp);
                let end = sample_time(
                    last.timestamp,
                    u64::from(last.valid_sample_count),
                    channel.segments.used_microseconds_per_sample,
                );
                segment.end_time = segment.end_time.max(end);
            }
        }
        for (all, range) in ranges.iter_mut().zip(picked) {
            all.push(range);
        }
        segments.push(segment);
    }
    (segments, ranges)
}
