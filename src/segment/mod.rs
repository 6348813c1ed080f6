// src/segment/mod.rs
//! Gap-free runs of continuous records.
//!
//! Header-declared sampling frequencies are frequently rounded or missing, and
//! recordings can pause and resume within one file. [`SegmentBuilder`] works
//! out the sample interval actually used and splits the record sequence into
//! [`Segment`]s; [`SegmentVerifier`] checks a record sequence against an
//! existing [`SegmentSet`].

mod builder;
mod verify;

pub use builder::{GapScan, SegmentBuilder};
pub use verify::SegmentVerifier;

use std::ops::RangeInclusive;

/// Time of the sample `samples` positions after `start`, rounded to whole
/// microseconds. Saturates at `u64::MAX`.
pub fn sample_time(start: u64, samples: u64, micros_per_sample: f64) -> u64 {
    start.saturating_add((samples as f64 * micros_per_sample).round() as u64)
}

/// How the expected timestamp of the next record is extrapolated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// From the first record of the segment and every sample since.
    FromSegmentStart,
    /// From the previous record's timestamp and its valid samples.
    FromPreviousRecord,
}

/// One maximal run of timing-consistent records. Record indices are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_record_index: usize,
    pub end_record_index: usize,
    /// Timestamp of the first record.
    pub start_time: u64,
    /// Timestamp of the last record plus the duration of its valid samples.
    pub end_time: u64,
    /// Valid samples in the segment.
    pub sample_count: u64,
}

impl Segment {
    pub fn record_count(&self) -> usize {
        self.end_record_index - self.start_record_index + 1
    }

    pub fn records(&self) -> RangeInclusive<usize> {
        self.start_record_index..=self.end_record_index
    }

    pub fn duration_micros(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Segments of one file together with the sample interval that produced them
#[derive(Debug, Clone)]
pub struct SegmentSet {
    pub segments: Vec<Segment>,
    pub used_sample_rate: f64,
    pub used_microseconds_per_sample: f64,
    /// Deviation accepted as jitter; not part of equality.
    pub gap_tolerance_micros: u64,
    /// Extrapolation the segments were built with; not part of equality.
    pub extrapolation: Extrapolation,
}

impl PartialEq for SegmentSet {
    fn eq(&self, other: &Self) -> bool {
        self.used_sample_rate == other.used_sample_rate
            && self.used_microseconds_per_sample == other.used_microseconds_per_sample
            && self.segments == other.segments
    }
}

impl SegmentSet {
    pub fn new(micros_per_sample: f64, gap_tolerance_micros: u64, extrapolation: Extrapolation) -> Self {
        SegmentSet {
            segments: Vec::new(),
            used_sample_rate: 1e6 / micros_per_sample,
            used_microseconds_per_sample: micros_per_sample,
            gap_tolerance_micros,
            extrapolation,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_samples(&self) -> u64 {
        self.segments.iter().map(|s| s.sample_count).sum()
    }

    /// Segments are ordered and each starts right after the previous one ends.
    pub fn is_contiguous(&self) -> bool {
        self.segments.first().map_or(true, |s| s.start_record_index == 0)
            && self.segments.iter().all(|s| s.end_record_index >= s.start_record_index)
            && self
                .segments
                .windows(2)
                .all(|w| w[0].end_record_index + 1 == w[1].start_record_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: usize, end: usize, t0: u64, t1: u64, n: u64) -> Segment {
        Segment {
            start_record_index: start,
            end_record_index: end,
            start_time: t0,
            end_time: t1,
            sample_count: n,
        }
    }

    fn set_of(micros: f64, segments: Vec<Segment>) -> SegmentSet {
        let mut set = SegmentSet::new(micros, 1, Extrapolation::FromPreviousRecord);
        set.segments = segments;
        set
    }

    #[test]
    fn test_equality_is_structural() {
        let a = set_of(1.0, Vec::new());
        let b = set_of(1.0, Vec::new());
        assert_eq!(a, b);

        let a = set_of(1.0, vec![seg(0, 0, 100, 100, 10)]);
        let mut b = set_of(1.0, vec![seg(0, 0, 100, 100, 10)]);
        b.gap_tolerance_micros = 50;
        b.extrapolation = Extrapolation::FromSegmentStart;
        assert_eq!(a, b);

        let mut more = a.clone();
        more.segments.push(seg(0, 0, 100, 100, 10));
        assert_ne!(a, more);

        let moved = set_of(1.0, vec![seg(0, 0, 200, 200, 10)]);
        assert_ne!(a, moved);

        let mut faster = a.clone();
        faster.used_sample_rate = 400.0;
        assert_ne!(a, faster);

        let mut slower = a.clone();
        slower.used_microseconds_per_sample = 2.0;
        assert_ne!(a, slower);
    }

    #[test]
    fn test_rate_fields_agree() {
        let set = SegmentSet::new(31.25, 6, Extrapolation::FromPreviousRecord);
        assert_eq!(set.used_sample_rate, 32_000.0);
        assert!(set.is_empty());
        assert!(set.is_contiguous());
    }

    #[test]
    fn test_contiguity() {
        let ok = set_of(1.0, vec![seg(0, 3, 0, 10, 4), seg(4, 9, 20, 30, 6)]);
        assert!(ok.is_contiguous());
        assert_eq!(ok.total_samples(), 10);
        assert_eq!(ok.segments[1].record_count(), 6);

        let hole = set_of(1.0, vec![seg(0, 3, 0, 10, 4), seg(5, 9, 20, 30, 6)]);
        assert!(!hole.is_contiguous());

        let late = set_of(1.0, vec![seg(1, 3, 0, 10, 4)]);
        assert!(!late.is_contiguous());
    }

    #[test]
    fn test_sample_time_rounds() {
        assert_eq!(sample_time(1_000, 512, 31.25), 17_000);
        assert_eq!(sample_time(0, 3, 41.666_666), 125);
    }
}
