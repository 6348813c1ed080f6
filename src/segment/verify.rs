// src/segment/verify.rs
use super::{sample_time, Extrapolation, Segment, SegmentSet};
use crate::record::{ContinuousFormat, RecordStamp, RecordView};

/// Checks record sequences against a [`SegmentSet`]
pub struct SegmentVerifier;

impl SegmentVerifier {
    /// True when `records` split into exactly the segments of `set`.
    pub fn verify(records: &RecordView<'_, ContinuousFormat>, set: &SegmentSet) -> bool {
        let stamps: Vec<RecordStamp> = records.stamps().collect();
        Self::verify_stamps(&stamps, set)
    }

    /// Same as [`verify`](Self::verify) over already extracted record stamps.
    ///
    /// Every record must sit within the set's tolerance of its extrapolated
    /// time, only a segment's last record may be partial, stored end times
    /// and sample counts must match, and every boundary must be entailed by
    /// a timing break or a partial record.
    pub fn verify_stamps(stamps: &[RecordStamp], set: &SegmentSet) -> bool {
        if stamps.is_empty() {
            return set.segments.is_empty();
        }

        let mut next_start = 0usize;
        let mut previous: Option<&Segment> = None;
        for segment in &set.segments {
            if segment.start_record_index != next_start
                || segment.end_record_index < segment.start_record_index
                || segment.end_record_index >= stamps.len()
            {
                return false;
            }
            if let Some(prev) = previous {
                if !Self::boundary_entailed(stamps, prev, segment.start_record_index, set) {
                    return false;
                }
            }
            if !Self::segment_conforms(&stamps[segment.records()], segment, set) {
                return false;
            }
            next_start = segment.end_record_index + 1;
            previous = Some(segment);
        }
        next_start == stamps.len()
    }

    fn expected_after(
        segment_start: u64,
        samples_through_prev: u64,
        prev: &RecordStamp,
        set: &SegmentSet,
    ) -> u64 {
        let micros = set.used_microseconds_per_sample;
        match set.extrapolation {
            Extrapolation::FromSegmentStart => sample_time(segment_start, samples_through_prev, micros),
            Extrapolation::FromPreviousRecord => {
                sample_time(prev.timestamp, u64::from(prev.valid_sample_count), micros)
            }
        }
    }

    fn segment_conforms(records: &[RecordStamp], segment: &Segment, set: &SegmentSet) -> bool {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return false;
        };
        if first.timestamp != segment.start_time {
            return false;
        }

        let mut samples = 0u64;
        for pair in records.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if !prev.is_full() {
                return false;
            }
            samples += u64::from(prev.valid_sample_count);
            let expected = Self::expected_after(segment.start_time, samples, prev, set);
            if cur.timestamp.abs_diff(expected) > set.gap_tolerance_micros {
                return false;
            }
        }

        let end_time = sample_time(
            last.timestamp,
            u64::from(last.valid_sample_count),
            set.used_microseconds_per_sample,
        );
        end_time == segment.end_time && samples + u64::from(last.valid_sample_count) == segment.sample_count
    }

    fn boundary_entailed(stamps: &[RecordStamp], prev: &Segment, next_start: usize, set: &SegmentSet) -> bool {
        let last = &stamps[prev.end_record_index];
        if !last.is_full() {
            return true;
        }
        let samples = prev.sample_count;
        let expected = Self::expected_after(prev.start_time, samples, last, set);
        stamps[next_start].timestamp.abs_diff(expected) > set.gap_tolerance_micros
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentBuilder;

    fn run(start: u64, count: usize, micros: f64) -> Vec<RecordStamp> {
        (0..count)
            .map(|k| RecordStamp::full(sample_time(start, k as u64 * 512, micros), 1, 32_000.0))
            .collect()
    }

    fn gap_set(stamps: &[RecordStamp]) -> SegmentSet {
        SegmentBuilder::observed_rate_gap_scan(stamps, 31.25, 6)
    }

    #[test]
    fn test_self_verification() {
        let stamps = run(1_000, 20, 31.25);
        let set = gap_set(&stamps);
        assert_eq!(set.len(), 1);
        assert!(SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn test_rejects_different_segment_count() {
        let single = run(1_000, 6, 31.25);
        let mut split = run(1_000, 3, 31.25);
        split.extend(run(10_000_000, 3, 31.25));

        let single_set = gap_set(&single);
        let split_set = gap_set(&split);
        assert_eq!(split_set.len(), 2);

        assert!(!SegmentVerifier::verify_stamps(&split, &single_set));
        assert!(!SegmentVerifier::verify_stamps(&single, &split_set));
        assert!(SegmentVerifier::verify_stamps(&split, &split_set));
    }

    #[test]
    fn test_identical_structure_verifies() {
        let a = run(5_000, 8, 31.25);
        let b = a.clone();
        assert!(SegmentVerifier::verify_stamps(&b, &gap_set(&a)));
    }

    #[test]
    fn test_rejects_unentailed_boundary() {
        let stamps = run(0, 4, 31.25);
        let mut set = gap_set(&stamps);
        let whole = set.segments[0];
        set.segments = vec![
            Segment {
                start_record_index: 0,
                end_record_index: 1,
                start_time: whole.start_time,
                end_time: stamps[2].timestamp,
                sample_count: 1024,
            },
            Segment {
                start_record_index: 2,
                end_record_index: 3,
                start_time: stamps[2].timestamp,
                end_time: whole.end_time,
                sample_count: 1024,
            },
        ];
        assert!(!SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn test_rejects_partial_record_mid_segment() {
        let mut stamps = run(0, 3, 31.25);
        let set = gap_set(&stamps);
        stamps[1].valid_sample_count = 10;
        assert!(!SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn test_rejects_shorter_or_longer_sequences() {
        let stamps = run(0, 5, 31.25);
        let set = gap_set(&stamps);
        assert!(!SegmentVerifier::verify_stamps(&stamps[..4], &set));
        let mut longer = stamps.clone();
        longer.extend(run(5 * 16_000, 1, 31.25));
        assert!(!SegmentVerifier::verify_stamps(&longer, &set));
    }

    #[test]
    fn test_empty() {
        let set = SegmentSet::new(31.25, 6, Extrapolation::FromPreviousRecord);
        assert!(SegmentVerifier::verify_stamps(&[], &set));
        assert!(!SegmentVerifier::verify_stamps(&run(0, 1, 31.25), &set));
    }

    #[test]
    fn test_rejects_other_rate() {
        let stamps = run(0, 4, 31.25);
        let mut set = gap_set(&stamps);
        set.used_microseconds_per_sample = 35.0;
        set.used_sample_rate = 1e6 / 35.0;
        assert!(!SegmentVerifier::verify_stamps(&stamps, &set));
    }
}
