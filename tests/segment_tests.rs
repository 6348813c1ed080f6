// tests/segment_tests.rs
mod common;

use common::*;
use nlx_rs::*;
use proptest::prelude::*;
use tempfile::TempDir;

fn build_file(header: &str, stamps: &[RecordStamp]) -> (TempDir, SegmentSet) {
    let dir = TempDir::new().unwrap();
    let path = write_ncs(dir.path(), "CSC1.ncs", header, stamps);
    let file = MappedFile::open(&path).unwrap();
    let header = HeaderParser::new().parse(file.header_bytes()).unwrap();
    let set = SegmentBuilder::build(&file.records(ContinuousFormat), &header).unwrap();
    (dir, set)
}

#[test]
fn test_pre4_file_at_35_micros() {
    // 28571 Hz declared, 35 us actual.
    let stamps = run(3_000_000, 10, 35.0, 13);
    let (_dir, set) = build_file(&pre4_csc_header("CSC14", 28571), &stamps);

    assert_eq!(set.used_microseconds_per_sample, 35.0);
    assert_eq!(set.len(), 1);
    assert_eq!(set.segments[0].start_record_index, 0);
    assert_eq!(set.segments[0].end_record_index, 9);
    assert_eq!(set.segments[0].end_time, 3_000_000 + 10 * 512 * 35);
}

#[test]
fn test_sx_file_with_pause() {
    let mut stamps = run(1_000_000, 6, SX_MICROS, 0);
    stamps.extend(run(2_000_000, 4, SX_MICROS, 0));
    let (_dir, set) = build_file(&sx_csc_header("CSC1", 0), &stamps);

    assert_eq!(set.used_sample_rate, 32_000.0);
    assert_eq!(set.len(), 2);
    assert_eq!(set.segments[0].end_record_index, 5);
    assert_eq!(set.segments[1].start_record_index, 6);
    assert_eq!(set.segments[1].start_time, 2_000_000);
    assert_eq!(set.total_samples(), 10 * 512);
}

#[test]
fn test_mapped_records_verify_against_their_own_segments() {
    let dir = TempDir::new().unwrap();
    let mut stamps = run(0, 8, SX_MICROS, 0);
    stamps[7].valid_sample_count = 100;
    stamps.extend(run(8 * SX_RECORD_MICROS, 3, SX_MICROS, 0));
    let path = write_ncs(dir.path(), "CSC1.ncs", &sx_csc_header("CSC1", 0), &stamps);

    let file = MappedFile::open(&path).unwrap();
    let header = HeaderParser::new().parse_file(&path).unwrap();
    let records = file.records(ContinuousFormat);
    let set = SegmentBuilder::build(&records, &header).unwrap();

    // The partial record seals the first segment.
    assert_eq!(set.len(), 2);
    assert_eq!(set.segments[0].sample_count, 7 * 512 + 100);
    assert!(SegmentVerifier::verify(&records, &set));

    let whole = file.records(ContinuousFormat).slice(0..8).unwrap();
    assert!(!SegmentVerifier::verify(&whole, &set));
}

#[test]
fn test_mixed_channel_file_is_inconsistent() {
    let dir = TempDir::new().unwrap();
    let mut stamps = run(0, 4, SX_MICROS, 0);
    stamps[2].channel_number = 5;
    let path = write_ncs(dir.path(), "CSC1.ncs", &sx_csc_header("CSC1", 0), &stamps);

    let file = MappedFile::open(&path).unwrap();
    let header = HeaderParser::new().parse(file.header_bytes()).unwrap();
    let err = SegmentBuilder::build(&file.records(ContinuousFormat), &header).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InconsistentRecords);
}

#[test]
fn test_header_only_file_has_no_segments() {
    let (_dir, set) = build_file(&sx_csc_header("CSC1", 0), &[]);
    assert!(set.is_empty());
    assert_eq!(set.used_sample_rate, 32_000.0);
}

/// Record stamps of runs separated by gaps far beyond any tolerance.
fn runs_strategy() -> impl Strategy<Value = (Vec<RecordStamp>, usize)> {
    prop::collection::vec((1usize..20, 1u64..1_000), 1..6).prop_map(|runs| {
        let mut stamps = Vec::new();
        let mut start = 10_000u64;
        for &(count, pause_ms) in &runs {
            stamps.extend(run(start, count, SX_MICROS, 0));
            start += count as u64 * SX_RECORD_MICROS + pause_ms * 1_000;
        }
        (stamps, runs.len())
    })
}

proptest! {
    #[test]
    fn prop_segments_are_contiguous((stamps, runs) in runs_strategy()) {
        let set = SegmentBuilder::observed_rate_gap_scan(&stamps, SX_MICROS, 6);
        prop_assert!(set.is_contiguous());
        prop_assert_eq!(set.len(), runs);
        prop_assert_eq!(set.segments.last().map(|s| s.end_record_index), Some(stamps.len() - 1));
        prop_assert_eq!(set.total_samples(), stamps.len() as u64 * 512);
    }

    #[test]
    fn prop_built_sets_verify((stamps, _) in runs_strategy()) {
        let set = SegmentBuilder::observed_rate_gap_scan(&stamps, SX_MICROS, 6);
        prop_assert!(SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn prop_jitter_within_tolerance_keeps_one_segment(
        count in 2usize..40,
        jitter in prop::collection::vec(-6i64..=6, 40),
    ) {
        let stamps: Vec<RecordStamp> = run(1_000_000, count, SX_MICROS, 0)
            .into_iter()
            .enumerate()
            .map(|(i, mut s)| {
                if i > 0 {
                    s.timestamp = s.timestamp.saturating_add_signed(jitter[i] / 2);
                }
                s
            })
            .collect();
        let set = SegmentBuilder::observed_rate_gap_scan(&stamps, SX_MICROS, 6);
        prop_assert_eq!(set.len(), 1);
        prop_assert!(SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn prop_pre4_gap_free_runs_are_single((count, micros) in (2usize..30, 20u32..60)) {
        let micros = f64::from(micros);
        let stamps = run(500_000, count, micros, 3);
        let set = SegmentBuilder::declared_rate_scan(&stamps, micros, 1);
        prop_assert_eq!(set.len(), 1);
        prop_assert!(SegmentVerifier::verify_stamps(&stamps, &set));
    }

    #[test]
    fn prop_other_structure_is_rejected((a, runs_a) in runs_strategy(), (b, runs_b) in runs_strategy()) {
        let set_a = SegmentBuilder::observed_rate_gap_scan(&a, SX_MICROS, 6);
        if runs_a != runs_b {
            prop_assert!(!SegmentVerifier::verify_stamps(&b, &set_a));
        }
    }
}
