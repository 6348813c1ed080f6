// src/segment/builder.rs
use super::{sample_time, Extrapolation, Segment, SegmentSet, SegmentVerifier};
use crate::error::{NlxError, Result};
use crate::header::HeaderProperties;
use crate::record::{ContinuousFormat, RecordStamp, RecordView};
use crate::types::ConstructionStrategy;

#[derive(Debug, Clone, Copy)]
struct OpenSegment {
    start_index: usize,
    start_time: u64,
    last_index: usize,
    last_time: u64,
    last_valid: u16,
    /// Valid samples in the segment before its last record.
    samples_before_last: u64,
    /// A partial record was seen; the segment cannot grow any further.
    sealed: bool,
}

impl OpenSegment {
    fn begin(index: usize, stamp: &RecordStamp) -> Self {
        OpenSegment {
            start_index: index,
            start_time: stamp.timestamp,
            last_index: index,
            last_time: stamp.timestamp,
            last_valid: stamp.valid_sample_count,
            samples_before_last: 0,
            sealed: !stamp.is_full(),
        }
    }
}

/// Segmenting walk over a record sequence.
///
/// Each [`step`](GapScan::step) consumes the next record and returns the new
/// state; [`finish`](GapScan::finish) closes the open segment. A record
/// starts a new segment when its timestamp deviates from the extrapolated one
/// by more than the tolerance, or when the previous record was partial.
#[derive(Debug, Clone)]
pub struct GapScan {
    micros_per_sample: f64,
    tolerance: u64,
    extrapolation: Extrapolation,
    closed: Vec<Segment>,
    open: Option<OpenSegment>,
}

impl GapScan {
    pub fn new(micros_per_sample: f64, tolerance: u64, extrapolation: Extrapolation) -> Self {
        GapScan {
            micros_per_sample,
            tolerance,
            extrapolation,
            closed: Vec::new(),
            open: None,
        }
    }

    /// Where the next record should start if the open segment continues.
    pub fn expected_timestamp(&self) -> Option<u64> {
        self.open.map(|open| match self.extrapolation {
            Extrapolation::FromSegmentStart => sample_time(
                open.start_time,
                open.samples_before_last + u64::from(open.last_valid),
                self.micros_per_sample,
            ),
            Extrapolation::FromPreviousRecord => {
                sample_time(open.last_time, u64::from(open.last_valid), self.micros_per_sample)
            }
        })
    }

    /// Segments closed so far.
    pub fn closed(&self) -> &[Segment] {
        &self.closed
    }

    /// Start index of the segment still open, if any.
    pub fn open_start(&self) -> Option<usize> {
        self.open.map(|o| o.start_index)
    }

    pub fn step(mut self, index: usize, stamp: &RecordStamp) -> Self {
        let expected = self.expected_timestamp();
        let continues = match (self.open, expected) {
            (Some(open), Some(expected)) => {
                !open.sealed && stamp.timestamp.abs_diff(expected) <= self.tolerance
            }
            _ => false,
        };

        if continues {
            if let Some(open) = self.open.as_mut() {
                open.samples_before_last += u64::from(open.last_valid);
                open.last_index = index;
                open.last_time = stamp.timestamp;
                open.last_valid = stamp.valid_sample_count;
                open.sealed = !stamp.is_full();
            }
            return self;
        }

        if let Some(open) = self.open.take() {
            log::debug!(
                "segment break before record {index}: expected {:?}, found {}",
                expected,
                stamp.timestamp
            );
            let segment = self.close(&open);
            self.closed.push(segment);
        }
        self.open = Some(OpenSegment::begin(index, stamp));
        self
    }

    pub fn finish(mut self) -> Vec<Segment> {
        if let Some(open) = self.open.take() {
            let segment = self.close(&open);
            self.closed.push(segment);
        }
        self.closed
    }

    fn record_end(&self, open: &OpenSegment) -> u64 {
        sample_time(open.last_time, u64::from(open.last_valid), self.micros_per_sample)
    }

    fn close(&self, open: &OpenSegment) -> Segment {
        Segment {
            start_record_index: open.start_index,
            end_record_index: open.last_index,
            start_time: open.start_time,
            end_time: self.record_end(open),
            sample_count: open.samples_before_last + u64::from(open.last_valid),
        }
    }
}

/// Splits continuous records into gap-free segments
pub struct SegmentBuilder;

impl SegmentBuilder {
    /// Build the segment set of one continuous file.
    pub fn build(
        records: &RecordView<'_, ContinuousFormat>,
        header: &HeaderProperties,
    ) -> Result<SegmentSet> {
        let stamps: Vec<RecordStamp> = records.stamps().collect();
        Self::build_from_stamps(&stamps, header)
    }

    /// Same as [`build`](Self::build) over already extracted record stamps.
    pub fn build_from_stamps(stamps: &[RecordStamp], header: &HeaderProperties) -> Result<SegmentSet> {
        check_consistency(stamps)?;
        let variant = header.variant();
        let tolerance = variant.gap_tolerance();

        let set = match variant.strategy() {
            ConstructionStrategy::DeclaredRateScan => {
                let micros = fits_record(infer_interval(stamps, header)?)?;
                Self::declared_rate_scan(stamps, micros, tolerance.micros_for(micros))
            }
            ConstructionStrategy::ObservedRateGapScan => {
                let micros = fits_record(declared_interval(stamps, header)?)?;
                Self::observed_rate_gap_scan(stamps, micros, tolerance.micros_for(micros))
            }
        };

        log::debug!(
            "{} records of a {variant} file form {} segment(s) at {} us per sample",
            stamps.len(),
            set.len(),
            set.used_microseconds_per_sample
        );
        Ok(set)
    }

    /// Scan with a whole-microsecond interval, extrapolating from each
    /// segment's first record. A file that is one unbroken run is accepted
    /// without walking it record by record.
    pub fn declared_rate_scan(stamps: &[RecordStamp], micros_per_sample: f64, tolerance: u64) -> SegmentSet {
        let mut set = SegmentSet::new(micros_per_sample, tolerance, Extrapolation::FromSegmentStart);

        if let Some(candidate) = single_run_candidate(stamps, micros_per_sample, tolerance) {
            set.segments.push(candidate);
            if SegmentVerifier::verify_stamps(stamps, &set) {
                return set;
            }
            log::debug!("single segment candidate rejected, scanning every record");
            set.segments.clear();
        }

        set.segments = scan(stamps, micros_per_sample, tolerance, Extrapolation::FromSegmentStart);
        set
    }

    /// Scan with the declared interval, extrapolating from the previous record.
    pub fn observed_rate_gap_scan(stamps: &[RecordStamp], micros_per_sample: f64, tolerance: u64) -> SegmentSet {
        let mut set = SegmentSet::new(micros_per_sample, tolerance, Extrapolation::FromPreviousRecord);
        set.segments = scan(stamps, micros_per_sample, tolerance, Extrapolation::FromPreviousRecord);
        set
    }
}

fn scan(stamps: &[RecordStamp], micros: f64, tolerance: u64, extrapolation: Extrapolation) -> Vec<Segment> {
    stamps
        .iter()
        .enumerate()
        .fold(GapScan::new(micros, tolerance, extrapolation), |scan, (i, stamp)| scan.step(i, stamp))
        .finish()
}

fn single_run_candidate(stamps: &[RecordStamp], micros: f64, tolerance: u64) -> Option<Segment> {
    let (first, last) = (stamps.first()?, stamps.last()?);
    let last_index = stamps.len() - 1;
    let full = ContinuousFormat::SAMPLES_PER_RECORD as u64;
    let predicted = sample_time(first.timestamp, full * last_index as u64, micros);
    if last.timestamp.abs_diff(predicted) > tolerance {
        return None;
    }
    Some(Segment {
        start_record_index: 0,
        end_record_index: last_index,
        start_time: first.timestamp,
        end_time: sample_time(last.timestamp, u64::from(last.valid_sample_count), micros),
        sample_count: full * last_index as u64 + u64::from(last.valid_sample_count),
    })
}

fn check_consistency(stamps: &[RecordStamp]) -> Result<()> {
    let Some(first) = stamps.first() else { return Ok(()) };
    for (index, pair) in stamps.windows(2).enumerate() {
        let (prev, stamp) = (&pair[0], &pair[1]);
        let index = index + 1;
        if stamp.timestamp < prev.timestamp {
            return Err(NlxError::InconsistentRecords {
                index,
                reason: format!(
                    "timestamp went back from {} to {}",
                    prev.timestamp, stamp.timestamp
                ),
            });
        }
        if stamp.channel_number != first.channel_number {
            return Err(NlxError::InconsistentRecords {
                index,
                reason: format!(
                    "channel number changed from {} to {}",
                    first.channel_number, stamp.channel_number
                ),
            });
        }
        if stamp.declared_sample_rate != first.declared_sample_rate {
            return Err(NlxError::InconsistentRecords {
                index,
                reason: format!(
                    "declared sample rate changed from {} to {}",
                    first.declared_sample_rate, stamp.declared_sample_rate
                ),
            });
        }
    }
    Ok(())
}

/// Rejects intervals whose record duration does not fit a timestamp.
fn fits_record(micros: f64) -> Result<f64> {
    let record = micros * ContinuousFormat::SAMPLES_PER_RECORD as f64;
    if record.is_finite() && record < u64::MAX as f64 {
        Ok(micros)
    } else {
        Err(NlxError::UnknownSampleRate(format!(
            "{micros} us per sample overflows the duration of one record"
        )))
    }
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Interval for files whose sampling clock ticks in whole microseconds.
///
/// Taken from the spacing of the first two records, unless that disagrees
/// with the header's (truncated) frequency by more than a microsecond.
fn infer_interval(stamps: &[RecordStamp], header: &HeaderProperties) -> Result<f64> {
    let from_header = header
        .sampling_frequency()
        .and_then(positive)
        .map(|f| (1e6 / f).floor())
        .and_then(positive);

    let from_data = match stamps {
        [a, b, ..] if a.valid_sample_count > 0 && b.timestamp > a.timestamp => {
            positive(((b.timestamp - a.timestamp) as f64 / f64::from(a.valid_sample_count)).round())
        }
        _ => None,
    };

    match (from_data, from_header) {
        (Some(data), Some(hdr)) if (data - hdr).abs() > 1.0 => {
            log::warn!(
                "first records imply {data} us per sample but header implies {hdr}; using header"
            );
            Ok(hdr)
        }
        (Some(data), _) => Ok(data),
        (None, Some(hdr)) => Ok(hdr),
        (None, None) => stamps
            .first()
            .and_then(|s| positive(s.declared_sample_rate))
            .map(|rate| (1e6 / rate).floor())
            .and_then(positive)
            .ok_or_else(|| NlxError::UnknownSampleRate("no usable header frequency or record spacing".into())),
    }
}

/// Interval declared by the header, falling back to the records' own rate.
fn declared_interval(stamps: &[RecordStamp], header: &HeaderProperties) -> Result<f64> {
    header
        .micros_per_sample()
        .and_then(positive)
        .or_else(|| header.sampling_frequency().and_then(positive).map(|f| 1e6 / f))
        .or_else(|| {
            stamps
                .first()
                .and_then(|s| positive(s.declared_sample_rate))
                .map(|rate| 1e6 / rate)
        })
        .ok_or_else(|| NlxError::UnknownSampleRate("no declared frequency in header or records".into()))
}
