// src/record/layout.rs
use super::RecordFormat;
use crate::utils::decode_padded_string_lossy;
use byteorder::{ByteOrder, LittleEndian};

/// Continuous-signal (`.ncs`) records: 8-byte timestamp, channel, declared
/// rate, valid count, then 512 samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContinuousFormat;

impl ContinuousFormat {
    pub const SAMPLES_PER_RECORD: usize = 512;
    pub const HEADER_BYTES: usize = 20;
    pub const STRIDE: usize = Self::HEADER_BYTES + 2 * Self::SAMPLES_PER_RECORD;
}

impl RecordFormat for ContinuousFormat {
    type Record<'a> = CscRecord<'a>;

    fn stride(&self) -> usize {
        Self::STRIDE
    }

    fn overlay<'a>(&self, bytes: &'a [u8]) -> CscRecord<'a> {
        CscRecord { bytes }
    }
}

/// Timing fields of one continuous record, detached from the buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordStamp {
    pub timestamp: u64,
    pub channel_number: u32,
    pub declared_sample_rate: f64,
    pub valid_sample_count: u16,
}

impl RecordStamp {
    /// Stamp of a completely filled record.
    pub fn full(timestamp: u64, channel_number: u32, declared_sample_rate: f64) -> Self {
        RecordStamp {
            timestamp,
            channel_number,
            declared_sample_rate,
            valid_sample_count: ContinuousFormat::SAMPLES_PER_RECORD as u16,
        }
    }

    pub fn is_full(&self) -> bool {
        usize::from(self.valid_sample_count) == ContinuousFormat::SAMPLES_PER_RECORD
    }
}

/// Read-only view of one continuous record
#[derive(Debug, Clone, Copy)]
pub struct CscRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> CscRecord<'a> {
    pub fn timestamp(&self) -> u64 {
        LittleEndian::read_u64(&self.bytes[0..8])
    }

    pub fn channel_number(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[8..12])
    }

    pub fn declared_sample_rate(&self) -> f64 {
        f64::from(LittleEndian::read_u32(&self.bytes[12..16]))
    }

    /// Number of meaningful samples, clamped to the record capacity.
    pub fn valid_sample_count(&self) -> u16 {
        let raw = LittleEndian::read_u32(&self.bytes[16..20]);
        raw.min(ContinuousFormat::SAMPLES_PER_RECORD as u32) as u16
    }

    fn payload(&self) -> &'a [u8] {
        let n = usize::from(self.valid_sample_count());
        &self.bytes[ContinuousFormat::HEADER_BYTES..ContinuousFormat::HEADER_BYTES + 2 * n]
    }

    /// Valid samples, decoded one by one.
    pub fn samples(&self) -> impl Iterator<Item = i16> + 'a {
        self.payload().chunks_exact(2).map(LittleEndian::read_i16)
    }

    /// Valid samples borrowed straight from the buffer. `None` on big-endian
    /// hosts or when the record is not 2-byte aligned.
    pub fn samples_slice(&self) -> Option<&'a [i16]> {
        if cfg!(target_endian = "little") {
            bytemuck::try_cast_slice(self.payload()).ok()
        } else {
            None
        }
    }

    pub fn stamp(&self) -> RecordStamp {
        RecordStamp {
            timestamp: self.timestamp(),
            channel_number: self.channel_number(),
            declared_sample_rate: self.declared_sample_rate(),
            valid_sample_count: self.valid_sample_count(),
        }
    }
}

/// Spike waveform records (`.nse`, `.nst`, `.ntt`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpikeFormat {
    pub waveform_len: usize,
    pub subchannels: usize,
}

impl SpikeFormat {
    pub const FEATURE_COUNT: usize = 8;
    pub const HEADER_BYTES: usize = 16 + 4 * Self::FEATURE_COUNT;

    pub fn new(waveform_len: usize, subchannels: usize) -> Self {
        SpikeFormat { waveform_len, subchannels }
    }
}

impl RecordFormat for SpikeFormat {
    type Record<'a> = SpikeRecord<'a>;

    fn stride(&self) -> usize {
        self.waveform_len
            .saturating_mul(self.subchannels)
            .saturating_mul(2)
            .saturating_add(Self::HEADER_BYTES)
    }

    fn overlay<'a>(&self, bytes: &'a [u8]) -> SpikeRecord<'a> {
        SpikeRecord { bytes, subchannels: self.subchannels }
    }
}

/// Read-only view of one spike record
#[derive(Debug, Clone, Copy)]
pub struct SpikeRecord<'a> {
    bytes: &'a [u8],
    subchannels: usize,
}

impl<'a> SpikeRecord<'a> {
    pub fn timestamp(&self) -> u64 {
        LittleEndian::read_u64(&self.bytes[0..8])
    }

    pub fn channel_number(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[8..12])
    }

    pub fn unit_id(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[12..16])
    }

    pub fn feature(&self, index: usize) -> Option<i32> {
        (index < SpikeFormat::FEATURE_COUNT)
            .then(|| LittleEndian::read_i32(&self.bytes[16 + 4 * index..20 + 4 * index]))
    }

    /// Waveform points, interleaved by subchannel.
    pub fn waveform(&self) -> impl Iterator<Item = i16> + 'a {
        self.bytes[SpikeFormat::HEADER_BYTES..]
            .chunks_exact(2)
            .map(LittleEndian::read_i16)
    }

    pub fn subchannels(&self) -> usize {
        self.subchannels
    }
}

/// Event records (`.nev`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFormat;

impl EventFormat {
    pub const STRING_BYTES: usize = 128;
    pub const STRIDE: usize = 56 + Self::STRING_BYTES;
}

impl RecordFormat for EventFormat {
    type Record<'a> = EventRecord<'a>;

    fn stride(&self) -> usize {
        Self::STRIDE
    }

    fn overlay<'a>(&self, bytes: &'a [u8]) -> EventRecord<'a> {
        EventRecord { bytes }
    }
}

/// Read-only view of one event record
#[derive(Debug, Clone, Copy)]
pub struct EventRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> EventRecord<'a> {
    pub fn system_id(&self) -> i16 {
        LittleEndian::read_i16(&self.bytes[2..4])
    }

    pub fn timestamp(&self) -> u64 {
        LittleEndian::read_u64(&self.bytes[6..14])
    }

    pub fn event_id(&self) -> i16 {
        LittleEndian::read_i16(&self.bytes[14..16])
    }

    pub fn ttl_input(&self) -> i16 {
        LittleEndian::read_i16(&self.bytes[16..18])
    }

    pub fn extra(&self, index: usize) -> Option<i32> {
        (index < 8).then(|| LittleEndian::read_i32(&self.bytes[24 + 4 * index..28 + 4 * index]))
    }

    pub fn event_string(&self) -> String {
        decode_padded_string_lossy(&self.bytes[56..56 + EventFormat::STRING_BYTES])
    }
}
