// tests/common/mod.rs
#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};
use nlx_rs::{ContinuousFormat, EventFormat, RecordFormat, RecordStamp, SpikeFormat, HEADER_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

pub const SX_MICROS: f64 = 31.25;
/// Duration of one full 32 kHz record.
pub const SX_RECORD_MICROS: u64 = 16_000;

const DATES: &str = "-TimeCreated 2017/02/16 17:56:04\n-TimeClosed 2017/02/16 18:01:18\n";

pub fn sx_csc_header(name: &str, id: u32) -> String {
    format!(
        "######## Neuralynx Data File Header\n\
         -FileType CSC\n\
         -RecordSize 1044\n\
         -HardwareSubSystemName AcqSystem1\n\
         -HardwareSubSystemType DigitalLynxSX\n\
         -SamplingFrequency 32000\n\
         -AcqEntName {name}\n\
         -ADChannel {id}\n\
         {DATES}\
         -ApplicationName Cheetah \"6.3.2\"\n"
    )
}

pub fn pre4_csc_header(name: &str, frequency: u32) -> String {
    format!(
        "######## Neuralynx Data File Header\n\
         ## File Name: D:\\Cheetah_Data\\{name}.Ncs\n\
         ## Time Opened (m/d/y): 10/4/2003  At Time: 10:3:0.578\n\
         -CheetahRev 4.0.2\n\
         -NLX_Base_Class_Type CscAcqEnt\n\
         -SamplingFrequency {frequency}\n\
         -ADChannel 13\n\
         -AcqEntName {name}\n"
    )
}

pub fn spike_header(name: &str, ids: &[u32]) -> String {
    let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
    format!(
        "######## Neuralynx Data File Header\n\
         -FileType Spike\n\
         -HardwareSubSystemType DigitalLynxSX\n\
         -SamplingFrequency 32000\n\
         -WaveformLength 32\n\
         -AcqEntName {name}\n\
         -ADChannel {}\n\
         {DATES}",
        ids.join(" ")
    )
}

pub fn event_header() -> String {
    format!(
        "######## Neuralynx Data File Header\n\
         -FileType Event\n\
         -HardwareSubSystemType DigitalLynxSX\n\
         -AcqEntName Events\n\
         {DATES}"
    )
}

pub fn header_block(text: &str) -> Vec<u8> {
    let mut block = vec![0u8; HEADER_SIZE];
    block[..text.len()].copy_from_slice(text.as_bytes());
    block
}

/// Full records spaced by their own duration.
pub fn run(start: u64, count: usize, micros: f64, channel: u32) -> Vec<RecordStamp> {
    (0..count as u64)
        .map(|k| {
            let t = start + (k as f64 * 512.0 * micros).round() as u64;
            RecordStamp::full(t, channel, 1e6 / micros)
        })
        .collect()
}

pub fn continuous_bytes(header: &str, stamps: &[RecordStamp]) -> Vec<u8> {
    let mut bytes = header_block(header);
    for (i, stamp) in stamps.iter().enumerate() {
        let mut rec = vec![0u8; ContinuousFormat::STRIDE];
        LittleEndian::write_u64(&mut rec[0..8], stamp.timestamp);
        LittleEndian::write_u32(&mut rec[8..12], stamp.channel_number);
        LittleEndian::write_u32(&mut rec[12..16], stamp.declared_sample_rate as u32);
        LittleEndian::write_u32(&mut rec[16..20], u32::from(stamp.valid_sample_count));
        for (j, sample) in rec[20..].chunks_exact_mut(2).enumerate() {
            LittleEndian::write_i16(sample, ((i + j) % 1000) as i16);
        }
        bytes.extend_from_slice(&rec);
    }
    bytes
}

pub fn write_ncs(dir: &Path, file_name: &str, header: &str, stamps: &[RecordStamp]) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, continuous_bytes(header, stamps)).unwrap();
    path
}

/// `(timestamp, channel, unit)` spikes with 32-point waveforms.
pub fn write_spikes(
    dir: &Path,
    file_name: &str,
    header: &str,
    subchannels: usize,
    spikes: &[(u64, u32, u32)],
) -> PathBuf {
    let stride = SpikeFormat::new(32, subchannels).stride();
    let mut bytes = header_block(header);
    for &(ts, channel, unit) in spikes {
        let mut rec = vec![0u8; stride];
        LittleEndian::write_u64(&mut rec[0..8], ts);
        LittleEndian::write_u32(&mut rec[8..12], channel);
        LittleEndian::write_u32(&mut rec[12..16], unit);
        bytes.extend_from_slice(&rec);
    }
    let path = dir.join(file_name);
    fs::write(&path, bytes).unwrap();
    path
}

/// `(timestamp, event id, ttl)` events.
pub fn write_events(dir: &Path, file_name: &str, events: &[(u64, i16, i16)]) -> PathBuf {
    let mut bytes = header_block(&event_header());
    for &(ts, event_id, ttl) in events {
        let mut rec = vec![0u8; EventFormat::STRIDE];
        LittleEndian::write_i16(&mut rec[2..4], 1);
        LittleEndian::write_u64(&mut rec[6..14], ts);
        LittleEndian::write_i16(&mut rec[14..16], event_id);
        LittleEndian::write_i16(&mut rec[16..18], ttl);
        let label = format!("TTL Input on AcqSystem1_0 board 0 port 1 value (0x{ttl:04X}).");
        rec[56..56 + label.len()].copy_from_slice(label.as_bytes());
        bytes.extend_from_slice(&rec);
    }
    let path = dir.join(file_name);
    fs::write(&path, bytes).unwrap();
    path
}
