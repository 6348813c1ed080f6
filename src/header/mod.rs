// src/header/mod.rs
//! Text header that prefixes every Neuralynx file.
//!
//! The header is a fixed block of [`HEADER_SIZE`] bytes holding Latin-1 text
//! padded with NUL bytes. Each `-Key value` line becomes one property, typed
//! according to a small key table. Recording dates come from whichever
//! era-specific layout the file uses (see [`patterns`]), and the acquisition
//! variant is derived once from the parsed properties (see [`variant`]).
//!
//! ```no_run
//! use nlx_rs::header::{DateMode, HeaderParser};
//!
//! let header = HeaderParser::new()
//!     .date_mode(DateMode::Permissive)
//!     .parse_file("CSC1.ncs")?;
//! println!("{} at {:?} Hz", header.variant(), header.sampling_frequency());
//! # Ok::<(), nlx_rs::NlxError>(())
//! ```

pub mod patterns;
pub mod variant;

use crate::error::{NlxError, Result};
use crate::types::{AcquisitionVariant, HeaderValue};
use crate::utils::decode_latin1;
use chrono::NaiveDateTime;
use regex::Regex;
use smallvec::SmallVec;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

pub use patterns::RecordingDates;
pub use variant::{classify, VARIANT_RULES};

/// Size of the text header block in bytes
pub const HEADER_SIZE: usize = 16 * 1024;

/// What to do when no recording date pattern matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMode {
    /// Fail with [`NlxError::MissingDate`]
    #[default]
    Strict,
    /// Leave the date fields empty and keep everything else
    Permissive,
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Integer,
    Float,
    Boolean,
    Integers,
    Floats,
    Timestamp,
}

const TYPED_KEYS: &[(&str, ValueKind)] = &[
    ("SamplingFrequency", ValueKind::Float),
    ("MicrosPerSamp", ValueKind::Float),
    ("ADBitVolts", ValueKind::Floats),
    ("ADChannel", ValueKind::Integers),
    ("InputRange", ValueKind::Integers),
    ("InputInverted", ValueKind::Boolean),
    ("WaveformLength", ValueKind::Integer),
    ("NumADChannels", ValueKind::Integer),
    ("ADMaxValue", ValueKind::Integer),
    ("RecordSize", ValueKind::Integer),
    ("DspLowCutFrequency", ValueKind::Float),
    ("DspHighCutFrequency", ValueKind::Float),
    ("TimeCreated", ValueKind::Timestamp),
    ("TimeClosed", ValueKind::Timestamp),
];

static PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-(?P<key>\S+)[ \t]*(?P<value>.*?)[ \t]*$")
        .unwrap_or_else(|e| panic!("invalid property pattern: {e}"))
});

static APPLICATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<name>[^\s"]+)\s*"?(?P<version>\d+(?:\.\d+)*)?"?"#)
        .unwrap_or_else(|e| panic!("invalid application pattern: {e}"))
});

fn convert(kind: ValueKind, raw: &str) -> Option<HeaderValue> {
    match kind {
        ValueKind::Integer => raw.parse().ok().map(HeaderValue::Integer),
        ValueKind::Float => raw.parse().ok().map(HeaderValue::Float),
        ValueKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => Some(HeaderValue::Boolean(true)),
            "false" => Some(HeaderValue::Boolean(false)),
            _ => None,
        },
        ValueKind::Integers => raw
            .split_whitespace()
            .map(|v| v.parse().ok())
            .collect::<Option<Vec<i64>>>()
            .map(HeaderValue::Integers),
        ValueKind::Floats => raw
            .split_whitespace()
            .map(|v| v.parse().ok())
            .collect::<Option<Vec<f64>>>()
            .map(HeaderValue::Floats),
        ValueKind::Timestamp => {
            let (date, time) = raw.split_once(char::is_whitespace)?;
            patterns::parse_date_time(date, time.trim()).map(HeaderValue::Timestamp)
        }
    }
}

fn typed_value(key: &str, raw: &str) -> HeaderValue {
    let kind = TYPED_KEYS.iter().find(|(k, _)| *k == key).map(|(_, kind)| *kind);
    match kind {
        None => HeaderValue::Text(raw.to_string()),
        Some(kind) => convert(kind, raw).unwrap_or_else(|| {
            log::debug!("header value for {key} is not a valid {kind:?}: {raw:?}");
            HeaderValue::Text(raw.to_string())
        }),
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

/// Parsed header of one file
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderProperties {
    entries: Vec<(String, HeaderValue)>,
    recording_opened: Option<NaiveDateTime>,
    recording_closed: Option<NaiveDateTime>,
    original_filename: Option<String>,
    application_name: Option<String>,
    application_version: Option<String>,
    channel_ids: SmallVec<[u32; 4]>,
    channel_names: SmallVec<[String; 4]>,
    variant: AcquisitionVariant,
}

impl HeaderProperties {
    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in header order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.entries.iter().filter(move |(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn recording_opened(&self) -> Option<NaiveDateTime> {
        self.recording_opened
    }

    pub fn recording_closed(&self) -> Option<NaiveDateTime> {
        self.recording_closed
    }

    /// Sampling frequency as declared; may be rounded or truncated.
    pub fn sampling_frequency(&self) -> Option<f64> {
        self.get("SamplingFrequency").and_then(HeaderValue::as_f64)
    }

    /// Declared sample interval, when the header carries one.
    pub fn micros_per_sample(&self) -> Option<f64> {
        self.get("MicrosPerSamp").and_then(HeaderValue::as_f64)
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    pub fn application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }

    pub fn application_version(&self) -> Option<&str> {
        self.application_version.as_deref()
    }

    pub fn channel_ids(&self) -> &[u32] {
        &self.channel_ids
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn file_type(&self) -> Option<&str> {
        self.get_text("FileType")
    }

    /// Number of waveform points per spike, 32 unless the header says otherwise.
    pub fn waveform_length(&self) -> usize {
        self.get("WaveformLength")
            .and_then(HeaderValue::as_i64)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v > 0)
            .unwrap_or(32)
    }

    /// Acquisition variant, classified once at parse time.
    pub fn variant(&self) -> AcquisitionVariant {
        self.variant
    }
}

/// Parses header blocks into [`HeaderProperties`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderParser {
    date_mode: DateMode,
}

impl HeaderParser {
    pub fn new() -> Self {
        HeaderParser::default()
    }

    pub fn date_mode(mut self, mode: DateMode) -> Self {
        self.date_mode = mode;
        self
    }

    /// Read and parse the header block at the start of `path`.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<HeaderProperties> {
        let mut block = Vec::with_capacity(HEADER_SIZE);
        File::open(path)?.take(HEADER_SIZE as u64).read_to_end(&mut block)?;
        self.parse(&block)
    }

    /// Parse a header block. Only the first [`HEADER_SIZE`] bytes are examined.
    pub fn parse(&self, bytes: &[u8]) -> Result<HeaderProperties> {
        if bytes.len() < HEADER_SIZE {
            return Err(NlxError::Header(format!(
                "block is {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        let block = &bytes[..HEADER_SIZE];
        let text_len = block
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| NlxError::Header("text is not NUL terminated".to_string()))?;
        let text = decode_latin1(&block[..text_len]).replace('\r', "");

        let mut entries = Vec::new();
        for line in text.lines() {
            if let Some(caps) = PROPERTY_LINE.captures(line.trim_start()) {
                let key = &caps["key"];
                let value = typed_value(key, &caps["value"]);
                entries.push((key.to_string(), value));
            }
        }

        let mut props = HeaderProperties {
            entries,
            recording_opened: None,
            recording_closed: None,
            original_filename: None,
            application_name: None,
            application_version: None,
            channel_ids: SmallVec::new(),
            channel_names: SmallVec::new(),
            variant: AcquisitionVariant::Unknown,
        };

        match patterns::find_recording_dates(&text) {
            Some(dates) => {
                props.recording_opened = Some(dates.opened);
                props.recording_closed = dates.closed;
            }
            None if self.date_mode == DateMode::Strict => return Err(NlxError::MissingDate),
            None => log::info!("no recording dates in header, continuing without them"),
        }

        props.original_filename = props
            .get_text("OriginalFileName")
            .map(|s| unquote(s).to_string())
            .or_else(|| patterns::find_file_name(&text));

        if let Some(app) = props.get_text("ApplicationName").map(str::to_owned) {
            if let Some(caps) = APPLICATION.captures(app.trim()) {
                props.application_name = caps.name("name").map(|m| m.as_str().to_string());
                props.application_version = caps.name("version").map(|m| m.as_str().to_string());
            }
        } else if let Some(rev) = props.get_text("CheetahRev").map(str::to_owned) {
            props.application_name = Some("Cheetah".to_string());
            props.application_version = Some(unquote(&rev).to_string());
        }

        if let Some(HeaderValue::Integers(ids)) = props.get("ADChannel") {
            props.channel_ids = ids.iter().filter_map(|&id| u32::try_from(id).ok()).collect();
        }
        if let Some(names) = props.get_text("AcqEntName") {
            props.channel_names = names.split_whitespace().map(str::to_string).collect();
        }

        props.variant = classify(&props);
        Ok(props)
    }
}
