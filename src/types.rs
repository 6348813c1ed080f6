// src/types.rs
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;

/// Typed value of one `-Key value` header line
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Integers(Vec<i64>),
    Floats(Vec<f64>),
    Timestamp(NaiveDateTime),
}

impl HeaderValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HeaderValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            HeaderValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get the name of the value kind as a string
    pub fn kind_name(&self) -> &'static str {
        match self {
            HeaderValue::Text(_) => "text",
            HeaderValue::Integer(_) => "integer",
            HeaderValue::Float(_) => "float",
            HeaderValue::Boolean(_) => "bool",
            HeaderValue::Integers(_) => "integer list",
            HeaderValue::Floats(_) => "float list",
            HeaderValue::Timestamp(_) => "timestamp",
        }
    }
}

/// Hardware/firmware generation that produced a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionVariant {
    Pre4,
    DigitalLynx,
    DigitalLynxSx,
    Bml,
    Atlas,
    Unknown,
}

/// How segments are reconstructed for a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionStrategy {
    /// Sample interval inferred from the records themselves, whole microseconds.
    DeclaredRateScan,
    /// Declared interval taken as authoritative, gaps found by extrapolation.
    ObservedRateGapScan,
}

/// Largest timestamp deviation accepted as clock jitter rather than a gap.
///
/// The effective tolerance is `max(floor_micros, round(sample_fraction * interval))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapTolerance {
    pub sample_fraction: f64,
    pub floor_micros: u64,
}

impl GapTolerance {
    pub const PRE4: GapTolerance = GapTolerance { sample_fraction: 0.0, floor_micros: 1 };
    pub const DIGITAL_LYNX: GapTolerance = GapTolerance { sample_fraction: 0.2, floor_micros: 1 };
    pub const BML: GapTolerance = GapTolerance { sample_fraction: 0.2, floor_micros: 1 };
    pub const ATLAS: GapTolerance = GapTolerance { sample_fraction: 0.2, floor_micros: 1 };
    pub const UNKNOWN: GapTolerance = GapTolerance { sample_fraction: 0.5, floor_micros: 2 };

    pub fn micros_for(&self, micros_per_sample: f64) -> u64 {
        let scaled = (self.sample_fraction * micros_per_sample).round();
        let scaled = if scaled.is_finite() && scaled > 0.0 { scaled as u64 } else { 0 };
        scaled.max(self.floor_micros)
    }
}

impl AcquisitionVariant {
    pub fn strategy(&self) -> ConstructionStrategy {
        match self {
            AcquisitionVariant::Pre4 => ConstructionStrategy::DeclaredRateScan,
            _ => ConstructionStrategy::ObservedRateGapScan,
        }
    }

    pub fn gap_tolerance(&self) -> GapTolerance {
        match self {
            AcquisitionVariant::Pre4 => GapTolerance::PRE4,
            AcquisitionVariant::DigitalLynx | AcquisitionVariant::DigitalLynxSx => {
                GapTolerance::DIGITAL_LYNX
            }
            AcquisitionVariant::Bml => GapTolerance::BML,
            AcquisitionVariant::Atlas => GapTolerance::ATLAS,
            AcquisitionVariant::Unknown => GapTolerance::UNKNOWN,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AcquisitionVariant::Pre4 => "PRE4",
            AcquisitionVariant::DigitalLynx => "DigitalLynx",
            AcquisitionVariant::DigitalLynxSx => "DigitalLynxSX",
            AcquisitionVariant::Bml => "BML",
            AcquisitionVariant::Atlas => "ATLAS",
            AcquisitionVariant::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AcquisitionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of recording file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Continuous,
    Spike { subchannels: u16 },
    Event,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ncs" => Some(FileKind::Continuous),
            "nse" => Some(FileKind::Spike { subchannels: 1 }),
            "nst" => Some(FileKind::Spike { subchannels: 2 }),
            "ntt" => Some(FileKind::Spike { subchannels: 4 }),
            "nev" => Some(FileKind::Event),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_spike(&self) -> bool {
        matches!(self, FileKind::Spike { .. })
    }
}
