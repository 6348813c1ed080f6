// src/header/variant.rs
use super::HeaderProperties;
use crate::types::AcquisitionVariant;

type Predicate = fn(&HeaderProperties) -> bool;

/// Ordered classification rules; the first matching predicate decides.
///
/// An explicit `DigitalLynx` subsystem type wins over a `MicrosPerSamp`
/// field. Both variants scan the same way with the same tolerance.
pub const VARIANT_RULES: &[(&str, Predicate, AcquisitionVariant)] = &[
    ("subsystem type DigitalLynxSX", is_subsystem_sx, AcquisitionVariant::DigitalLynxSx),
    ("subsystem type DigitalLynx", is_subsystem_lynx, AcquisitionVariant::DigitalLynx),
    ("subsystem with micros per sample", has_subsystem_and_micros, AcquisitionVariant::DigitalLynxSx),
    ("subsystem without micros per sample", has_subsystem, AcquisitionVariant::DigitalLynx),
    ("BML base class", is_bml_class, AcquisitionVariant::Bml),
    ("CSC base class", is_csc_class, AcquisitionVariant::Pre4),
    ("ATLAS event file", is_atlas, AcquisitionVariant::Atlas),
    ("fractional declared frequency", has_fractional_frequency, AcquisitionVariant::Bml),
    ("whole declared frequency", has_whole_frequency, AcquisitionVariant::Pre4),
];

/// Derive the acquisition variant from parsed header properties.
pub fn classify(props: &HeaderProperties) -> AcquisitionVariant {
    VARIANT_RULES
        .iter()
        .find(|(_, predicate, _)| predicate(props))
        .map(|(name, _, variant)| {
            log::debug!("classified as {variant} by rule '{name}'");
            *variant
        })
        .unwrap_or(AcquisitionVariant::Unknown)
}

fn text_is(props: &HeaderProperties, key: &str, expected: &str) -> bool {
    props.get_text(key).is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

/// Subsystem types written by SX-generation acquisition software.
const SX_SUBSYSTEM_TYPES: &[&str] = &["DigitalLynxSX", "Cheetah64", "CheetahNetCom", "RawDataFile"];

fn is_subsystem_sx(props: &HeaderProperties) -> bool {
    SX_SUBSYSTEM_TYPES
        .iter()
        .any(|t| text_is(props, "HardwareSubSystemType", t))
}

fn is_subsystem_lynx(props: &HeaderProperties) -> bool {
    text_is(props, "HardwareSubSystemType", "DigitalLynx")
}

fn has_subsystem(props: &HeaderProperties) -> bool {
    props.contains_key("HardwareSubSystemName") || props.contains_key("HardwareSubSystemType")
}

fn has_subsystem_and_micros(props: &HeaderProperties) -> bool {
    has_subsystem(props) && props.contains_key("MicrosPerSamp")
}

fn is_bml_class(props: &HeaderProperties) -> bool {
    text_is(props, "NLX_Base_Class_Type", "BmlAcq")
}

fn is_csc_class(props: &HeaderProperties) -> bool {
    text_is(props, "NLX_Base_Class_Type", "CscAcqEnt")
}

fn is_atlas(props: &HeaderProperties) -> bool {
    let pegasus_events = text_is(props, "FileType", "Event")
        && props.application_name().is_some_and(|n| n.eq_ignore_ascii_case("Pegasus"));
    let atlas_system = props
        .get_text("AcquisitionSystem")
        .is_some_and(|v| v.to_ascii_uppercase().contains("ATLAS"));
    pegasus_events || atlas_system
}

fn has_fractional_frequency(props: &HeaderProperties) -> bool {
    !has_subsystem(props) && props.sampling_frequency().is_some_and(|f| f.fract() != 0.0)
}

fn has_whole_frequency(props: &HeaderProperties) -> bool {
    !has_subsystem(props) && props.sampling_frequency().is_some_and(|f| f.fract() == 0.0)
}
