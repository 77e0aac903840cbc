use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Anatomical plane along which a volume is sliced.
///
/// Volumes are stored in canonical axis order: axis 0 advances left to
/// right (sagittal), axis 1 back to front (coronal), axis 2 bottom to
/// top (axial).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    Sagittal,
    Coronal,
    Axial,
}

/// Integer width of the emitted pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

/// Intensity normalization strategy applied before the integer cast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneMap {
    #[default]
    Disabled,
    /// Clamp at a percentile of the intensity distribution, then rescale
    /// linearly so the clamp value maps to the maximum pixel value.
    PercentileClamp,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized {option} value: {value:?} (expected one of {expected})")]
pub struct ParseEnumError {
    option: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseEnumError {
    fn new(option: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            option,
            value: value.to_owned(),
            expected,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::Sagittal => write!(f, "sagittal"),
            Plane::Coronal => write!(f, "coronal"),
            Plane::Axial => write!(f, "axial"),
        }
    }
}

impl FromStr for Plane {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sagittal" => Ok(Plane::Sagittal),
            "coronal" => Ok(Plane::Coronal),
            "axial" => Ok(Plane::Axial),
            _ => Err(ParseEnumError::new(
                "plane",
                value,
                "sagittal, coronal, axial",
            )),
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitDepth::Eight => write!(f, "8-bit"),
            BitDepth::Sixteen => write!(f, "16-bit"),
        }
    }
}

impl FromStr for BitDepth {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "8" | "8-bit" | "8bit" => Ok(BitDepth::Eight),
            "16" | "16-bit" | "16bit" => Ok(BitDepth::Sixteen),
            _ => Err(ParseEnumError::new("bit depth", value, "8, 16")),
        }
    }
}

impl fmt::Display for ToneMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneMap::Disabled => write!(f, "disabled"),
            ToneMap::PercentileClamp => write!(f, "percentile-clamp"),
        }
    }
}

impl FromStr for ToneMap {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "disabled" | "none" => Ok(ToneMap::Disabled),
            "percentile-clamp" | "linear-percentile-clamp" => Ok(ToneMap::PercentileClamp),
            _ => Err(ParseEnumError::new(
                "tone map",
                value,
                "disabled, percentile-clamp",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_parses_case_insensitively() {
        assert_eq!("sagittal".parse(), Ok(Plane::Sagittal));
        assert_eq!("Coronal".parse(), Ok(Plane::Coronal));
        assert_eq!("AXIAL".parse(), Ok(Plane::Axial));
    }

    #[test]
    fn display_and_from_str_round_trip() {
        for plane in [Plane::Sagittal, Plane::Coronal, Plane::Axial] {
            assert_eq!(plane.to_string().parse(), Ok(plane));
        }
        for depth in [BitDepth::Eight, BitDepth::Sixteen] {
            assert_eq!(depth.to_string().parse(), Ok(depth));
        }
        for policy in [ToneMap::Disabled, ToneMap::PercentileClamp] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!("oblique".parse::<Plane>().is_err());
        assert!("32".parse::<BitDepth>().is_err());
        assert!("gamma".parse::<ToneMap>().is_err());
    }

    #[test]
    fn parse_error_names_the_offending_value() {
        let error = "oblique".parse::<Plane>().unwrap_err();
        let message = error.to_string();
        assert!(
            message.contains("oblique") && message.contains("plane"),
            "error should name option and value: {message}"
        );
    }
}
