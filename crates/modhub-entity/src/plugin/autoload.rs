//! Autoload type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the host's autoloader locates a plugin's classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoloadType {
    /// PSR-4 namespace to directory mapping.
    #[default]
    #[serde(rename = "psr-4")]
    Psr4,
    /// Legacy PSR-0 namespace to directory mapping.
    #[serde(rename = "psr-0")]
    Psr0,
    /// Directories scanned for classes.
    #[serde(rename = "classmap")]
    Classmap,
    /// Files included on every request.
    #[serde(rename = "files")]
    Files,
}

impl AutoloadType {
    /// Return the key used in the `autoload` section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Psr4 => "psr-4",
            Self::Psr0 => "psr-0",
            Self::Classmap => "classmap",
            Self::Files => "files",
        }
    }

    /// Flat-scan types store a list of paths instead of a namespace map.
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Classmap | Self::Files)
    }
}

impl fmt::Display for AutoloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AutoloadType {
    type Err = modhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "psr-4" => Ok(Self::Psr4),
            "psr-0" => Ok(Self::Psr0),
            "classmap" => Ok(Self::Classmap),
            "files" => Ok(Self::Files),
            _ => Err(modhub_core::AppError::validation(format!(
                "Invalid autoload type: '{s}'. Expected one of: psr-4, psr-0, classmap, files"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_flatness() {
        assert_eq!("PSR-4".parse::<AutoloadType>().unwrap(), AutoloadType::Psr4);
        assert!("classmap".parse::<AutoloadType>().unwrap().is_flat());
        assert!(!AutoloadType::Psr0.is_flat());
        assert!("psr-5".parse::<AutoloadType>().is_err());
    }

    #[test]
    fn test_serde_uses_composer_keys() {
        let json = serde_json::to_string(&AutoloadType::Classmap).unwrap();
        assert_eq!(json, "\"classmap\"");
        let parsed: AutoloadType = serde_json::from_str("\"psr-4\"").unwrap();
        assert_eq!(parsed, AutoloadType::Psr4);
    }
}
