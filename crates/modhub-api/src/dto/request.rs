//! Request DTOs.

use std::str::FromStr;

use serde::Deserialize;

use modhub_core::error::AppError;

/// Path parameters of `/api/plugins/{alias}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AliasPath {
    pub alias: String,
}

/// Path parameters of `/api/plugins/{alias}/status/{status}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPath {
    pub alias: String,
    pub status: PluginStatus,
}

/// Requested activation state. Accepts `1`/`0`, `true`/`false`,
/// `on`/`off`, `enable`/`disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginStatus(pub bool);

impl FromStr for PluginStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "enable" | "enabled" => Ok(Self(true)),
            "0" | "false" | "off" | "disable" | "disabled" => Ok(Self(false)),
            other => Err(AppError::validation(format!("Invalid plugin status '{other}'"))),
        }
    }
}

impl<'de> Deserialize<'de> for PluginStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|e: AppError| serde::de::Error::custom(e.message))
    }
}
