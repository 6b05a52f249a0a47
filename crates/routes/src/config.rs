//! Routes tool configuration.
//!
//! Configuration is passed explicitly to the pipeline on every call. Hosts
//! usually keep two layers (setup data plus user-edited options); `overlay`
//! merges them field by field.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown travel mode '{0}'")]
    UnknownTravelMode(String),
}

/// Travel modes accepted by the Routes API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
    TwoWheeler,
}

impl TravelMode {
    pub const ALL: [TravelMode; 5] = [
        TravelMode::Drive,
        TravelMode::Walk,
        TravelMode::Bicycle,
        TravelMode::Transit,
        TravelMode::TwoWheeler,
    ];

    /// Wire name, e.g. `TWO_WHEELER`.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Drive => "DRIVE",
            TravelMode::Walk => "WALK",
            TravelMode::Bicycle => "BICYCLE",
            TravelMode::Transit => "TRANSIT",
            TravelMode::TwoWheeler => "TWO_WHEELER",
        }
    }

    /// Human-readable form: lowercase with underscores as spaces.
    pub fn display_name(self) -> String {
        self.as_str().to_lowercase().replace('_', " ")
    }
}

impl FromStr for TravelMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownTravelMode(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for TravelMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for the transit times tool.
///
/// Every field is optional so partially configured hosts can still be loaded;
/// the pipeline reports what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_mode: Option<TravelMode>,
}

impl RoutesConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Merge `options` over `self`; any field set in `options` wins.
    pub fn overlay(&self, options: &RoutesConfig) -> RoutesConfig {
        RoutesConfig {
            api_key: options.api_key.clone().or_else(|| self.api_key.clone()),
            latitude: options.latitude.or(self.latitude),
            longitude: options.longitude.or(self.longitude),
            travel_mode: options.travel_mode.or(self.travel_mode),
        }
    }

    /// API key, if set to something non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Origin as `(latitude, longitude)`; `None` unless both are set and finite.
    pub fn origin(&self) -> Option<(f64, f64)> {
        let latitude = self.latitude.filter(|v| v.is_finite())?;
        let longitude = self.longitude.filter(|v| v.is_finite())?;
        Some((latitude, longitude))
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode.unwrap_or_default()
    }
}

/// Accept coordinates as JSON numbers or numeric strings ("40.7128").
/// Blank strings and null read as unset; NaN and infinities are rejected.
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{s}'")))?,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "coordinate must be finite, got {value}"
        )));
    }
    Ok(Some(value))
}
