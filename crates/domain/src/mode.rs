//! HVAC modes and actions as closed enums.
//!
//! `HvacMode` is what the user configures; `HvacAction` is what a unit is
//! reported to be *doing* right now. The distinction matters for the
//! coordination gate: a main thermostat can be in `heat` mode while its
//! action is `idle`, and a zone damper must not open for an idle unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Operating mode of a thermostat zone. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    #[default]
    Off,
    Heat,
    Cool,
    Auto,
    HeatCool,
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Heat => f.write_str("heat"),
            Self::Cool => f.write_str("cool"),
            Self::Auto => f.write_str("auto"),
            Self::HeatCool => f.write_str("heat_cool"),
        }
    }
}

impl FromStr for HvacMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "auto" => Ok(Self::Auto),
            "heat_cool" => Ok(Self::HeatCool),
            other => Err(ValidationError::UnknownHvacMode {
                raw: other.to_string(),
            }),
        }
    }
}

/// Reported activity of a thermostat entity.
///
/// `Unknown` models an unavailable main thermostat or a missing
/// `hvac_action` attribute; the coordination gate fails closed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    Off,
    Idle,
    Heating,
    Cooling,
    #[default]
    Unknown,
}

impl HvacAction {
    /// Normalize a raw `hvac_action` attribute value.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "off" => Self::Off,
            "idle" => Self::Idle,
            "heating" => Self::Heating,
            "cooling" => Self::Cooling,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for HvacAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Idle => f.write_str("idle"),
            Self::Heating => f.write_str("heating"),
            Self::Cooling => f.write_str("cooling"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
