//! Setpoints, temperature limits, and tolerance bands.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Bounds every target temperature must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLimits {
    pub min: f64,
    pub max: f64,
}

impl TemperatureLimits {
    /// Create limits, enforcing `min < max`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedLimits`] otherwise.
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if min >= max {
            return Err(ValidationError::InvertedLimits { min, max });
        }
        Ok(Self { min, max })
    }

    /// Clamp a target into the limits.
    #[must_use]
    pub fn clamp(&self, target: f64) -> f64 {
        target.clamp(self.min, self.max)
    }

    /// Whether a target lies within the limits.
    #[must_use]
    pub fn contains(&self, target: f64) -> bool {
        (self.min..=self.max).contains(&target)
    }
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        Self {
            min: 7.0,
            max: 35.0,
        }
    }
}

/// Target temperature: a single value, or a low/high pair for
/// [`HvacMode::HeatCool`](crate::mode::HvacMode::HeatCool).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setpoint {
    Single { target: f64 },
    Range { low: f64, high: f64 },
}

impl Setpoint {
    /// Check setpoint invariants: `low < high`, all targets within limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedSetpointRange`] or
    /// [`ValidationError::SetpointOutOfLimits`].
    pub fn validate(&self, limits: &TemperatureLimits) -> Result<(), ValidationError> {
        let check = |target: f64| {
            if limits.contains(target) {
                Ok(())
            } else {
                Err(ValidationError::SetpointOutOfLimits {
                    target,
                    min: limits.min,
                    max: limits.max,
                })
            }
        };
        match *self {
            Self::Single { target } => check(target),
            Self::Range { low, high } => {
                if low >= high {
                    return Err(ValidationError::InvertedSetpointRange { low, high });
                }
                check(low)?;
                check(high)
            }
        }
    }

    /// Defensive runtime clamp into the limits. An inverted range is also
    /// repaired by swapping; callers log when the result differs.
    #[must_use]
    pub fn clamped(&self, limits: &TemperatureLimits) -> Self {
        match *self {
            Self::Single { target } => Self::Single {
                target: limits.clamp(target),
            },
            Self::Range { low, high } => {
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                Self::Range {
                    low: limits.clamp(low),
                    high: limits.clamp(high),
                }
            }
        }
    }
}

/// Hysteresis tolerances around the setpoint.
///
/// `cold` widens the turn-on threshold below target, `hot` widens it
/// above. Both are clamped into `[0.1, 10.0]` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub cold: f64,
    pub hot: f64,
}

/// Smallest permitted tolerance.
pub const MIN_TOLERANCE: f64 = 0.1;
/// Largest permitted tolerance.
pub const MAX_TOLERANCE: f64 = 10.0;
/// Default tolerance when none is configured.
pub const DEFAULT_TOLERANCE: f64 = 0.3;

impl ToleranceBand {
    /// Create a band, clamping each tolerance into the permitted range.
    #[must_use]
    pub fn new(cold: f64, hot: f64) -> Self {
        Self {
            cold: cold.clamp(MIN_TOLERANCE, MAX_TOLERANCE),
            hot: hot.clamp(MIN_TOLERANCE, MAX_TOLERANCE),
        }
    }
}

impl Default for ToleranceBand {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_TOLERANCE)
    }
}
