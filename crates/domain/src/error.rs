//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`;
//! no `String` variants except where a host adapter can only report an
//! opaque reason.

use crate::id::EntityRef;

/// Top-level error for the zonestat workspace.
#[derive(Debug, thiserror::Error)]
pub enum ZoneStatError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An actuator call failed; the command is not committed.
    #[error("actuator error")]
    Actuator(#[from] ActuatorError),

    /// The host failed to serve a collaborator call (persistence,
    /// attribute emission, …).
    #[error("host error")]
    Host(#[from] HostError),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Entity reference is not of the form `domain.object_id`.
    #[error("invalid entity reference: {raw:?}")]
    InvalidEntityRef { raw: String },

    /// `min_temp` must be strictly below `max_temp`.
    #[error("inverted temperature limits: min {min} >= max {max}")]
    InvertedLimits { min: f64, max: f64 },

    /// Dual setpoint must satisfy `low < high`.
    #[error("inverted setpoint range: low {low} >= high {high}")]
    InvertedSetpointRange { low: f64, high: f64 },

    /// A target lies outside the configured temperature limits.
    #[error("setpoint {target} outside limits [{min}, {max}]")]
    SetpointOutOfLimits { target: f64, min: f64, max: f64 },

    /// The damper registry was configured without any actuators.
    #[error("damper registry is empty")]
    EmptyRegistry,

    /// The same actuator appears twice in the damper registry.
    #[error("duplicate damper actuator: {actuator}")]
    DuplicateDamper { actuator: EntityRef },

    /// `max_switches_off` would allow closing every damper.
    #[error("max_switches_off {cap} must be at most {max} for {count} dampers")]
    CapTooHigh { cap: usize, max: usize, count: usize },

    /// An HVAC mode string did not match any known mode.
    #[error("unknown hvac mode: {raw:?}")]
    UnknownHvacMode { raw: String },

    /// A zone was configured without any temperature sensor.
    #[error("zone {zone:?} has no temperature sensors")]
    NoSensors { zone: String },
}

/// A failed actuator call. Recoverable: the state machine keeps the
/// previous commanded state so the next trigger retries the transition.
#[derive(Debug, thiserror::Error)]
#[error("actuator call to {actuator} failed: {reason}")]
pub struct ActuatorError {
    pub actuator: EntityRef,
    pub reason: String,
}

/// A failed host collaborator call outside actuator IO.
#[derive(Debug, thiserror::Error)]
#[error("host call failed: {reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    /// Wrap an opaque host-side failure reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
