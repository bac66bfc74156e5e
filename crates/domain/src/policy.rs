//! Mode Policy — maps (mode, reading, setpoint, tolerances) to a desired
//! actuator intent with hysteresis.
//!
//! The dead-band is asymmetric: heating turns on at `target - cold` but
//! holds until the bare `target` is reached (the mirror applies to
//! cooling). Re-entering the tolerance band on the way back to setpoint
//! therefore never short-cycles the actuator.
//!
//! The policy is a pure function over a closed mode enum; the previous
//! intent is passed in explicitly because hysteresis needs it.

use serde::{Deserialize, Serialize};

use crate::mode::{HvacAction, HvacMode};
use crate::reading::Reading;
use crate::setpoint::{Setpoint, ToleranceBand};

/// Desired energized state of a zone, split into heating and cooling
/// sub-intents. A single physical actuator takes the logical OR; a
/// distinct heat/cool actuator pair takes one sub-intent each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneIntent {
    pub heat: bool,
    pub cool: bool,
}

impl ZoneIntent {
    /// Nothing demanded.
    pub const OFF: Self = Self {
        heat: false,
        cool: false,
    };

    /// Whether a single shared actuator should be energized.
    #[must_use]
    pub fn energized(self) -> bool {
        self.heat || self.cool
    }
}

/// Result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub intent: ZoneIntent,
    /// The reading was invalid and the previous intent was held.
    pub stale: bool,
}

/// Decide the desired intent for one evaluation cycle.
///
/// `prev` is the intent from the previous cycle; it anchors the
/// hysteresis hold and is returned unchanged when the reading is stale
/// (a stale sensor must never toggle the actuator).
#[must_use]
pub fn decide(
    mode: HvacMode,
    reading: &Reading,
    setpoint: &Setpoint,
    band: &ToleranceBand,
    prev: ZoneIntent,
) -> PolicyDecision {
    if mode == HvacMode::Off {
        return PolicyDecision {
            intent: ZoneIntent::OFF,
            stale: false,
        };
    }

    let Some(current) = reading.value() else {
        return PolicyDecision {
            intent: prev,
            stale: true,
        };
    };

    let (heat_target, cool_target) = match *setpoint {
        Setpoint::Single { target } => (target, target),
        Setpoint::Range { low, high } => (low, high),
    };

    let heat = heat_demand(current, heat_target, band.cold, prev.heat);
    let cool = cool_demand(current, cool_target, band.hot, prev.cool);

    let intent = match mode {
        HvacMode::Heat => ZoneIntent { heat, cool: false },
        HvacMode::Cool => ZoneIntent { heat: false, cool },
        HvacMode::Auto | HvacMode::HeatCool => ZoneIntent { heat, cool },
        HvacMode::Off => unreachable!("handled above"),
    };

    PolicyDecision {
        intent,
        stale: false,
    }
}

/// Heating hysteresis: on at `target - cold`, off at `target`.
fn heat_demand(current: f64, target: f64, cold: f64, prev: bool) -> bool {
    if current <= target - cold {
        true
    } else if current >= target {
        false
    } else {
        prev
    }
}

/// Cooling hysteresis: on at `target + hot`, off at `target`.
fn cool_demand(current: f64, target: f64, hot: f64, prev: bool) -> bool {
    if current >= target + hot {
        true
    } else if current <= target {
        false
    } else {
        prev
    }
}

/// Display label for what the zone is doing. Derived for the UI only;
/// it never feeds back into control.
#[must_use]
pub fn hvac_action(mode: HvacMode, intent: ZoneIntent) -> HvacAction {
    if mode == HvacMode::Off {
        return HvacAction::Off;
    }
    if intent.heat {
        HvacAction::Heating
    } else if intent.cool {
        HvacAction::Cooling
    } else {
        HvacAction::Idle
    }
}
