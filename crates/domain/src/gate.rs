//! Coordination Gate — filters a zone's local intent through the main
//! thermostat's reported action.
//!
//! A zone damper only opens when the central unit is actually moving air
//! the right way: heating demand requires the main unit to report
//! `heating`, cooling demand requires `cooling`. `idle`, `off`, and
//! `unknown` all fail closed, so a damper never opens airflow against an
//! unconfirmed central state.
//!
//! Pass-through (no main thermostat configured) is expressed by the
//! caller simply not invoking the gate.

use crate::mode::{HvacAction, HvacMode};
use crate::policy::ZoneIntent;

/// Gate a local intent against the main unit's reported action.
#[must_use]
pub fn gate(mode: HvacMode, local: ZoneIntent, main: HvacAction) -> ZoneIntent {
    if mode == HvacMode::Off {
        return ZoneIntent::OFF;
    }
    ZoneIntent {
        heat: local.heat && main == HvacAction::Heating,
        cool: local.cool && main == HvacAction::Cooling,
    }
}
