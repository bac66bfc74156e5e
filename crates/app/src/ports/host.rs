//! Host port — the narrow surface the embedding host provides.
//!
//! The host owns the event loop, entity registry, persistence store, and
//! UI. The control core reaches all of them through this one **port** —
//! adapters implement it, the state machine calls it. Sensor reads are
//! pull-style: the host notifies the core that something changed (via
//! the controller entry points) and the core re-reads the snapshot here.

use std::future::Future;

use serde::{Deserialize, Serialize};

use zonestat_domain::error::{ActuatorError, HostError};
use zonestat_domain::id::{EntityRef, ZoneId};
use zonestat_domain::mode::{HvacAction, HvacMode};
use zonestat_domain::reading::Reading;
use zonestat_domain::setpoint::Setpoint;

/// Read-only snapshot of the main thermostat, pulled on coordination
/// events. `target` and `mode` are surfaced for display only and never
/// feed back into control.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MainSnapshot {
    pub action: HvacAction,
    pub target: Option<f64>,
    pub mode: Option<HvacMode>,
}

/// User-selectable preset. `Away` swaps the active setpoint for the
/// configured away target; clearing it restores the prior setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    None,
    Away,
}

/// The slice of controller state that survives process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub mode: HvacMode,
    pub setpoint: Setpoint,
    pub preset: Preset,
}

/// Display attributes pushed to the host UI after every evaluation.
/// Read-only: nothing in here feeds back into control decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAttributes {
    pub zone: String,
    pub hvac_mode: HvacMode,
    pub hvac_action: HvacAction,
    pub preset: Preset,
    pub target: Setpoint,
    pub current_temperature: Option<f64>,
    pub current_humidity: Option<f64>,
    pub stale: bool,
    pub cold_tolerance: f64,
    pub hot_tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_thermostat_action: Option<HvacAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_thermostat_target: Option<f64>,
}

/// The host-provided collaborator surface.
///
/// This is a **port** — the state machine calls it, adapters implement
/// it. Failure modes are deliberate: actuator failures are recoverable
/// and leave the last commanded state untouched; sensor reads cannot
/// fail, they return an invalid [`Reading`] instead.
pub trait HostContext: Send + Sync {
    /// Read the current state of a sensor entity, normalized.
    /// Unavailable or non-numeric sources yield an invalid reading.
    fn read_sensor(&self, entity: &EntityRef) -> impl Future<Output = Reading> + Send;

    /// Read the main thermostat's reported action and display data.
    /// An unavailable entity yields [`HvacAction::Unknown`].
    fn read_main_thermostat(&self, entity: &EntityRef)
    -> impl Future<Output = MainSnapshot> + Send;

    /// Drive an actuator switch. One scoped call per invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ActuatorError`] when the call fails; the command is
    /// then not committed and the next trigger retries it.
    fn set_actuator(
        &self,
        entity: &EntityRef,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuatorError>> + Send;

    /// Load the persisted controller state for a zone at startup.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the persistence store is unreachable.
    fn load_persisted(
        &self,
        zone: ZoneId,
    ) -> impl Future<Output = Result<Option<PersistedState>, HostError>> + Send;

    /// Persist controller state after a committed transition.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the persistence store is unreachable.
    fn save_persisted(
        &self,
        zone: ZoneId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Push display attributes to the host UI.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the host rejects the update.
    fn emit_attributes(
        &self,
        zone: ZoneId,
        attributes: &StateAttributes,
    ) -> impl Future<Output = Result<(), HostError>> + Send;
}

impl<T: HostContext> HostContext for std::sync::Arc<T> {
    fn read_sensor(&self, entity: &EntityRef) -> impl Future<Output = Reading> + Send {
        (**self).read_sensor(entity)
    }

    fn read_main_thermostat(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = MainSnapshot> + Send {
        (**self).read_main_thermostat(entity)
    }

    fn set_actuator(
        &self,
        entity: &EntityRef,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuatorError>> + Send {
        (**self).set_actuator(entity, on)
    }

    fn load_persisted(
        &self,
        zone: ZoneId,
    ) -> impl Future<Output = Result<Option<PersistedState>, HostError>> + Send {
        (**self).load_persisted(zone)
    }

    fn save_persisted(
        &self,
        zone: ZoneId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        (**self).save_persisted(zone, state)
    }

    fn emit_attributes(
        &self,
        zone: ZoneId,
        attributes: &StateAttributes,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        (**self).emit_attributes(zone, attributes)
    }
}
