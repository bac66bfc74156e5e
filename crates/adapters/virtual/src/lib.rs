//! # zonestat-adapter-virtual
//!
//! A virtual home-automation host: every entity lives in process memory.
//!
//! ## Responsibilities
//! - Implement the host port against in-memory entity state: sensors
//!   hold raw strings exactly as a real host would report them
//!   (including `"unavailable"` and garbage), actuators record both
//!   their current state and the ordered call history
//! - Persist controller state as JSON documents, the same shape a file
//!   or database backed store would use
//! - Inject actuator failures on demand, for exercising the retry path
//!
//! ## Dependency rule
//! Depends on `zonestat-domain` and `zonestat-app` (for the port).
//! Never imported by them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use zonestat_app::ports::host::{HostContext, MainSnapshot, PersistedState, StateAttributes};
use zonestat_domain::error::{ActuatorError, HostError};
use zonestat_domain::id::{EntityRef, ZoneId};
use zonestat_domain::reading::Reading;
use zonestat_domain::time::now;

/// In-memory host. Cheap to clone handles around via `Arc`; all state
/// sits behind mutexes so the simulation loop and assertions can poke
/// at it from outside the controller.
#[derive(Debug, Default)]
pub struct VirtualHost {
    sensors: Mutex<HashMap<EntityRef, String>>,
    main_thermostats: Mutex<HashMap<EntityRef, MainSnapshot>>,
    actuators: Mutex<HashMap<EntityRef, bool>>,
    call_log: Mutex<Vec<ActuatorCall>>,
    failing: Mutex<Vec<EntityRef>>,
    store: Mutex<HashMap<ZoneId, String>>,
    attributes: Mutex<HashMap<ZoneId, serde_json::Value>>,
}

/// One entry of the ordered actuator call history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorCall {
    pub actuator: EntityRef,
    pub on: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VirtualHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a sensor's raw state, as the host UI or a device would.
    pub fn set_sensor(&self, entity: &EntityRef, raw: impl Into<String>) {
        lock(&self.sensors).insert(entity.clone(), raw.into());
    }

    /// Mark a sensor unavailable, as a dropped device would.
    pub fn drop_sensor(&self, entity: &EntityRef) {
        self.set_sensor(entity, "unavailable");
    }

    /// Set the snapshot reported by a main thermostat entity.
    pub fn set_main_thermostat(&self, entity: &EntityRef, snapshot: MainSnapshot) {
        lock(&self.main_thermostats).insert(entity.clone(), snapshot);
    }

    /// Current switch state of an actuator, if it was ever driven.
    #[must_use]
    pub fn actuator_state(&self, entity: &EntityRef) -> Option<bool> {
        lock(&self.actuators).get(entity).copied()
    }

    /// Ordered history of every successful actuator call.
    #[must_use]
    pub fn call_log(&self) -> Vec<ActuatorCall> {
        lock(&self.call_log).clone()
    }

    /// Make future calls to an actuator fail until cleared.
    pub fn fail_actuator(&self, entity: &EntityRef) {
        lock(&self.failing).push(entity.clone());
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// The last attributes document emitted for a zone.
    #[must_use]
    pub fn attributes(&self, zone: ZoneId) -> Option<serde_json::Value> {
        lock(&self.attributes).get(&zone).cloned()
    }

    /// Raw persisted JSON document for a zone, for inspection.
    #[must_use]
    pub fn persisted_raw(&self, zone: ZoneId) -> Option<String> {
        lock(&self.store).get(&zone).cloned()
    }
}

impl HostContext for VirtualHost {
    fn read_sensor(&self, entity: &EntityRef) -> impl Future<Output = Reading> + Send {
        let raw = lock(&self.sensors).get(entity).cloned();
        async move {
            match raw {
                Some(raw) => Reading::from_raw(&raw, now()),
                None => Reading::invalid(now()),
            }
        }
    }

    fn read_main_thermostat(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = MainSnapshot> + Send {
        let snapshot = lock(&self.main_thermostats)
            .get(entity)
            .copied()
            .unwrap_or_default();
        async move { snapshot }
    }

    fn set_actuator(
        &self,
        entity: &EntityRef,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuatorError>> + Send {
        let result = if lock(&self.failing).contains(entity) {
            Err(ActuatorError {
                actuator: entity.clone(),
                reason: "virtual actuator marked as failing".to_string(),
            })
        } else {
            debug!(actuator = %entity, on, "actuator driven");
            lock(&self.actuators).insert(entity.clone(), on);
            lock(&self.call_log).push(ActuatorCall {
                actuator: entity.clone(),
                on,
            });
            Ok(())
        };
        async move { result }
    }

    fn load_persisted(
        &self,
        zone: ZoneId,
    ) -> impl Future<Output = Result<Option<PersistedState>, HostError>> + Send {
        let document = lock(&self.store).get(&zone).cloned();
        async move {
            document
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .map_err(|err| HostError::new(format!("corrupt persisted state: {err}")))
        }
    }

    fn save_persisted(
        &self,
        zone: ZoneId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        let document =
            serde_json::to_string(state).map_err(|err| HostError::new(err.to_string()));
        let result = document.map(|raw| {
            lock(&self.store).insert(zone, raw);
        });
        async move { result }
    }

    fn emit_attributes(
        &self,
        zone: ZoneId,
        attributes: &StateAttributes,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        let document =
            serde_json::to_value(attributes).map_err(|err| HostError::new(err.to_string()));
        let result = document.map(|value| {
            lock(&self.attributes).insert(zone, value);
        });
        async move { result }
    }
}
