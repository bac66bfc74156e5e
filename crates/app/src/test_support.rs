//! In-memory host used by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use zonestat_domain::error::{ActuatorError, HostError};
use zonestat_domain::id::{EntityRef, ZoneId};
use zonestat_domain::reading::Reading;
use zonestat_domain::time::now;

use crate::ports::host::{HostContext, MainSnapshot, PersistedState, StateAttributes};

#[derive(Default)]
pub(crate) struct FakeHost {
    pub(crate) sensors: Mutex<HashMap<EntityRef, String>>,
    pub(crate) main: Mutex<MainSnapshot>,
    pub(crate) actuator_calls: Mutex<Vec<(EntityRef, bool)>>,
    pub(crate) failing: Mutex<Vec<EntityRef>>,
    pub(crate) persisted: Mutex<HashMap<ZoneId, PersistedState>>,
    pub(crate) attributes: Mutex<HashMap<ZoneId, StateAttributes>>,
    pub(crate) failing_attributes: Mutex<Vec<ZoneId>>,
}

impl FakeHost {
    pub(crate) fn set_sensor(&self, entity: &EntityRef, raw: &str) {
        self.sensors
            .lock()
            .unwrap()
            .insert(entity.clone(), raw.to_string());
    }

    pub(crate) fn set_main(&self, snapshot: MainSnapshot) {
        *self.main.lock().unwrap() = snapshot;
    }

    pub(crate) fn fail_actuator(&self, entity: &EntityRef) {
        self.failing.lock().unwrap().push(entity.clone());
    }

    pub(crate) fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub(crate) fn fail_attributes(&self, zone: ZoneId) {
        self.failing_attributes.lock().unwrap().push(zone);
    }

    pub(crate) fn calls(&self) -> Vec<(EntityRef, bool)> {
        self.actuator_calls.lock().unwrap().clone()
    }
}

impl HostContext for FakeHost {
    fn read_sensor(&self, entity: &EntityRef) -> impl Future<Output = Reading> + Send {
        let raw = self.sensors.lock().unwrap().get(entity).cloned();
        async move {
            match raw {
                Some(raw) => Reading::from_raw(&raw, now()),
                None => Reading::invalid(now()),
            }
        }
    }

    fn read_main_thermostat(
        &self,
        _entity: &EntityRef,
    ) -> impl Future<Output = MainSnapshot> + Send {
        let snapshot = *self.main.lock().unwrap();
        async move { snapshot }
    }

    fn set_actuator(
        &self,
        entity: &EntityRef,
        on: bool,
    ) -> impl Future<Output = Result<(), ActuatorError>> + Send {
        let result = if self.failing.lock().unwrap().contains(entity) {
            Err(ActuatorError {
                actuator: entity.clone(),
                reason: "injected failure".to_string(),
            })
        } else {
            self.actuator_calls
                .lock()
                .unwrap()
                .push((entity.clone(), on));
            Ok(())
        };
        async move { result }
    }

    fn load_persisted(
        &self,
        zone: ZoneId,
    ) -> impl Future<Output = Result<Option<PersistedState>, HostError>> + Send {
        let state = self.persisted.lock().unwrap().get(&zone).cloned();
        async move { Ok(state) }
    }

    fn save_persisted(
        &self,
        zone: ZoneId,
        state: &PersistedState,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        self.persisted.lock().unwrap().insert(zone, state.clone());
        async move { Ok(()) }
    }

    fn emit_attributes(
        &self,
        zone: ZoneId,
        attributes: &StateAttributes,
    ) -> impl Future<Output = Result<(), HostError>> + Send {
        let result = if self.failing_attributes.lock().unwrap().contains(&zone) {
            Err(HostError::new("injected failure"))
        } else {
            self.attributes
                .lock()
                .unwrap()
                .insert(zone, attributes.clone());
            Ok(())
        };
        async move { result }
    }
}

pub(crate) fn entity(raw: &str) -> EntityRef {
    EntityRef::new(raw).unwrap()
}
