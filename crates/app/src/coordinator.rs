//! Damper coordinator — multi-zone fan-out with the priority arbiter.
//!
//! Standalone zones drive their actuator directly from the controller.
//! When several zones feed one air handler, closing too many dampers at
//! once starves the airflow, so their damper commands must pass through
//! the [`DamperRegistry`] cap first. The coordinator owns the zones,
//! fans every trigger out, collects the gated per-zone wishes, and only
//! then performs actuator IO — arbitration happens between decision and
//! IO, never after.
//!
//! One zone's actuator failure never blocks the others: the remaining
//! commands are still applied and the first failure is reported.

use tracing::warn;

use zonestat_domain::arbiter::DamperRegistry;
use zonestat_domain::error::ZoneStatError;
use zonestat_domain::mode::HvacMode;
use zonestat_domain::setpoint::Setpoint;

use crate::controller::Thermostat;
use crate::ports::host::{HostContext, Preset};

pub struct DamperCoordinator<H> {
    zones: Vec<Thermostat<H>>,
    registry: DamperRegistry,
}

impl<H: HostContext> DamperCoordinator<H> {
    #[must_use]
    pub fn new(zones: Vec<Thermostat<H>>, registry: DamperRegistry) -> Self {
        Self { zones, registry }
    }

    #[must_use]
    pub fn zones(&self) -> &[Thermostat<H>] {
        &self.zones
    }

    #[must_use]
    pub fn zone(&self, index: usize) -> Option<&Thermostat<H>> {
        self.zones.get(index)
    }

    /// Restore every zone from persistence and pull the first input
    /// snapshots. Called once at startup, before any trigger.
    ///
    /// # Errors
    ///
    /// Returns the first restore failure; remaining zones are skipped
    /// since a partially restored set must not actuate.
    pub async fn restore_all(&mut self) -> Result<(), ZoneStatError> {
        for zone in &mut self.zones {
            zone.restore().await?;
        }
        self.cycle(false).await
    }

    /// Switch one zone's operating mode.
    ///
    /// # Errors
    ///
    /// Propagates persistence failures, then the first actuator failure
    /// of the shared cycle.
    pub async fn set_hvac_mode(&mut self, zone: usize, mode: HvacMode) -> Result<(), ZoneStatError> {
        if let Some(zone) = self.zones.get_mut(zone) {
            zone.store_mode(mode).await?;
        } else {
            warn!(zone, "hvac mode command for unknown zone ignored");
        }
        self.cycle(false).await
    }

    /// Change one zone's target temperature.
    ///
    /// # Errors
    ///
    /// Propagates persistence failures, then the first actuator failure
    /// of the shared cycle.
    pub async fn set_temperature(
        &mut self,
        zone: usize,
        setpoint: Setpoint,
    ) -> Result<(), ZoneStatError> {
        if let Some(zone) = self.zones.get_mut(zone) {
            zone.store_setpoint(setpoint).await?;
        } else {
            warn!(zone, "temperature command for unknown zone ignored");
        }
        self.cycle(false).await
    }

    /// Apply or clear one zone's preset.
    ///
    /// # Errors
    ///
    /// Propagates persistence failures, then the first actuator failure
    /// of the shared cycle.
    pub async fn set_preset(&mut self, zone: usize, preset: Preset) -> Result<(), ZoneStatError> {
        if let Some(zone) = self.zones.get_mut(zone) {
            zone.store_preset(preset).await?;
        } else {
            warn!(zone, "preset command for unknown zone ignored");
        }
        self.cycle(false).await
    }

    /// A sensor tracked by one zone changed.
    ///
    /// # Errors
    ///
    /// Propagates the first actuator failure of the shared cycle.
    pub async fn on_sensor_update(&mut self, zone: usize) -> Result<(), ZoneStatError> {
        if let Some(zone) = self.zones.get_mut(zone) {
            zone.refresh_sensors().await;
        }
        self.cycle(false).await
    }

    /// The main thermostat changed; every zone gated by it re-reads its
    /// snapshot before the shared cycle.
    ///
    /// # Errors
    ///
    /// Propagates the first actuator failure of the shared cycle.
    pub async fn on_main_thermostat_update(&mut self) -> Result<(), ZoneStatError> {
        for zone in &mut self.zones {
            zone.refresh_main().await;
        }
        self.cycle(false).await
    }

    /// Keep-alive: re-issue every current command even when unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first actuator failure of the shared cycle.
    pub async fn periodic_tick(&mut self) -> Result<(), ZoneStatError> {
        self.cycle(true).await
    }

    /// The shared cycle: decide all, arbitrate, then IO.
    async fn cycle(&mut self, force: bool) -> Result<(), ZoneStatError> {
        for zone in &mut self.zones {
            zone.decide();
        }

        let mut wishes = Vec::with_capacity(self.zones.len());
        for zone in &self.zones {
            wishes.push((zone.damper().clone(), zone.damper_wish()));
        }
        let commands = self.registry.arbitrate(&wishes);

        let mut first_error: Option<ZoneStatError> = None;
        for command in &commands {
            let Some(zone) = self
                .zones
                .iter_mut()
                .find(|zone| zone.damper() == &command.actuator)
            else {
                continue;
            };
            if command.open && !zone.damper_wish() {
                warn!(
                    zone = %zone.name(),
                    damper = %command.actuator,
                    "damper held open by priority arbiter"
                );
            }
            if let Err(err) = zone.apply_damper(command.open, force).await {
                first_error.get_or_insert(err.into());
            }
        }

        for zone in &mut self.zones {
            if let Some(on) = zone.cool_wish() {
                if let Err(err) = zone.apply_cool(on, force).await {
                    first_error.get_or_insert(err.into());
                }
            }
            if let Err(err) = zone.publish_attributes().await {
                warn!(
                    zone = %zone.name(),
                    error = %err,
                    "attribute emission failed"
                );
                first_error.get_or_insert(err.into());
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
