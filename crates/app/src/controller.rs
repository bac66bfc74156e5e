//! Thermostat state machine — the per-zone controller.
//!
//! The authoritative stored state is `{mode, setpoint, preset,
//! last-commanded actuator state}`; everything else (idle vs active,
//! heating vs cooling) is derived per evaluation. Every triggering event
//! — a sensor update, a main-thermostat change, an explicit command, a
//! keep-alive tick — re-runs the policy → gate pipeline and issues
//! actuator IO only when the computed command differs from the last
//! committed one. A failed actuator call leaves the committed state
//! untouched, so the next trigger retries the same transition.

use tracing::{debug, info, warn};

use zonestat_domain::error::{ActuatorError, HostError, ValidationError, ZoneStatError};
use zonestat_domain::gate::gate;
use zonestat_domain::id::{EntityRef, ZoneId};
use zonestat_domain::mode::{HvacAction, HvacMode};
use zonestat_domain::policy::{self, ZoneIntent};
use zonestat_domain::reading::Reading;
use zonestat_domain::setpoint::{Setpoint, TemperatureLimits, ToleranceBand};
use zonestat_domain::time::now;

use crate::ports::host::{HostContext, MainSnapshot, PersistedState, Preset, StateAttributes};

/// Immutable per-zone configuration, validated by the host's config
/// layer before it reaches the core.
#[derive(Debug, Clone)]
pub struct ZoneConfig {
    pub name: String,
    /// Temperature sources; more than one is averaged per reading.
    pub sensors: Vec<EntityRef>,
    pub humidity_sensor: Option<EntityRef>,
    /// The heater/damper switch.
    pub actuator: EntityRef,
    /// Separate cooling switch; when set, the heat and cool sub-intents
    /// each drive their own actuator instead of being OR-ed.
    pub cool_actuator: Option<EntityRef>,
    /// Upstream thermostat whose reported action gates this zone.
    pub main_thermostat: Option<EntityRef>,
    pub limits: TemperatureLimits,
    pub tolerances: ToleranceBand,
    pub initial_mode: HvacMode,
    pub initial_setpoint: Option<Setpoint>,
    /// Target substituted while the `away` preset is active.
    pub away_target: Option<f64>,
}

impl ZoneConfig {
    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when there is no temperature
    /// sensor, or a configured target lies outside the limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sensors.is_empty() {
            return Err(ValidationError::NoSensors {
                zone: self.name.clone(),
            });
        }
        if let Some(setpoint) = &self.initial_setpoint {
            setpoint.validate(&self.limits)?;
        }
        if let Some(away) = self.away_target {
            if !self.limits.contains(away) {
                return Err(ValidationError::SetpointOutOfLimits {
                    target: away,
                    min: self.limits.min,
                    max: self.limits.max,
                });
            }
        }
        Ok(())
    }
}

/// One zone's controller, generic over the host port.
pub struct Thermostat<H> {
    host: H,
    id: ZoneId,
    config: ZoneConfig,

    mode: HvacMode,
    setpoint: Setpoint,
    preset: Preset,

    intent: ZoneIntent,
    gated: ZoneIntent,
    stale: bool,
    /// The damper is forced closed until the first valid reading.
    ever_valid: bool,

    current: Option<Reading>,
    humidity: Option<Reading>,
    main: MainSnapshot,

    commanded: Option<bool>,
    commanded_cool: Option<bool>,
}

impl<H: HostContext> Thermostat<H> {
    /// Create a controller for one configured zone.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the configuration breaks a
    /// domain invariant.
    pub fn new(host: H, config: ZoneConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let setpoint = config
            .initial_setpoint
            .unwrap_or_else(|| default_setpoint(config.initial_mode, &config.limits));
        Ok(Self {
            host,
            id: ZoneId::from_name(&config.name),
            mode: config.initial_mode,
            setpoint,
            preset: Preset::None,
            intent: ZoneIntent::OFF,
            gated: ZoneIntent::OFF,
            stale: false,
            ever_valid: false,
            current: None,
            humidity: None,
            main: MainSnapshot::default(),
            commanded: None,
            commanded_cool: None,
            config,
        })
    }

    /// Load persisted state (falling back to configured defaults) and
    /// take the first input snapshot. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] when the persistence store is unreachable.
    pub async fn restore(&mut self) -> Result<(), ZoneStatError> {
        match self.host.load_persisted(self.id).await? {
            Some(state) => {
                self.mode = state.mode;
                self.setpoint = state.setpoint.clamped(&self.config.limits);
                self.preset = state.preset;
                info!(
                    zone = %self.config.name,
                    mode = %self.mode,
                    "restored persisted state"
                );
            }
            None => {
                warn!(
                    zone = %self.config.name,
                    "no previously saved state, using configured defaults"
                );
            }
        }
        self.refresh_sensors().await;
        self.refresh_main().await;
        Ok(())
    }

    // ── control surface (standalone zone) ──────────────────────────

    /// Switch the operating mode and recompute.
    ///
    /// # Errors
    ///
    /// Propagates persistence and actuator failures; the actuator
    /// failure is recoverable and retried on the next trigger.
    pub async fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<(), ZoneStatError> {
        self.store_mode(mode).await?;
        self.control_cycle(false).await
    }

    /// Change the target temperature and recompute. Out-of-limits
    /// targets are clamped with a warning rather than rejected.
    ///
    /// # Errors
    ///
    /// Propagates persistence and actuator failures.
    pub async fn set_temperature(&mut self, setpoint: Setpoint) -> Result<(), ZoneStatError> {
        self.store_setpoint(setpoint).await?;
        self.control_cycle(false).await
    }

    /// Apply or clear a preset. Presets swap the active setpoint only;
    /// the mode is untouched and the prior setpoint returns when the
    /// preset is cleared.
    ///
    /// # Errors
    ///
    /// Propagates persistence and actuator failures.
    pub async fn set_preset(&mut self, preset: Preset) -> Result<(), ZoneStatError> {
        self.store_preset(preset).await?;
        self.control_cycle(false).await
    }

    /// A tracked sensor changed: re-read and recompute.
    ///
    /// # Errors
    ///
    /// Propagates actuator and attribute-emission failures.
    pub async fn on_sensor_update(&mut self) -> Result<(), ZoneStatError> {
        self.refresh_sensors().await;
        self.control_cycle(false).await
    }

    /// The main thermostat changed: re-read its snapshot and recompute.
    ///
    /// # Errors
    ///
    /// Propagates actuator and attribute-emission failures.
    pub async fn on_main_thermostat_update(&mut self) -> Result<(), ZoneStatError> {
        self.refresh_main().await;
        self.control_cycle(false).await
    }

    /// Keep-alive: re-issue the current command even when unchanged, so
    /// an actuator that silently drifted out of sync is corrected.
    ///
    /// # Errors
    ///
    /// Propagates actuator and attribute-emission failures.
    pub async fn periodic_tick(&mut self) -> Result<(), ZoneStatError> {
        self.control_cycle(true).await
    }

    // ── state accessors ────────────────────────────────────────────

    #[must_use]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn mode(&self) -> HvacMode {
        self.mode
    }

    #[must_use]
    pub fn setpoint(&self) -> Setpoint {
        self.setpoint
    }

    #[must_use]
    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// What the zone is doing right now, for display.
    #[must_use]
    pub fn hvac_action(&self) -> HvacAction {
        policy::hvac_action(self.mode, self.gated)
    }

    /// Whether the last evaluation ran on a stale reading.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.current.and_then(|r| r.value())
    }

    /// The damper actuator governed by the priority arbiter.
    #[must_use]
    pub fn damper(&self) -> &EntityRef {
        &self.config.actuator
    }

    /// Last committed damper state, if any command was ever issued.
    #[must_use]
    pub fn last_commanded(&self) -> Option<bool> {
        self.commanded
    }

    // ── internals shared with the coordinator ──────────────────────

    pub(crate) async fn store_mode(&mut self, mode: HvacMode) -> Result<(), ZoneStatError> {
        if self.mode != mode {
            info!(zone = %self.config.name, %mode, "hvac mode changed");
            self.mode = mode;
            self.persist().await?;
        }
        Ok(())
    }

    pub(crate) async fn store_setpoint(&mut self, setpoint: Setpoint) -> Result<(), ZoneStatError> {
        let clamped = setpoint.clamped(&self.config.limits);
        if clamped != setpoint {
            warn!(
                zone = %self.config.name,
                "requested setpoint outside limits, clamped"
            );
        }
        self.setpoint = clamped;
        self.persist().await
    }

    pub(crate) async fn store_preset(&mut self, preset: Preset) -> Result<(), ZoneStatError> {
        if preset == self.preset {
            return Ok(());
        }
        if preset == Preset::Away && self.config.away_target.is_none() {
            warn!(
                zone = %self.config.name,
                "away preset requested but no away target configured"
            );
            return Ok(());
        }
        info!(zone = %self.config.name, ?preset, "preset changed");
        self.preset = preset;
        self.persist().await
    }

    pub(crate) async fn refresh_sensors(&mut self) {
        let mut readings = Vec::with_capacity(self.config.sensors.len());
        for sensor in &self.config.sensors {
            readings.push(self.host.read_sensor(sensor).await);
        }
        if let Some(snapshot) = Reading::average(&readings) {
            if snapshot.valid && !self.ever_valid {
                self.ever_valid = true;
                info!(
                    zone = %self.config.name,
                    current = snapshot.value,
                    "first valid reading obtained, zone control active"
                );
            }
            self.current = Some(snapshot);
        }
        if let Some(humidity_sensor) = &self.config.humidity_sensor {
            self.humidity = Some(self.host.read_sensor(humidity_sensor).await);
        }
    }

    pub(crate) async fn refresh_main(&mut self) {
        let Some(main) = &self.config.main_thermostat else {
            return;
        };
        let snapshot = self.host.read_main_thermostat(main).await;
        if snapshot.action != self.main.action {
            debug!(
                zone = %self.config.name,
                action = %snapshot.action,
                "main thermostat action changed"
            );
        }
        self.main = snapshot;
    }

    /// Re-run policy and gate over the cached inputs.
    pub(crate) fn decide(&mut self) {
        let reading = self.current.unwrap_or_else(|| Reading::invalid(now()));
        let decision = policy::decide(
            self.mode,
            &reading,
            &self.active_setpoint(),
            &self.config.tolerances,
            self.intent,
        );
        self.intent = decision.intent;
        self.stale = decision.stale;
        self.gated = if self.config.main_thermostat.is_some() {
            gate(self.mode, self.intent, self.main.action)
        } else {
            self.intent
        };
    }

    /// Desired damper state. A zone that has never produced a valid
    /// reading is forced closed; the hold-on-stale rule only applies
    /// once a valid reading has existed.
    pub(crate) fn damper_wish(&self) -> bool {
        if !self.ever_valid {
            return false;
        }
        if self.config.cool_actuator.is_some() {
            self.gated.heat
        } else {
            self.gated.energized()
        }
    }

    pub(crate) fn cool_wish(&self) -> Option<bool> {
        if self.config.cool_actuator.is_none() {
            return None;
        }
        Some(self.ever_valid && self.gated.cool)
    }

    /// Idempotent damper IO: issue the call only when the desired state
    /// differs from the committed one (or on a forced keep-alive).
    pub(crate) async fn apply_damper(
        &mut self,
        open: bool,
        force: bool,
    ) -> Result<(), ActuatorError> {
        if !force && self.commanded == Some(open) {
            return Ok(());
        }
        match self.host.set_actuator(&self.config.actuator, open).await {
            Ok(()) => {
                if self.commanded != Some(open) {
                    info!(
                        zone = %self.config.name,
                        actuator = %self.config.actuator,
                        open,
                        "damper command issued"
                    );
                }
                self.commanded = Some(open);
                Ok(())
            }
            Err(err) => {
                warn!(
                    zone = %self.config.name,
                    error = %err,
                    "actuator call failed, will retry on next trigger"
                );
                Err(err)
            }
        }
    }

    pub(crate) async fn apply_cool(&mut self, on: bool, force: bool) -> Result<(), ActuatorError> {
        let Some(cool_actuator) = self.config.cool_actuator.clone() else {
            return Ok(());
        };
        if !force && self.commanded_cool == Some(on) {
            return Ok(());
        }
        match self.host.set_actuator(&cool_actuator, on).await {
            Ok(()) => {
                self.commanded_cool = Some(on);
                Ok(())
            }
            Err(err) => {
                warn!(
                    zone = %self.config.name,
                    error = %err,
                    "cool actuator call failed, will retry on next trigger"
                );
                Err(err)
            }
        }
    }

    pub(crate) async fn publish_attributes(&self) -> Result<(), HostError> {
        let attributes = StateAttributes {
            zone: self.config.name.clone(),
            hvac_mode: self.mode,
            hvac_action: self.hvac_action(),
            preset: self.preset,
            target: self.setpoint,
            current_temperature: self.current_temperature(),
            current_humidity: self.humidity.and_then(|r| r.value()),
            stale: self.stale,
            cold_tolerance: self.config.tolerances.cold,
            hot_tolerance: self.config.tolerances.hot,
            main_thermostat_action: self.config.main_thermostat.as_ref().map(|_| self.main.action),
            main_thermostat_target: self
                .config
                .main_thermostat
                .as_ref()
                .and_then(|_| self.main.target),
        };
        self.host.emit_attributes(self.id, &attributes).await
    }

    async fn control_cycle(&mut self, force: bool) -> Result<(), ZoneStatError> {
        self.decide();
        let open = self.damper_wish();
        let mut io_result = self.apply_damper(open, force).await;
        if let Some(on) = self.cool_wish() {
            let cool_result = self.apply_cool(on, force).await;
            if io_result.is_ok() {
                io_result = cool_result;
            }
        }
        self.publish_attributes().await?;
        io_result.map_err(ZoneStatError::from)
    }

    /// The setpoint the policy evaluates against: the away target while
    /// the `away` preset is active, the stored setpoint otherwise.
    fn active_setpoint(&self) -> Setpoint {
        match (self.preset, self.config.away_target) {
            (Preset::Away, Some(target)) => Setpoint::Single { target },
            _ => self.setpoint,
        }
    }

    async fn persist(&self) -> Result<(), ZoneStatError> {
        let state = PersistedState {
            mode: self.mode,
            setpoint: self.setpoint,
            preset: self.preset,
        };
        self.host
            .save_persisted(self.id, &state)
            .await
            .map_err(ZoneStatError::from)
    }
}

/// Fallback target when neither configuration nor persistence provides
/// one: coolers default to the warm end, heaters to the cold end.
fn default_setpoint(mode: HvacMode, limits: &TemperatureLimits) -> Setpoint {
    match mode {
        HvacMode::Cool => Setpoint::Single { target: limits.max },
        HvacMode::HeatCool => Setpoint::Range {
            low: limits.min,
            high: limits.max,
        },
        _ => Setpoint::Single { target: limits.min },
    }
}
