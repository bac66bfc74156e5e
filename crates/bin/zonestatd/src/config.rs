//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `zonestat.toml` in the working directory. Every field has a
//! sensible default (including a small demo zone set) so the file is
//! optional. Environment variables take precedence over file values.

use serde::Deserialize;
use tracing::warn;

use zonestat_app::controller::ZoneConfig;
use zonestat_domain::arbiter::DamperSlot;
use zonestat_domain::error::ValidationError;
use zonestat_domain::id::EntityRef;
use zonestat_domain::mode::HvacMode;
use zonestat_domain::setpoint::{DEFAULT_TOLERANCE, Setpoint, TemperatureLimits, ToleranceBand};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulation loop settings.
    pub simulation: SimulationConfig,
    /// Damper protection settings.
    pub arbiter: ArbiterConfig,
    /// Controlled zones.
    pub zones: Vec<ZoneEntry>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Simulation loop configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds between simulated sensor updates.
    pub tick_secs: u64,
    /// Forced keep-alive every N ticks.
    pub keepalive_every: u64,
}

/// Damper protection configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// How many dampers may be closed at the same time.
    pub max_switches_off: usize,
}

/// One controlled zone.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    pub name: String,
    /// Temperature sensor entities; multiple sensors are averaged.
    pub sensors: Vec<String>,
    #[serde(default)]
    pub humidity_sensor: Option<String>,
    /// The damper/heater switch entity.
    pub actuator: String,
    #[serde(default)]
    pub cool_actuator: Option<String>,
    #[serde(default)]
    pub main_thermostat: Option<String>,
    #[serde(default)]
    pub mode: HvacMode,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub target_low: Option<f64>,
    #[serde(default)]
    pub target_high: Option<f64>,
    #[serde(default = "default_tolerance")]
    pub cold_tolerance: f64,
    #[serde(default = "default_tolerance")]
    pub hot_tolerance: f64,
    #[serde(default = "default_min_temp")]
    pub min_temp: f64,
    #[serde(default = "default_max_temp")]
    pub max_temp: f64,
    #[serde(default)]
    pub away_target: Option<f64>,
    /// Damper priority rank, 1 = most eligible to stay open. Ties are
    /// broken by the order zones appear in the file.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_min_temp() -> f64 {
    TemperatureLimits::default().min
}

fn default_max_temp() -> f64 {
    TemperatureLimits::default().max
}

fn default_priority() -> u32 {
    1
}

impl ZoneEntry {
    /// Translate this entry into the controller's validated form.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when an entity reference is
    /// malformed or the temperature settings break a domain invariant.
    pub fn to_zone_config(&self) -> Result<ZoneConfig, ValidationError> {
        let sensors = self
            .sensors
            .iter()
            .map(EntityRef::new)
            .collect::<Result<Vec<_>, _>>()?;
        let initial_setpoint = match (self.target, self.target_low, self.target_high) {
            (Some(target), _, _) => Some(Setpoint::Single { target }),
            (None, Some(low), Some(high)) => Some(Setpoint::Range { low, high }),
            _ => None,
        };
        Ok(ZoneConfig {
            name: self.name.clone(),
            sensors,
            humidity_sensor: self
                .humidity_sensor
                .as_deref()
                .map(EntityRef::new)
                .transpose()?,
            actuator: EntityRef::new(&self.actuator)?,
            cool_actuator: self
                .cool_actuator
                .as_deref()
                .map(EntityRef::new)
                .transpose()?,
            main_thermostat: self
                .main_thermostat
                .as_deref()
                .map(EntityRef::new)
                .transpose()?,
            limits: TemperatureLimits::new(self.min_temp, self.max_temp)?,
            tolerances: ToleranceBand::new(self.cold_tolerance, self.hot_tolerance),
            initial_mode: self.mode,
            initial_setpoint,
            away_target: self.away_target,
        })
    }

    /// The damper registry slot for this zone.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the actuator reference is
    /// malformed.
    pub fn damper_slot(&self) -> Result<DamperSlot, ValidationError> {
        Ok(DamperSlot {
            actuator: EntityRef::new(&self.actuator)?,
            priority: self.priority,
        })
    }
}

impl Config {
    /// Load configuration from `zonestat.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("zonestat.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        config.clamp_arbiter_cap();
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ZONESTAT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("ZONESTAT_TICK_SECS") {
            if let Ok(secs) = val.parse() {
                self.simulation.tick_secs = secs;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(ConfigError::Validation(
                "at least one zone must be configured".to_string(),
            ));
        }
        if self.simulation.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "tick_secs must be non-zero".to_string(),
            ));
        }
        if self.simulation.keepalive_every == 0 {
            return Err(ConfigError::Validation(
                "keepalive_every must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// At least one damper must always stay open: a cap that would allow
    /// closing every damper is clamped to `zones - 1` with a warning
    /// rather than rejected.
    fn clamp_arbiter_cap(&mut self) {
        let max = self.zones.len().saturating_sub(1);
        if self.arbiter.max_switches_off > max {
            warn!(
                requested = self.arbiter.max_switches_off,
                clamped = max,
                "max_switches_off would allow closing every damper, clamping"
            );
            self.arbiter.max_switches_off = max;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
            arbiter: ArbiterConfig::default(),
            zones: demo_zones(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "zonestatd=info,zonestat_app=info,zonestat_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            keepalive_every: 12,
        }
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            max_switches_off: 1,
        }
    }
}

/// Demo zone set used when no `zonestat.toml` is present, so the daemon
/// has something to control out of the box.
fn demo_zones() -> Vec<ZoneEntry> {
    let zone = |name: &str, target: f64, priority: u32| ZoneEntry {
        name: name.to_string(),
        sensors: vec![format!("sensor.{name}_temperature")],
        humidity_sensor: None,
        actuator: format!("switch.damper_{name}"),
        cool_actuator: None,
        main_thermostat: Some("climate.main".to_string()),
        mode: HvacMode::Heat,
        target: Some(target),
        target_low: None,
        target_high: None,
        cold_tolerance: 0.5,
        hot_tolerance: 0.5,
        min_temp: default_min_temp(),
        max_temp: default_max_temp(),
        away_target: Some(16.0),
        priority,
    };
    vec![
        zone("living_room", 21.0, 1),
        zone("bedroom", 19.5, 2),
        zone("office", 22.0, 3),
    ]
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
