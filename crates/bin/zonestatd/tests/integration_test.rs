//! End-to-end tests for the full zonestat stack.
//!
//! Each test wires real zone controllers (and, where relevant, the real
//! damper coordinator) against the in-memory virtual host adapter — no
//! real devices, no timers.

use std::sync::Arc;

use zonestat_adapter_virtual::VirtualHost;
use zonestat_app::controller::{Thermostat, ZoneConfig};
use zonestat_app::coordinator::DamperCoordinator;
use zonestat_app::ports::host::{MainSnapshot, Preset};
use zonestat_domain::arbiter::{DamperRegistry, DamperSlot};
use zonestat_domain::id::EntityRef;
use zonestat_domain::mode::{HvacAction, HvacMode};
use zonestat_domain::setpoint::{Setpoint, TemperatureLimits, ToleranceBand};

fn entity(raw: &str) -> EntityRef {
    EntityRef::new(raw).unwrap()
}

fn zone_config(name: &str, main_thermostat: Option<&str>) -> ZoneConfig {
    ZoneConfig {
        name: name.to_string(),
        sensors: vec![entity(&format!("sensor.{name}"))],
        humidity_sensor: None,
        actuator: entity(&format!("switch.damper_{name}")),
        cool_actuator: None,
        main_thermostat: main_thermostat.map(entity),
        limits: TemperatureLimits::default(),
        tolerances: ToleranceBand::new(0.5, 0.5),
        initial_mode: HvacMode::Heat,
        initial_setpoint: Some(Setpoint::Single { target: 21.0 }),
        away_target: Some(16.0),
    }
}

// ---------------------------------------------------------------------------
// Hysteresis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_follow_asymmetric_hysteresis_band() {
    let host = Arc::new(VirtualHost::new());
    let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    let sensor = entity("sensor.hallway");
    let damper = entity("switch.damper_hallway");

    // Below target - cold_tolerance: damper opens.
    host.set_sensor(&sensor, "20.4");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));

    // Inside the band: state holds, no extra actuator traffic.
    host.set_sensor(&sensor, "20.8");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
    assert_eq!(host.call_log().len(), 1);

    // At target: damper closes (no overshoot past the bare target).
    host.set_sensor(&sensor, "21.0");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(false));
    assert_eq!(host.call_log().len(), 2);
}

// ---------------------------------------------------------------------------
// Coordination gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_defer_to_main_thermostat_action() {
    let host = Arc::new(VirtualHost::new());
    let mut zone =
        Thermostat::new(Arc::clone(&host), zone_config("office", Some("climate.main"))).unwrap();
    let damper = entity("switch.damper_office");
    host.set_sensor(&entity("sensor.office"), "19.0");
    host.set_main_thermostat(
        &entity("climate.main"),
        MainSnapshot {
            action: HvacAction::Idle,
            target: Some(21.0),
            mode: Some(HvacMode::Heat),
        },
    );

    // Zone calls for heat but the main unit is idle: stay closed.
    zone.on_main_thermostat_update().await.unwrap();
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(false));

    // Main unit starts heating: the damper may finally open.
    host.set_main_thermostat(
        &entity("climate.main"),
        MainSnapshot {
            action: HvacAction::Heating,
            target: Some(21.0),
            mode: Some(HvacMode::Heat),
        },
    );
    zone.on_main_thermostat_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
}

// ---------------------------------------------------------------------------
// Damper priority arbiter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_cap_simultaneously_closed_dampers() {
    let host = Arc::new(VirtualHost::new());
    let names = ["a", "b", "c", "d"];
    let zones = names
        .iter()
        .map(|name| Thermostat::new(Arc::clone(&host), zone_config(name, None)).unwrap())
        .collect();
    let slots = names
        .iter()
        .enumerate()
        .map(|(index, name)| DamperSlot {
            actuator: entity(&format!("switch.damper_{name}")),
            priority: u32::try_from(index).unwrap() + 1,
        })
        .collect();
    let registry = DamperRegistry::new(slots, 2).unwrap();
    let mut coordinator = DamperCoordinator::new(zones, registry);

    // Zone a calls for heat, b, c, d are satisfied.
    host.set_sensor(&entity("sensor.a"), "20.0");
    host.set_sensor(&entity("sensor.b"), "22.0");
    host.set_sensor(&entity("sensor.c"), "22.0");
    host.set_sensor(&entity("sensor.d"), "22.0");
    for index in 0..4 {
        coordinator.on_sensor_update(index).await.unwrap();
    }

    // Three closed wishes against a cap of two: b (highest priority
    // among the closed candidates) is held open for airflow.
    assert_eq!(host.actuator_state(&entity("switch.damper_a")), Some(true));
    assert_eq!(host.actuator_state(&entity("switch.damper_b")), Some(true));
    assert_eq!(host.actuator_state(&entity("switch.damper_c")), Some(false));
    assert_eq!(host.actuator_state(&entity("switch.damper_d")), Some(false));
}

// ---------------------------------------------------------------------------
// Stale sensor handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_force_damper_closed_until_first_valid_reading() {
    let host = Arc::new(VirtualHost::new());
    let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    let sensor = entity("sensor.hallway");
    let damper = entity("switch.damper_hallway");

    // No valid reading yet: the damper must be commanded closed, not
    // left in whatever physical state it happened to be in.
    host.set_sensor(&sensor, "unavailable");
    zone.on_sensor_update().await.unwrap();
    zone.periodic_tick().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(false));

    // The first valid reading below threshold lets the zone heat.
    host.set_sensor(&sensor, "19.0");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
}

#[tokio::test]
async fn should_hold_state_through_sensor_dropout_and_flag_stale() {
    let host = Arc::new(VirtualHost::new());
    let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    let sensor = entity("sensor.hallway");
    let damper = entity("switch.damper_hallway");

    host.set_sensor(&sensor, "20.0");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));

    host.drop_sensor(&sensor);
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
    let attrs = host.attributes(zone.id()).unwrap();
    assert_eq!(attrs["stale"], serde_json::Value::Bool(true));
    assert!(attrs["current_temperature"].is_null());

    host.set_sensor(&sensor, "21.2");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(false));
    let attrs = host.attributes(zone.id()).unwrap();
    assert_eq!(attrs["stale"], serde_json::Value::Bool(false));
}

// ---------------------------------------------------------------------------
// Actuator failure recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_retry_failed_actuator_commands() {
    let host = Arc::new(VirtualHost::new());
    let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    let sensor = entity("sensor.hallway");
    let damper = entity("switch.damper_hallway");

    host.set_sensor(&sensor, "20.0");
    host.fail_actuator(&damper);
    assert!(zone.on_sensor_update().await.is_err());
    assert_eq!(host.actuator_state(&damper), None);

    host.clear_failures();
    zone.periodic_tick().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
}

// ---------------------------------------------------------------------------
// Persistence across restarts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_restore_state_across_restart() {
    let host = Arc::new(VirtualHost::new());
    let sensor = entity("sensor.hallway");
    host.set_sensor(&sensor, "22.0");

    {
        let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
        zone.set_hvac_mode(HvacMode::Cool).await.unwrap();
        zone.set_temperature(Setpoint::Single { target: 24.0 })
            .await
            .unwrap();
        zone.set_preset(Preset::Away).await.unwrap();
    }

    let mut restarted =
        Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    restarted.restore().await.unwrap();
    assert_eq!(restarted.mode(), HvacMode::Cool);
    assert_eq!(restarted.setpoint(), Setpoint::Single { target: 24.0 });
    assert_eq!(restarted.preset(), Preset::Away);
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_control_against_away_target_while_preset_active() {
    let host = Arc::new(VirtualHost::new());
    let mut zone = Thermostat::new(Arc::clone(&host), zone_config("hallway", None)).unwrap();
    let sensor = entity("sensor.hallway");
    let damper = entity("switch.damper_hallway");

    // 20.0 is below the 21.0 target but well above the 16.0 away target.
    host.set_sensor(&sensor, "20.0");
    zone.on_sensor_update().await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));

    zone.set_preset(Preset::Away).await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(false));

    zone.set_preset(Preset::None).await.unwrap();
    assert_eq!(host.actuator_state(&damper), Some(true));
    assert_eq!(zone.setpoint(), Setpoint::Single { target: 21.0 });
}

// ---------------------------------------------------------------------------
// Coordinator restore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_restore_all_zones_and_run_first_cycle() {
    let host = Arc::new(VirtualHost::new());
    let names = ["a", "b"];
    let zones = names
        .iter()
        .map(|name| Thermostat::new(Arc::clone(&host), zone_config(name, None)).unwrap())
        .collect();
    let slots = names
        .iter()
        .enumerate()
        .map(|(index, name)| DamperSlot {
            actuator: entity(&format!("switch.damper_{name}")),
            priority: u32::try_from(index).unwrap() + 1,
        })
        .collect();
    let registry = DamperRegistry::new(slots, 1).unwrap();
    let mut coordinator = DamperCoordinator::new(zones, registry);

    host.set_sensor(&entity("sensor.a"), "20.0");
    host.set_sensor(&entity("sensor.b"), "22.0");
    coordinator.restore_all().await.unwrap();

    assert_eq!(host.actuator_state(&entity("switch.damper_a")), Some(true));
    assert_eq!(host.actuator_state(&entity("switch.damper_b")), Some(false));
}
