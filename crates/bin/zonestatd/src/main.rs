//! # zonestatd — zonestat daemon
//!
//! Composition root that wires the zone controllers together and runs
//! a simulated house against them.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing
//! - Construct the virtual host adapter and seed its entities
//! - Construct one thermostat per zone plus the damper coordinator
//! - Restore persisted state, then drive the control loop: simulated
//!   sensor drift on every tick, a forced keep-alive every N ticks
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no control logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zonestat_adapter_virtual::VirtualHost;
use zonestat_app::controller::Thermostat;
use zonestat_app::coordinator::DamperCoordinator;
use zonestat_app::ports::host::MainSnapshot;
use zonestat_domain::arbiter::DamperRegistry;
use zonestat_domain::id::EntityRef;
use zonestat_domain::mode::{HvacAction, HvacMode};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let host = Arc::new(VirtualHost::new());

    // Wire one controller per zone; remember the entity refs the
    // simulation has to animate.
    let mut zones = Vec::with_capacity(config.zones.len());
    let mut slots = Vec::with_capacity(config.zones.len());
    let mut simulated = Vec::with_capacity(config.zones.len());
    let mut mains: Vec<EntityRef> = Vec::new();
    for entry in &config.zones {
        slots.push(entry.damper_slot()?);
        let zone_config = entry.to_zone_config()?;
        if let Some(main) = &zone_config.main_thermostat {
            if !mains.contains(main) {
                mains.push(main.clone());
            }
        }
        let start = entry.target.unwrap_or(18.0) - 1.5;
        for sensor in &zone_config.sensors {
            host.set_sensor(sensor, format!("{start:.1}"));
        }
        simulated.push(SimulatedZone {
            sensors: zone_config.sensors.clone(),
            damper: zone_config.actuator.clone(),
            temperature: start,
        });
        zones.push(Thermostat::new(Arc::clone(&host), zone_config)?);
    }
    for main in &mains {
        host.set_main_thermostat(main, idle_snapshot());
    }

    let registry = DamperRegistry::new(slots, config.arbiter.max_switches_off)?;
    let mut coordinator = DamperCoordinator::new(zones, registry);
    coordinator.restore_all().await?;
    info!(
        zones = config.zones.len(),
        max_switches_off = config.arbiter.max_switches_off,
        "zonestatd running"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.simulation.tick_secs));
    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick += 1;
                step(&host, &mut coordinator, &mut simulated, &mains).await;
                if tick % config.simulation.keepalive_every == 0 {
                    if let Err(err) = coordinator.periodic_tick().await {
                        warn!(error = %err, "keep-alive cycle failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

struct SimulatedZone {
    sensors: Vec<EntityRef>,
    damper: EntityRef,
    temperature: f64,
}

fn idle_snapshot() -> MainSnapshot {
    MainSnapshot {
        action: HvacAction::Idle,
        target: Some(21.0),
        mode: Some(HvacMode::Heat),
    }
}

/// One simulation tick: the main unit follows aggregate demand, zones
/// with an open damper warm up while the rest slowly cool down.
async fn step(
    host: &Arc<VirtualHost>,
    coordinator: &mut DamperCoordinator<Arc<VirtualHost>>,
    simulated: &mut [SimulatedZone],
    mains: &[EntityRef],
) {
    let any_open = simulated
        .iter()
        .any(|zone| host.actuator_state(&zone.damper) == Some(true));
    let action = if any_open {
        HvacAction::Heating
    } else {
        HvacAction::Idle
    };
    for main in mains {
        host.set_main_thermostat(
            main,
            MainSnapshot {
                action,
                ..idle_snapshot()
            },
        );
    }
    if let Err(err) = coordinator.on_main_thermostat_update().await {
        warn!(error = %err, "main thermostat cycle failed");
    }

    for (index, zone) in simulated.iter_mut().enumerate() {
        let heated =
            action == HvacAction::Heating && host.actuator_state(&zone.damper) == Some(true);
        zone.temperature += if heated { 0.3 } else { -0.1 };
        for sensor in &zone.sensors {
            host.set_sensor(sensor, format!("{:.1}", zone.temperature));
        }
        if let Err(err) = coordinator.on_sensor_update(index).await {
            warn!(error = %err, "sensor cycle failed");
        }
    }
}
