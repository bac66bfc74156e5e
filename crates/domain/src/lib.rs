//! # zonestat-domain
//!
//! Pure domain model for the zonestat damper-thermostat control core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Readings** (normalized sensor snapshots with staleness)
//! - Define **Setpoints**, **tolerance bands**, and **temperature limits**
//! - Define **HVAC modes and actions** as closed enums
//! - The **Mode Policy** — hysteresis decisions per HVAC mode
//! - The **Coordination Gate** — filtering intents through an upstream
//!   thermostat's reported action
//! - The **Damper Priority Arbiter** — resolving per-zone intents under a
//!   cap on simultaneously-closed dampers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod arbiter;
pub mod gate;
pub mod mode;
pub mod policy;
pub mod reading;
pub mod setpoint;
