//! # zonestat-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **host port** that the embedding home-automation host
//!   implements: sensor reads, main-thermostat reads, actuator IO,
//!   persisted-state load/save, display-attribute emission
//! - The **Thermostat state machine** — one per zone, owning mode,
//!   setpoints, presets, and the last commanded actuator state, and
//!   re-running the policy → gate pipeline on every triggering event
//! - The **Damper coordinator** — fans per-zone triggers out, collects
//!   gated intents, and applies the priority arbiter before actuator IO
//!
//! ## Dependency rule
//! Depends on `zonestat-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse. The host owns the
//! event loop; every entry point here is a short computation that issues
//! at most one outbound actuator call per actuator.

pub mod controller;
pub mod coordinator;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;
