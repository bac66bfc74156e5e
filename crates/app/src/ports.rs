//! Port definitions — traits the embedding host implements.
//!
//! Ports are the boundaries between the control core and the outside
//! world. They are defined here (in `app`) so that both the state
//! machine and the adapter layer can depend on them without creating
//! circular dependencies.

pub mod host;

pub use host::{HostContext, MainSnapshot, PersistedState, Preset, StateAttributes};
