//! Damper Priority Arbiter — caps how many dampers may be closed at once.
//!
//! Closing too many dampers starves the blower and risks static-pressure
//! damage, so the registry carries a `max_switches_off` cap. When more
//! zones want to close than the cap allows, the highest-priority closed
//! candidates are forced back open (rank 1 is the most eligible to stay
//! open) until exactly `max_switches_off` remain closed.
//!
//! The registry is an explicit ordered sequence; ties between equal
//! priority ranks are broken by configuration order, never by map
//! iteration order.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::EntityRef;

/// One damper actuator and its priority rank (1 = highest priority).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamperSlot {
    pub actuator: EntityRef,
    pub priority: u32,
}

/// Final desired state for one actuator, consumed by actuator IO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub actuator: EntityRef,
    pub open: bool,
}

/// Ordered damper registry with the protection cap.
#[derive(Debug, Clone)]
pub struct DamperRegistry {
    slots: Vec<DamperSlot>,
    max_switches_off: usize,
}

impl DamperRegistry {
    /// Build a registry from configured slots.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the slot list is empty, an
    /// actuator appears twice, or `max_switches_off` would allow closing
    /// every damper (at least one must always stay open).
    pub fn new(
        slots: Vec<DamperSlot>,
        max_switches_off: usize,
    ) -> Result<Self, ValidationError> {
        if slots.is_empty() {
            return Err(ValidationError::EmptyRegistry);
        }
        for (idx, slot) in slots.iter().enumerate() {
            if slots[..idx].iter().any(|s| s.actuator == slot.actuator) {
                return Err(ValidationError::DuplicateDamper {
                    actuator: slot.actuator.clone(),
                });
            }
        }
        if max_switches_off > slots.len() - 1 {
            return Err(ValidationError::CapTooHigh {
                cap: max_switches_off,
                max: slots.len() - 1,
                count: slots.len(),
            });
        }
        Ok(Self {
            slots,
            max_switches_off,
        })
    }

    /// The configured cap on simultaneously-closed dampers.
    #[must_use]
    pub fn max_switches_off(&self) -> usize {
        self.max_switches_off
    }

    /// Number of registered dampers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether an actuator is governed by this registry.
    #[must_use]
    pub fn contains(&self, actuator: &EntityRef) -> bool {
        self.slots.iter().any(|s| &s.actuator == actuator)
    }

    /// (priority rank, configuration index) sort key for an actuator.
    fn rank_of(&self, actuator: &EntityRef) -> Option<(u32, usize)> {
        self.slots
            .iter()
            .position(|s| &s.actuator == actuator)
            .map(|idx| (self.slots[idx].priority, idx))
    }

    /// Resolve per-zone gated intents into final per-actuator commands.
    ///
    /// `intents` holds each zone's naive desired state (`true` = open).
    /// Actuators absent from `intents` get no command and stay at their
    /// last commanded state; actuators not governed by the registry pass
    /// through unchanged. Output order matches input order.
    #[must_use]
    pub fn arbitrate(&self, intents: &[(EntityRef, bool)]) -> Vec<ActuatorCommand> {
        // `new` rejects caps above `len - 1`, so this clamp is a
        // safeguard only; the config layer warns and clamps before a
        // registry is ever built.
        let cap = self.max_switches_off.min(self.slots.len() - 1);

        let mut closed: Vec<&EntityRef> = intents
            .iter()
            .filter(|(actuator, open)| !open && self.contains(actuator))
            .map(|(actuator, _)| actuator)
            .collect();

        let forced_open: Vec<&EntityRef> = if closed.len() > cap {
            closed.sort_by_key(|actuator| self.rank_of(actuator));
            closed[..closed.len() - cap].to_vec()
        } else {
            Vec::new()
        };

        intents
            .iter()
            .map(|(actuator, open)| ActuatorCommand {
                actuator: actuator.clone(),
                open: *open || forced_open.contains(&actuator),
            })
            .collect()
    }
}
