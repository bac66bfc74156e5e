//! Typed identifiers — UUID-backed zone ids and validated host entity refs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a configured thermostat zone.
    ZoneId
);

impl ZoneId {
    /// Derive a stable identifier from a configured zone name, so a zone
    /// finds its persisted state again after a restart.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::from_uuid(uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            name.as_bytes(),
        ))
    }
}

/// Reference to an entity owned by the host, in `domain.object_id` form
/// (e.g. `sensor.hallway_temperature`, `switch.damper_a`).
///
/// The host resolves and validates the referenced entity; this type only
/// enforces the lexical shape so refs can be used as stable map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Parse and validate an entity reference.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityRef`] unless the value is
    /// `<domain>.<object_id>` with both halves non-empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        match raw.split_once('.') {
            Some((domain, object)) if !domain.is_empty() && !object.is_empty() => Ok(Self(raw)),
            _ => Err(ValidationError::InvalidEntityRef { raw }),
        }
    }

    /// The domain half of the reference (`sensor`, `switch`, `climate`, …).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(d, _)| d)
    }

    /// The full `domain.object_id` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = ZoneId::new();
        let b = ZoneId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_roundtrip_zone_id_through_display_and_from_str() {
        let id = ZoneId::new();
        let text = id.to_string();
        let parsed: ZoneId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_derive_stable_zone_id_from_name() {
        assert_eq!(ZoneId::from_name("hallway"), ZoneId::from_name("hallway"));
        assert_ne!(ZoneId::from_name("hallway"), ZoneId::from_name("office"));
    }

    #[test]
    fn should_accept_well_formed_entity_ref() {
        let re = EntityRef::new("sensor.hallway_temperature").unwrap();
        assert_eq!(re.domain(), "sensor");
        assert_eq!(re.as_str(), "sensor.hallway_temperature");
    }

    #[test]
    fn should_reject_entity_ref_without_dot() {
        let result = EntityRef::new("hallway");
        assert!(matches!(
            result,
            Err(ValidationError::InvalidEntityRef { .. })
        ));
    }

    #[test]
    fn should_reject_entity_ref_with_empty_domain() {
        assert!(EntityRef::new(".damper_a").is_err());
    }

    #[test]
    fn should_reject_entity_ref_with_empty_object_id() {
        assert!(EntityRef::new("switch.").is_err());
    }

    #[test]
    fn should_roundtrip_entity_ref_through_serde_json() {
        let re = EntityRef::new("switch.damper_a").unwrap();
        let json = serde_json::to_string(&re).unwrap();
        assert_eq!(json, "\"switch.damper_a\"");
        let parsed: EntityRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, re);
    }
}
