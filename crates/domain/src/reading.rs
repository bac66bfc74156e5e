//! Readings — normalized sensor snapshots.
//!
//! A [`Reading`] is produced fresh on every sensor event and never
//! persisted. Raw host states arrive as strings (`"21.5"`, `"unknown"`,
//! `"unavailable"`) and are normalized here; anything non-numeric marks
//! the reading invalid so the control policy can hold its last intent
//! instead of flapping.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A single normalized sensor value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub timestamp: Timestamp,
    pub valid: bool,
}

impl Reading {
    /// A valid reading.
    #[must_use]
    pub fn new(value: f64, timestamp: Timestamp) -> Self {
        Self {
            value,
            timestamp,
            valid: true,
        }
    }

    /// An invalid reading (source unavailable or non-numeric).
    #[must_use]
    pub fn invalid(timestamp: Timestamp) -> Self {
        Self {
            value: 0.0,
            timestamp,
            valid: false,
        }
    }

    /// Normalize a raw host state string.
    ///
    /// `"unavailable"`, `"unknown"`, empty, non-numeric, and non-finite
    /// values all produce an invalid reading.
    #[must_use]
    pub fn from_raw(raw: &str, timestamp: Timestamp) -> Self {
        match raw.trim() {
            "" | "unavailable" | "unknown" => Self::invalid(timestamp),
            trimmed => match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Self::new(value, timestamp),
                _ => Self::invalid(timestamp),
            },
        }
    }

    /// Combine readings from several sensors into one snapshot.
    ///
    /// The value is the mean of the *valid* readings; invalid sources are
    /// skipped. The result is invalid when no source is valid or the
    /// slice is empty. The timestamp is the newest contributing one.
    #[must_use]
    pub fn average(readings: &[Reading]) -> Option<Reading> {
        let newest = readings.iter().map(|r| r.timestamp).max()?;
        let valid: Vec<f64> = readings
            .iter()
            .filter(|r| r.valid)
            .map(|r| r.value)
            .collect();
        if valid.is_empty() {
            return Some(Reading::invalid(newest));
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        Some(Reading::new(mean, newest))
    }

    /// The numeric value, or `None` when the reading is invalid.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    #[test]
    fn should_parse_numeric_state() {
        let reading = Reading::from_raw("21.5", now());
        assert!(reading.valid);
        assert!((reading.value - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_parse_numeric_state_with_whitespace() {
        let reading = Reading::from_raw(" 19 ", now());
        assert_eq!(reading.value(), Some(19.0));
    }

    #[test]
    fn should_mark_unavailable_state_invalid() {
        assert!(!Reading::from_raw("unavailable", now()).valid);
    }

    #[test]
    fn should_mark_unknown_state_invalid() {
        assert!(!Reading::from_raw("unknown", now()).valid);
    }

    #[test]
    fn should_mark_non_numeric_state_invalid() {
        assert!(!Reading::from_raw("warmish", now()).valid);
    }

    #[test]
    fn should_mark_nan_invalid() {
        assert!(!Reading::from_raw("NaN", now()).valid);
    }

    #[test]
    fn should_mark_infinity_invalid() {
        assert!(!Reading::from_raw("inf", now()).valid);
    }

    #[test]
    fn should_average_valid_readings_only() {
        let ts = now();
        let readings = [
            Reading::new(20.0, ts),
            Reading::invalid(ts),
            Reading::new(22.0, ts),
        ];
        let avg = Reading::average(&readings).unwrap();
        assert!(avg.valid);
        assert!((avg.value - 21.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_return_invalid_average_when_all_sources_invalid() {
        let ts = now();
        let readings = [Reading::invalid(ts), Reading::invalid(ts)];
        let avg = Reading::average(&readings).unwrap();
        assert!(!avg.valid);
    }

    #[test]
    fn should_return_none_average_for_empty_slice() {
        assert!(Reading::average(&[]).is_none());
    }

    #[test]
    fn should_hide_value_when_invalid() {
        assert_eq!(Reading::invalid(now()).value(), None);
    }
}
