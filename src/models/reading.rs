//! Sensor reading data model.
//!
//! A `SensorFrame` is the raw voltage/current/temperature triple decoded from
//! one device line; the acquisition engine stamps it with an arrival time to
//! produce a `Reading`, then tags it with its `Provenance` before it enters
//! the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded voltage/current/temperature triple, not yet timestamped.
///
/// Deserializes directly from the device's object framing; a missing or
/// non-numeric field is a parse failure, extra keys are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SensorFrame {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
}

/// One timestamped sensor sample. The timestamp is assigned by the engine at
/// arrival; it is `None` only for the zero-valued default served before the
/// first sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            voltage: 0.0,
            current: 0.0,
            temperature: 0.0,
            timestamp: None,
        }
    }
}

impl Reading {
    pub fn from_frame(frame: SensorFrame, timestamp: DateTime<Utc>) -> Self {
        Self {
            voltage: frame.voltage,
            current: frame.current,
            temperature: frame.temperature,
            timestamp: Some(timestamp),
        }
    }

    /// Derived on read; never stored as its own column.
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }

    /// An all-zero sample means the device is idle or not yet reporting and
    /// is kept out of both persistence sinks. A genuinely all-zero physical
    /// state is indistinguishable from that and is dropped too.
    pub fn is_idle(&self) -> bool {
        self.voltage == 0.0 && self.current == 0.0 && self.temperature == 0.0
    }
}

/// Where a sample came from. Synthetic samples feed the cache and the
/// queryable store but never the daily CSV log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    Real,
    Synthetic,
}

impl Provenance {
    pub fn is_real(self) -> bool {
        self == Provenance::Real
    }
}

/// A reading tagged with its provenance, flowing through one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub reading: Reading,
    pub provenance: Provenance,
}

impl Sample {
    pub fn real(reading: Reading) -> Self {
        Self {
            reading,
            provenance: Provenance::Real,
        }
    }

    pub fn synthetic(reading: Reading) -> Self {
        Self {
            reading,
            provenance: Provenance::Synthetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_is_zero_valued_and_unstamped() {
        let reading = Reading::default();
        assert_eq!(reading.voltage, 0.0);
        assert_eq!(reading.current, 0.0);
        assert_eq!(reading.temperature, 0.0);
        assert!(reading.timestamp.is_none());
        assert!(reading.is_idle());
    }

    #[test]
    fn idle_requires_all_three_channels_zero() {
        let frame = SensorFrame {
            voltage: 0.0,
            current: 0.0,
            temperature: 21.0,
        };
        let reading = Reading::from_frame(frame, Utc::now());
        assert!(!reading.is_idle());
    }

    #[test]
    fn power_is_derived_from_voltage_and_current() {
        let reading = Reading::from_frame(
            SensorFrame {
                voltage: 5.0,
                current: 1.5,
                temperature: 25.0,
            },
            Utc::now(),
        );
        assert!((reading.power() - 7.5).abs() < f64::EPSILON);
    }
}
