//! Synthetic sensor data for demo mode.
//!
//! Each channel rides its own slow sine so the three traces drift out of
//! phase, jitter keeps the plot from looking machine-made, and current bleeds
//! into temperature the way a real resistive load warms its sensor.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::SensorFrame;

pub const VOLTAGE_BOUNDS: (f64, f64) = (3.0, 5.2);
pub const CURRENT_BOUNDS: (f64, f64) = (0.1, 2.5);
pub const TEMPERATURE_BOUNDS: (f64, f64) = (18.0, 35.0);

pub struct DemoGenerator {
    started: Instant,
    rng: StdRng,
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn next_frame(&mut self) -> SensorFrame {
        let elapsed = self.started.elapsed().as_secs_f64();

        // Distinct periods per channel: 60s, 45s, 120s.
        let base_voltage = 4.2 + 0.3 * (elapsed / 60.0).sin();
        let base_current = 1.0 + 0.4 * (elapsed / 45.0).sin();
        let base_temperature = 22.0 + 2.0 * (elapsed / 120.0).sin();

        let voltage = base_voltage + self.rng.gen_range(-0.2..0.2);
        let current = base_current + self.rng.gen_range(-0.15..0.15);
        // Load coupling: running hotter than 1A warms the sensor.
        let temperature =
            base_temperature + self.rng.gen_range(-0.5..0.5) + (current - 1.0) * 2.0;

        SensorFrame {
            voltage: voltage.clamp(VOLTAGE_BOUNDS.0, VOLTAGE_BOUNDS.1),
            current: current.clamp(CURRENT_BOUNDS.0, CURRENT_BOUNDS.1),
            temperature: temperature.clamp(TEMPERATURE_BOUNDS.0, TEMPERATURE_BOUNDS.1),
        }
    }
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;
    use chrono::Utc;

    #[test]
    fn frames_stay_inside_realistic_bounds() {
        let mut generator = DemoGenerator::new();
        for _ in 0..500 {
            let frame = generator.next_frame();
            assert!(frame.voltage >= VOLTAGE_BOUNDS.0 && frame.voltage <= VOLTAGE_BOUNDS.1);
            assert!(frame.current >= CURRENT_BOUNDS.0 && frame.current <= CURRENT_BOUNDS.1);
            assert!(
                frame.temperature >= TEMPERATURE_BOUNDS.0
                    && frame.temperature <= TEMPERATURE_BOUNDS.1
            );
        }
    }

    #[test]
    fn frames_are_never_mistaken_for_idle_data() {
        let mut generator = DemoGenerator::new();
        for _ in 0..100 {
            let reading = Reading::from_frame(generator.next_frame(), Utc::now());
            assert!(!reading.is_idle());
        }
    }
}
