//! Configuration for the simulation clock.

use serde::{Deserialize, Serialize};

/// Lowest accepted speed multiplier.
pub const SPEED_MULTIPLIER_MIN: f64 = 0.1;
/// Highest accepted speed multiplier.
pub const SPEED_MULTIPLIER_MAX: f64 = 3.0;

/// Controls how far the clock advances per tick and how chatty the engine is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation time increment per tick, before speed scaling.
    pub time_step: f64,
    /// Speed control multiplier, clamped to [0.1, 3.0].
    pub speed_multiplier: f64,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            speed_multiplier: 0.1,
            verbosity: 0,
        }
    }
}

impl SimulationConfig {
    /// Set the speed multiplier, clamping to the accepted range.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.speed_multiplier = multiplier.clamp(SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_MAX);
    }

    /// Clock advance for one tick.
    pub fn tick_delta(&self) -> f64 {
        self.time_step * self.speed_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert!((config.time_step - 0.1).abs() < 1e-9);
        assert!((config.speed_multiplier - 0.1).abs() < 1e-9);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_speed_clamping() {
        let mut config = SimulationConfig::default();

        config.set_speed_multiplier(5.0);
        assert!((config.speed_multiplier - SPEED_MULTIPLIER_MAX).abs() < 1e-9);

        config.set_speed_multiplier(0.0);
        assert!((config.speed_multiplier - SPEED_MULTIPLIER_MIN).abs() < 1e-9);

        config.set_speed_multiplier(1.5);
        assert!((config.speed_multiplier - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_tick_delta() {
        let config = SimulationConfig {
            time_step: 0.5,
            speed_multiplier: 2.0,
            verbosity: 0,
        };
        assert!((config.tick_delta() - 1.0).abs() < 1e-9);
    }
}
