//! Day/night cycle driving skylight.
//!
//! Time advances in simulated seconds, the same unit crop growth uses.

use serde::{Deserialize, Serialize};

use crate::{Weather, MAX_LIGHT};

/// Default length of one in-game day (20 minutes).
pub const DEFAULT_SECONDS_PER_DAY: f64 = 1200.0;

/// Elapsed simulated time and the day length it is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayCycle {
    /// Seconds since the cycle started (at midnight).
    pub elapsed: f64,
    /// Seconds in one day.
    pub seconds_per_day: f64,
}

impl DayCycle {
    /// Start at midnight.
    pub fn new(seconds_per_day: f64) -> Self {
        Self {
            elapsed: 0.0,
            seconds_per_day: seconds_per_day.max(1.0),
        }
    }

    /// Advance by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        self.elapsed += seconds;
    }

    /// Fraction of the day: 0.0 = midnight, 0.5 = noon.
    pub fn time_of_day(&self) -> f64 {
        self.elapsed.rem_euclid(self.seconds_per_day) / self.seconds_per_day
    }

    /// Sun elevation in radians, `-π/2` at midnight to `π/2` at noon.
    pub fn sun_elevation(&self) -> f64 {
        let angle = (self.time_of_day() - 0.25) * std::f64::consts::TAU;
        angle.sin() * std::f64::consts::FRAC_PI_2
    }

    /// Skylight scalar in `[0.2, 1.0]`.
    pub fn skylight_scalar(&self) -> f32 {
        let normalized = (self.sun_elevation() + std::f64::consts::FRAC_PI_2) / std::f64::consts::PI;
        (0.2 + 0.8 * normalized) as f32
    }

    /// Skylight level for sky-exposed cells under the given weather.
    pub fn skylight(&self, weather: &Weather) -> u8 {
        let level = f32::from(MAX_LIGHT) * self.skylight_scalar() * weather.skylight_modifier();
        (level.round() as u8).min(MAX_LIGHT)
    }
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new(DEFAULT_SECONDS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_wraps() {
        let mut day = DayCycle::new(100.0);
        day.advance(50.0);
        assert!((day.time_of_day() - 0.5).abs() < 1e-9);
        day.advance(50.0);
        assert!(day.time_of_day().abs() < 1e-9);
    }

    #[test]
    fn noon_is_brightest() {
        let mut day = DayCycle::new(100.0);
        assert_eq!(day.skylight(&Weather::clear()), 3);
        day.advance(50.0);
        assert_eq!(day.skylight(&Weather::clear()), MAX_LIGHT);
    }

    #[test]
    fn rain_dims_noon() {
        let mut day = DayCycle::new(100.0);
        day.advance(50.0);
        assert!(day.skylight(&Weather::raining()) < MAX_LIGHT);
    }
}
