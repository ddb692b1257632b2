//! Weather state and a deterministic weather schedule.
//!
//! The crop engine never owns weather: callers pass the current [`Weather`]
//! into bonus calculation, so the same crop state plus the same weather always
//! yields the same growth.

use cropcraft_core::{scoped_rng, SimTick};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weather state affecting rain bonuses and ambient light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeatherState {
    /// Clear skies, no precipitation.
    #[default]
    Clear,
    /// Rain falling on every sky-exposed cell.
    Rain,
    /// Rain plus thunder.
    Thunderstorm,
}

/// Current weather, owned by the host and passed into the crop engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Weather {
    /// Current weather state.
    pub state: WeatherState,
}

impl Weather {
    /// Clear weather.
    pub const fn clear() -> Self {
        Self {
            state: WeatherState::Clear,
        }
    }

    /// Rainy weather.
    pub const fn raining() -> Self {
        Self {
            state: WeatherState::Rain,
        }
    }

    /// Replace the weather state.
    pub fn set_state(&mut self, state: WeatherState) {
        self.state = state;
    }

    /// Toggle between clear and rain.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            WeatherState::Clear => WeatherState::Rain,
            WeatherState::Rain | WeatherState::Thunderstorm => WeatherState::Clear,
        };
    }

    /// Whether rain is falling anywhere in the world.
    pub fn is_raining(&self) -> bool {
        matches!(self.state, WeatherState::Rain | WeatherState::Thunderstorm)
    }

    /// Whether it is thundering.
    pub fn is_thundering(&self) -> bool {
        self.state == WeatherState::Thunderstorm
    }

    /// Skylight scalar applied on top of the day cycle.
    pub fn skylight_modifier(&self) -> f32 {
        match self.state {
            WeatherState::Clear => 1.0,
            WeatherState::Rain => 0.85,
            WeatherState::Thunderstorm => 0.78,
        }
    }
}

/// Emitted whenever the weather changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherChanged {
    /// Previous weather state.
    pub from: WeatherState,
    /// New weather state.
    pub to: WeatherState,
}

/// RNG domain used by [`WeatherCycle`].
const WEATHER_RNG_DOMAIN: u64 = 0x57EA_7E12;

/// Alternates clear and rainy spells with seeded random durations.
#[derive(Debug, Clone)]
pub struct WeatherCycle {
    weather: Weather,
    remaining: f64,
    clear_spell: (f64, f64),
    rain_spell: (f64, f64),
    rng: StdRng,
}

impl WeatherCycle {
    /// Start clear, with spell lengths (in seconds) drawn from the given ranges.
    pub fn new(world_seed: u64, clear_spell: (f64, f64), rain_spell: (f64, f64)) -> Self {
        let mut rng = scoped_rng(world_seed, WEATHER_RNG_DOMAIN, SimTick::ZERO);
        let remaining = draw(&mut rng, clear_spell);
        Self {
            weather: Weather::clear(),
            remaining,
            clear_spell,
            rain_spell,
            rng,
        }
    }

    /// Current weather.
    pub fn weather(&self) -> Weather {
        self.weather
    }

    /// Seconds until the next change.
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Advance by `seconds`, returning the last change that happened, if any.
    pub fn advance(&mut self, seconds: f64) -> Option<WeatherChanged> {
        let mut budget = seconds;
        let mut change = None;
        while budget >= self.remaining {
            budget -= self.remaining;
            let from = self.weather.state;
            self.weather.toggle();
            let range = if self.weather.is_raining() {
                self.rain_spell
            } else {
                self.clear_spell
            };
            self.remaining = draw(&mut self.rng, range);
            debug!(?from, to = ?self.weather.state, "weather changed");
            change = Some(WeatherChanged {
                from,
                to: self.weather.state,
            });
        }
        self.remaining -= budget;
        change
    }
}

/// Spells are at least one second long so `advance` always terminates.
fn draw(rng: &mut StdRng, (min, max): (f64, f64)) -> f64 {
    let min = min.max(1.0);
    let max = max.max(min);
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
