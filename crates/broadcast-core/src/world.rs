use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    Sunny,
    Rainy,
    Fog,
    RadStorm,
    Clear,
    Overcast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub kind: WeatherType,
    pub intensity: f32,
    pub temperature_f: f32,
    /// Hours remaining before this weather event naturally ends.
    pub duration_remaining_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub weather: Weather,
    pub region: String,
    pub recorded_at: DateTime<Utc>,
}

/// A historical weather event kept in the rolling window (spec §3,
/// `historical weather events (≤30-day window)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub weather: Weather,
    pub region: String,
    pub occurred_at: DateTime<Utc>,
    /// Whether the event was "notable" (used by C5's
    /// `recent_notable_weather`): severe intensity or an unusual type for
    /// the season.
    pub notable: bool,
}

/// Persistent metadata: simulated clock, weather, counters (spec §3
/// `WorldState`). Owned exclusively by the orchestrator; other components
/// only ever see a [`WorldStateSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub schema_version: u32,
    pub current_hour: u8,
    pub calendar: NaiveDate,
    pub weather: Weather,
    pub weather_history: Vec<WeatherEvent>,
    pub broadcast_counters: HashMap<String, u64>,
}

pub const WORLD_STATE_SCHEMA_VERSION: u32 = 1;
pub const WEATHER_HISTORY_WINDOW_DAYS: i64 = 30;

impl WorldState {
    pub fn new(calendar: NaiveDate, weather: Weather) -> Self {
        Self {
            schema_version: WORLD_STATE_SCHEMA_VERSION,
            current_hour: 0,
            calendar,
            weather,
            weather_history: Vec::new(),
            broadcast_counters: HashMap::new(),
        }
    }

    pub fn snapshot(&self) -> WorldStateSnapshot {
        WorldStateSnapshot {
            current_hour: self.current_hour,
            calendar: self.calendar,
            weather: self.weather.clone(),
            weather_history: self.weather_history.clone(),
            broadcast_counters: self.broadcast_counters.clone(),
        }
    }
}

/// Immutable view handed to readers (spec §4.5 `snapshot()`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldStateSnapshot {
    pub current_hour: u8,
    pub calendar: NaiveDate,
    pub weather: Weather,
    pub weather_history: Vec<WeatherEvent>,
    pub broadcast_counters: HashMap<String, u64>,
}
