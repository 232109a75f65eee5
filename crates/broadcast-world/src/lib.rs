//! Owns the persistent simulated clock, weather, and broadcast counters
//! (spec §4.5, C5). Mirrors the teacher's `memory/src/index.rs` split
//! between an in-memory mutable owner and an atomically-persisted
//! artifact, minus the cache layer — `WorldState` is small enough to
//! round-trip as a whole file rather than a keyed store.

use std::path::{Path, PathBuf};

use broadcast_core::{WeatherEvent, WeatherType, WorldState, WorldStateSnapshot};
use broadcast_core::world::WEATHER_HISTORY_WINDOW_DAYS;
use chrono::{Duration, NaiveDate};

pub struct WorldStateStore {
    state: WorldState,
    path: PathBuf,
}

impl WorldStateStore {
    pub fn new(state: WorldState, path: PathBuf) -> Self {
        Self { state, path }
    }

    /// Loads `path` if present, else seeds a fresh `WorldState` starting at
    /// hour 0 on `calendar` with `initial_weather`.
    pub async fn load_or_init(
        path: PathBuf,
        calendar: NaiveDate,
        initial_weather: broadcast_core::Weather,
    ) -> anyhow::Result<Self> {
        let state = broadcast_core::persist::read_json::<WorldState>(&path)
            .await?
            .unwrap_or_else(|| WorldState::new(calendar, initial_weather));
        Ok(Self { state, path })
    }

    pub fn snapshot(&self) -> WorldStateSnapshot {
        self.state.snapshot()
    }

    /// Advances the simulated clock by one hour, rolling the calendar date
    /// forward at midnight and ticking down the active weather event's
    /// remaining duration.
    pub fn advance_hour(&mut self) {
        self.state.current_hour = (self.state.current_hour + 1) % 24;
        if self.state.current_hour == 0 {
            self.state.calendar = self.state.calendar.succ_opt().unwrap_or(self.state.calendar);
        }
        self.state.weather.duration_remaining_hours =
            self.state.weather.duration_remaining_hours.saturating_sub(1);
    }

    /// Records a weather event into the rolling history, pruning entries
    /// older than the 30-day window (spec §3).
    pub fn record_weather(&mut self, event: WeatherEvent) {
        self.state.weather = event.weather.clone();
        let cutoff = event.occurred_at - Duration::days(WEATHER_HISTORY_WINDOW_DAYS);
        self.state.weather_history.retain(|e| e.occurred_at >= cutoff);
        self.state.weather_history.push(event);
    }

    /// Notable weather events for `region` within the last `days` days,
    /// newest first.
    pub fn recent_notable_weather(&self, region: &str, days: i64) -> Vec<&WeatherEvent> {
        let cutoff = chrono::Utc::now() - Duration::days(days);
        let mut events: Vec<&WeatherEvent> = self
            .state
            .weather_history
            .iter()
            .filter(|e| e.notable && e.region == region && e.occurred_at >= cutoff)
            .collect();
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        events
    }

    pub fn increment_counter(&mut self, segment_type: &str) {
        *self.state.broadcast_counters.entry(segment_type.to_string()).or_insert(0) += 1;
    }

    pub fn current_weather_kind(&self) -> WeatherType {
        self.state.weather.kind
    }

    pub async fn persist(&self) -> anyhow::Result<()> {
        broadcast_core::persist::atomic_write_json(&self.path, &self.state).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
