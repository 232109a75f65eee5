//! Fixed-capacity ring of recent segments (spec §4.4, C4), structurally the
//! same ring-buffer-over-JSONL shape as the teacher's
//! `runtime/src/history.rs`, minus persistence — session memory is
//! explicitly *not* persisted across resumes (spec §4.13 "Resume").

use std::collections::{HashMap, VecDeque};

use broadcast_core::{RecentSegment, SegmentType, WeatherType};
use serde::Serialize;

pub const DEFAULT_CAPACITY: usize = 10;

pub struct SessionMemory {
    capacity: usize,
    ring: VecDeque<RecentSegment>,
}

impl SessionMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ring: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn record(&mut self, segment: RecentSegment) {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(segment);
    }

    /// Most recent `k` segments, newest first.
    pub fn last_k(&self, k: usize) -> Vec<&RecentSegment> {
        self.ring.iter().rev().take(k).collect()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Segment types already covered at the given hour in this run's
    /// memory (used by the scheduler's "not already covered" checks,
    /// §4.8). Scans the whole ring — it is small and bounded by
    /// `capacity`.
    pub fn has_type_at_hour(&self, segment_type: SegmentType, hour: u8) -> bool {
        self.ring
            .iter()
            .any(|s| s.segment_type == segment_type && s.hour == hour)
    }

    /// Subjects referenced across the last `window` segments' chunks, used
    /// by the context assembler's diversity constraint (§4.9). Callers
    /// supply a lookup from chunk id to its subjects since the ring only
    /// stores chunk ids, not full chunks (arena pattern, §9).
    pub fn recent_subjects<'a>(
        &'a self,
        window: usize,
        subjects_of: impl Fn(&broadcast_core::ChunkId) -> Vec<String>,
    ) -> Vec<String> {
        let mut subjects = Vec::new();
        for segment in self.last_k(window) {
            for chunk_id in &segment.chunk_ids_used {
                subjects.extend(subjects_of(chunk_id));
            }
        }
        subjects
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherContinuity {
    pub changed: bool,
    pub previous_type: Option<WeatherType>,
    pub transition_phrase: Option<String>,
}

fn place_word(region: &str) -> &'static str {
    match region.to_lowercase().as_str() {
        "appalachia" => "the mountains",
        "capital" | "capital wasteland" => "the wastes",
        "mojave" => "the valley",
        _ => "these parts",
    }
}

/// Region-parameterised transition phrase table (spec §4.4: "drawn from a
/// region-parameterised table keyed by (previous_type, current_type); if
/// the key is absent, `transition_phrase` is omitted, not invented").
fn transition_table(region: &str) -> HashMap<(WeatherType, WeatherType), String> {
    let place = place_word(region);
    let mut table = HashMap::new();
    table.insert(
        (WeatherType::Rainy, WeatherType::Sunny),
        format!("The rain's finally let up over {place}."),
    );
    table.insert(
        (WeatherType::Sunny, WeatherType::Rainy),
        format!("Clouds are rolling in over {place} now."),
    );
    table.insert(
        (WeatherType::Fog, WeatherType::Sunny),
        format!("That fog's burning off across {place}."),
    );
    table.insert(
        (WeatherType::Sunny, WeatherType::Fog),
        format!("A haze is settling over {place}."),
    );
    table.insert(
        (WeatherType::RadStorm, WeatherType::Clear),
        format!("Geiger counters can rest easy — the storm's passed {place}."),
    );
    table.insert(
        (WeatherType::Clear, WeatherType::RadStorm),
        format!("Get inside — a rad storm's rolling over {place}."),
    );
    table
}

/// Scans the ring newest-first for the most recent segment carrying a
/// weather snapshot (spec §4.4).
pub fn continuity_for_weather(
    memory: &SessionMemory,
    region: &str,
    current_weather: WeatherType,
) -> WeatherContinuity {
    let previous = memory
        .ring
        .iter()
        .rev()
        .find_map(|segment| segment.weather_snapshot.as_ref());

    let Some(previous) = previous else {
        return WeatherContinuity {
            changed: false,
            previous_type: None,
            transition_phrase: None,
        };
    };

    let previous_type = previous.weather.kind;
    let changed = previous_type != current_weather;
    let transition_phrase = if changed {
        transition_table(region).get(&(previous_type, current_weather)).cloned()
    } else {
        None
    };

    WeatherContinuity {
        changed,
        previous_type: Some(previous_type),
        transition_phrase,
    }
}
