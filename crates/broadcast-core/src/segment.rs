use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunk::EmotionalTone;
use crate::ids::{ChunkId, StoryId};
use crate::world::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    TimeCheck,
    Weather,
    News,
    Story,
    Gossip,
}

impl SegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::TimeCheck => "time_check",
            SegmentType::Weather => "weather",
            SegmentType::News => "news",
            SegmentType::Story => "story",
            SegmentType::Gossip => "gossip",
        }
    }
}

/// Reference to the story beat a segment carried, if it was a story segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryBeatRef {
    pub story_id: StoryId,
    pub act_number: u8,
}

/// One entry in the session memory ring (spec §3 `RecentSegment`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSegment {
    pub segment_type: SegmentType,
    pub script_text: String,
    pub hour: u8,
    pub chunk_ids_used: Vec<ChunkId>,
    pub tone: EmotionalTone,
    pub weather_snapshot: Option<WeatherSnapshot>,
    pub story_beat_ref: Option<StoryBeatRef>,
    pub recorded_at: DateTime<Utc>,
}
