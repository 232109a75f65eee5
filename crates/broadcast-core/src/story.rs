use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, StoryId};
use crate::chunk::EmotionalTone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeline {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Timeline {
    pub const ALL: [Timeline; 4] = [
        Timeline::Daily,
        Timeline::Weekly,
        Timeline::Monthly,
        Timeline::Yearly,
    ];

    /// Minimum `narrative_weight` required for this timeline (spec §3
    /// invariant: DAILY≥1, WEEKLY≥3, MONTHLY≥6, YEARLY≥8). These are the
    /// *structural* minimums recorded on `Story` construction; C7's
    /// classification thresholds (tunable, §4.7) decide which timeline a
    /// given weight is assigned to in the first place.
    pub fn min_weight(self) -> f32 {
        match self {
            Timeline::Daily => 1.0,
            Timeline::Weekly => 3.0,
            Timeline::Monthly => 6.0,
            Timeline::Yearly => 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActType {
    Setup,
    Rising,
    Climax,
    Falling,
    Resolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Act {
    pub act_number: u8,
    pub act_type: ActType,
    pub summary: String,
    pub source_chunk_ids: Vec<ChunkId>,
    pub conflict_level: f32,
    pub tone: EmotionalTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Pool,
    Active,
    Completed,
}

/// A multi-act story arc (spec §3 `Story`).
///
/// Acts are generated adaptively from the number of clustered source chunks
/// (1→1 act, 2→2 acts, 3–4→3 acts, ≥5→5 acts); see
/// `broadcast_story::extractor::acts_for_cluster_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub story_id: StoryId,
    pub title: String,
    pub timeline: Timeline,
    pub narrative_weight: f32,
    pub acts: Vec<Act>,
    pub current_act_index: usize,
    pub status: StoryStatus,
    pub broadcast_count: u32,
    pub last_broadcast_time: Option<DateTime<Utc>>,
}

impl Story {
    pub fn new(story_id: StoryId, title: String, timeline: Timeline, narrative_weight: f32, acts: Vec<Act>) -> Self {
        Self {
            story_id,
            title,
            timeline,
            narrative_weight,
            acts,
            current_act_index: 0,
            status: StoryStatus::Pool,
            broadcast_count: 0,
            last_broadcast_time: None,
        }
    }

    pub fn current_act(&self) -> Option<&Act> {
        if self.status == StoryStatus::Active {
            self.acts.get(self.current_act_index)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_act_index >= self.acts.len()
    }

    /// Advance to the next act; transitions to `Completed` when the last act
    /// has been emitted (spec §4.6: `active → completed` when
    /// `current_act_index == len(acts)`). No backward transition exists.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.current_act_index += 1;
        self.broadcast_count += 1;
        self.last_broadcast_time = Some(now);
        if self.is_complete() {
            self.status = StoryStatus::Completed;
        }
    }

    pub fn activate(&mut self) {
        self.status = StoryStatus::Active;
    }
}
