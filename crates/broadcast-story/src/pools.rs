//! Story State & Pools (spec §4.6, C6): four timeline-keyed pools, a small
//! `active` set (typically ≤ one per timeline), and a beat history.
//! Persisted as a single atomic artifact the same way `broadcast-world`
//! persists `WorldState` — the state here is small enough that a keyed
//! store (as `broadcast-cache` uses for its much larger corpus) would be
//! overkill.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use broadcast_config::StoryConfig;
use broadcast_core::{Act, Story, StoryId, StoryStatus, Timeline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatRecord {
    pub story_id: StoryId,
    pub act_number: u8,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryStateData {
    pub pools: HashMap<Timeline, VecDeque<Story>>,
    pub active: HashMap<Timeline, Story>,
    /// Count of stories that have reached `Completed`, per timeline — used
    /// together with `active` to evaluate per-timeline quotas (spec §4.6,
    /// §4.8).
    pub completed_counts: HashMap<Timeline, u32>,
    pub history: Vec<BeatRecord>,
}

pub struct StoryState {
    data: StoryStateData,
    path: PathBuf,
}

impl StoryState {
    pub fn new(path: PathBuf) -> Self {
        Self { data: StoryStateData::default(), path }
    }

    pub async fn load_or_init(path: PathBuf) -> anyhow::Result<Self> {
        let data = broadcast_core::persist::read_json::<StoryStateData>(&path)
            .await?
            .unwrap_or_default();
        Ok(Self { data, path })
    }

    pub async fn persist(&self) -> anyhow::Result<()> {
        broadcast_core::persist::atomic_write_json(&self.path, &self.data).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total stories across all pools (spec §4.6: "the check is strictly
    /// 'pool size > 0'" — presence of active stories does not count).
    pub fn pool_size(&self) -> usize {
        self.data.pools.values().map(|q| q.len()).sum()
    }

    pub fn needs_seeding(&self) -> bool {
        self.pool_size() == 0
    }

    /// Idempotent insertion: called only when `needs_seeding()` is true, so
    /// repeated calls across restarts never double-seed as long as callers
    /// respect that contract.
    pub fn seed(&mut self, stories: Vec<Story>) {
        for story in stories {
            self.data.pools.entry(story.timeline).or_default().push_back(story);
        }
    }

    fn completed_count(&self, timeline: Timeline) -> u32 {
        self.data.completed_counts.get(&timeline).copied().unwrap_or(0)
    }

    fn quota_used(&self, timeline: Timeline) -> u32 {
        self.completed_count(timeline) + if self.data.active.contains_key(&timeline) { 1 } else { 0 }
    }

    pub fn quota_permits(&self, timeline: Timeline, config: &StoryConfig) -> bool {
        self.quota_used(timeline) < config.quota_for(timeline)
    }

    pub fn has_active(&self, timeline: Timeline) -> bool {
        self.data.active.contains_key(&timeline)
    }

    pub fn active_story(&self, timeline: Timeline) -> Option<&Story> {
        self.data.active.get(&timeline)
    }

    /// Promotes the highest-`narrative_weight` pool entry for `timeline` to
    /// `active`, provided the timeline's quota isn't already exhausted
    /// (spec §4.6 `pool → active`). No-op if a story for that timeline is
    /// already active.
    pub fn activate_next(&mut self, timeline: Timeline, config: &StoryConfig) -> Option<&Story> {
        if self.has_active(timeline) {
            return self.active_story(timeline);
        }
        if !self.quota_permits(timeline, config) {
            return None;
        }

        let pool = self.data.pools.get_mut(&timeline)?;
        let best_index = pool
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.narrative_weight.total_cmp(&b.narrative_weight))
            .map(|(i, _)| i)?;
        let mut story = pool.remove(best_index)?;
        story.activate();
        self.data.active.insert(timeline, story);
        self.data.active.get(&timeline)
    }

    pub fn current_act(&self, timeline: Timeline) -> Option<&Act> {
        self.data.active.get(&timeline).and_then(|s| s.current_act())
    }

    /// Advances the active story's beat (spec §4.6 `active → active` /
    /// `active → completed`). Returns the act number that was just emitted.
    pub fn advance_beat(&mut self, timeline: Timeline, now: DateTime<Utc>) -> Option<u8> {
        let story = self.data.active.get_mut(&timeline)?;
        let emitted_act = story.current_act_index as u8 + 1;
        story.advance(now);

        self.data.history.push(BeatRecord {
            story_id: story.story_id.clone(),
            act_number: emitted_act,
            recorded_at: now,
        });

        if story.status == StoryStatus::Completed {
            *self.data.completed_counts.entry(timeline).or_insert(0) += 1;
            self.data.active.remove(&timeline);
        }

        Some(emitted_act)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{Act, ActType, EmotionalTone};

    fn story(weight: f32, timeline: Timeline) -> Story {
        let acts = vec![Act {
            act_number: 1,
            act_type: ActType::Setup,
            summary: "...".to_string(),
            source_chunk_ids: vec![],
            conflict_level: 0.1,
            tone: EmotionalTone::Neutral,
        }];
        Story::new(StoryId::new(format!("story-test-{weight}")), "Test".to_string(), timeline, weight, acts)
    }

    #[test]
    fn needs_seeding_when_all_pools_empty() {
        let state = StoryState::new(PathBuf::from("/tmp/unused.json"));
        assert!(state.needs_seeding());
    }

    #[test]
    fn activate_next_picks_highest_weight_in_pool() {
        let mut state = StoryState::new(PathBuf::from("/tmp/unused.json"));
        state.seed(vec![story(2.0, Timeline::Daily), story(5.0, Timeline::Daily)]);

        let config = StoryConfig::default();
        let activated = state.activate_next(Timeline::Daily, &config).unwrap();
        assert_eq!(activated.narrative_weight, 5.0);
        assert_eq!(state.pool_size(), 1);
    }

    #[test]
    fn activate_next_respects_quota() {
        let mut state = StoryState::new(PathBuf::from("/tmp/unused.json"));
        let mut config = StoryConfig::default();
        config.timeline_quotas.insert("daily".to_string(), 0);
        state.seed(vec![story(2.0, Timeline::Daily)]);

        assert!(state.activate_next(Timeline::Daily, &config).is_none());
    }

    #[test]
    fn advance_beat_completes_single_act_story_immediately() {
        let mut state = StoryState::new(PathBuf::from("/tmp/unused.json"));
        state.seed(vec![story(2.0, Timeline::Daily)]);
        let config = StoryConfig::default();
        state.activate_next(Timeline::Daily, &config);

        let now = Utc::now();
        let emitted = state.advance_beat(Timeline::Daily, now).unwrap();
        assert_eq!(emitted, 1);
        assert!(!state.has_active(Timeline::Daily));
        assert_eq!(state.completed_count(Timeline::Daily), 1);
    }
}
