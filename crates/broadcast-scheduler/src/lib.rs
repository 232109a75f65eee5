//! Scheduler (spec §4.8, C8): a pure function from the run's current
//! context to the next segment type. Never suspends, never returns
//! nothing — matching the teacher's preference for total functions over
//! the pipeline's decision points (see `runtime`'s dispatch match arms,
//! which always fall through to a default case).

use broadcast_config::{SchedulerConfig, StoryConfig};
use broadcast_core::{SegmentType, Timeline};
use broadcast_memory::SessionMemory;
use broadcast_story::StoryState;

/// Tie-break order: time > weather > news > story > gossip (spec §4.8).
pub fn schedule_next(
    current_hour: u8,
    memory: &SessionMemory,
    story_state: &StoryState,
    story_config: &StoryConfig,
    scheduler_config: &SchedulerConfig,
) -> SegmentType {
    if !memory.has_type_at_hour(SegmentType::TimeCheck, current_hour) {
        return SegmentType::TimeCheck;
    }

    if scheduler_config.weather_slots.contains(&current_hour)
        && !memory.has_type_at_hour(SegmentType::Weather, current_hour)
    {
        return SegmentType::Weather;
    }

    if scheduler_config.news_slots.contains(&current_hour)
        && !memory.has_type_at_hour(SegmentType::News, current_hour)
    {
        return SegmentType::News;
    }

    let has_pending_story_beat = Timeline::ALL.into_iter().any(|timeline| {
        story_state
            .current_act(timeline)
            .is_some()
            && story_state.quota_permits(timeline, story_config)
    });
    if has_pending_story_beat {
        return SegmentType::Story;
    }

    SegmentType::Gossip
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{Act, ActType, EmotionalTone, RecentSegment, StoryId, WeatherSnapshot};
    use broadcast_story::extractor::acts_for_cluster_size;
    use chrono::Utc;
    use std::path::PathBuf;

    fn empty_story_state() -> StoryState {
        StoryState::new(PathBuf::from("/tmp/unused-story-state.json"))
    }

    #[test]
    fn first_call_at_an_hour_is_always_time_check() {
        let memory = SessionMemory::new(10);
        let story_state = empty_story_state();
        let segment = schedule_next(
            6,
            &memory,
            &story_state,
            &StoryConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(segment, SegmentType::TimeCheck);
    }

    #[test]
    fn weather_slot_wins_over_gossip_once_time_check_done() {
        let mut memory = SessionMemory::new(10);
        memory.record(RecentSegment {
            segment_type: SegmentType::TimeCheck,
            script_text: "...".to_string(),
            hour: 6,
            chunk_ids_used: vec![],
            tone: EmotionalTone::Neutral,
            weather_snapshot: None,
            story_beat_ref: None,
            recorded_at: Utc::now(),
        });
        let story_state = empty_story_state();
        let segment = schedule_next(
            6,
            &memory,
            &story_state,
            &StoryConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(segment, SegmentType::Weather);
    }

    #[test]
    fn falls_through_to_story_when_a_beat_is_pending() {
        let mut memory = SessionMemory::new(10);
        for segment_type in [SegmentType::TimeCheck, SegmentType::Weather, SegmentType::News] {
            memory.record(RecentSegment {
                segment_type,
                script_text: "...".to_string(),
                hour: 9,
                chunk_ids_used: vec![],
                tone: EmotionalTone::Neutral,
                weather_snapshot: None::<WeatherSnapshot>,
                story_beat_ref: None,
                recorded_at: Utc::now(),
            });
        }
        let mut story_state = empty_story_state();
        let acts = acts_for_cluster_size(1)
            .iter()
            .map(|act_type| Act {
                act_number: 1,
                act_type: *act_type,
                summary: "...".to_string(),
                source_chunk_ids: vec![],
                conflict_level: 0.1,
                tone: EmotionalTone::Neutral,
            })
            .collect();
        let story = broadcast_core::Story::new(StoryId::new("story-test"), "Test".to_string(), Timeline::Daily, 2.0, acts);
        story_state.seed(vec![story]);
        story_state.activate_next(Timeline::Daily, &StoryConfig::default());

        let segment = schedule_next(
            9,
            &memory,
            &story_state,
            &StoryConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(segment, SegmentType::Story);
    }

    #[test]
    fn gossip_is_the_final_fallback() {
        let mut memory = SessionMemory::new(10);
        for segment_type in [SegmentType::TimeCheck, SegmentType::Weather, SegmentType::News] {
            memory.record(RecentSegment {
                segment_type,
                script_text: "...".to_string(),
                hour: 9,
                chunk_ids_used: vec![],
                tone: EmotionalTone::Neutral,
                weather_snapshot: None,
                story_beat_ref: None,
                recorded_at: Utc::now(),
            });
        }
        let story_state = empty_story_state();
        let segment = schedule_next(
            9,
            &memory,
            &story_state,
            &StoryConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(segment, SegmentType::Gossip);
    }
}
