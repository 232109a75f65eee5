pub mod extractor;
pub mod pools;

pub use extractor::{acts_for_cluster_size, classify_timeline, extract_stories, score_narrative_weight};
pub use pools::{BeatRecord, StoryState, StoryStateData};
