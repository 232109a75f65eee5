pub mod chunk;
pub mod error;
pub mod filter;
pub mod ids;
pub mod output;
pub mod persist;
pub mod personality;
pub mod segment;
pub mod story;
pub mod world;

pub use chunk::{Chunk, ComplexityTier, ConfidenceTier, ControversyLevel, EmotionalTone, ScoredChunk};
pub use error::{BroadcastError, Result};
pub use filter::WhereClause;
pub use ids::{ChunkId, StoryId};
pub use output::{IssueSeverity, SegmentRecord, ValidationIssue, ValidationMode, ValidationReport};
pub use personality::Personality;
pub use segment::{RecentSegment, SegmentType, StoryBeatRef};
pub use story::{Act, ActType, Story, StoryStatus, Timeline};
pub use world::{Weather, WeatherEvent, WeatherSnapshot, WeatherType, WorldState, WorldStateSnapshot};
