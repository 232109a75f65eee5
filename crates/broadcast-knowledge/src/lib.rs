pub mod eval;
pub mod flatten;
pub mod http_store;
pub mod memory_store;
pub mod store;

pub use flatten::flatten_metadata;
pub use http_store::HttpVectorStore;
pub use memory_store::InMemoryKnowledgeStore;
pub use store::{ChunkMetadataPatch, KnowledgeStore};
