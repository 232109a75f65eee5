//! Fingerprint→artifact memo cache (spec §4.12, C12), grounded on the
//! teacher's `memory/src/index.rs`: a `redb` table survives process
//! restarts, an `lru::LruCache` holds the hot layer, `sha2` derives the
//! fingerprint from whatever the caller says the artifact depends on.
//!
//! Artifacts are serialized with `serde_json` rather than `bincode` — the
//! teacher's index only ever stores its own fixed-shape `IndexedEntry`,
//! while this cache stores three different artifact shapes keyed by
//! [`EntryKind`], and JSON keeps that heterogeneity simple without a
//! manual binary framing layer.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use lru::LruCache;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cache_entries");

const HOT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Context,
    Retrieval,
    Generation,
}

impl EntryKind {
    fn slug(self) -> &'static str {
        match self {
            EntryKind::Context => "context",
            EntryKind::Retrieval => "retrieval",
            EntryKind::Generation => "generation",
        }
    }
}

/// Deterministic hash of whatever a caller says an artifact depends on
/// (spec §4.12: "query text + sorted filter + n_results + corpus version"
/// for a retrieval, "prompt + model + temperature" for a generation).
pub fn fingerprint(kind: EntryKind, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.slug().as_bytes());
    for part in parts {
        hasher.update(b"\0");
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    payload: serde_json::Value,
    created_at_secs: u64,
    ttl_secs: u64,
}

impl StoredEntry {
    fn is_expired(&self, now_secs: u64) -> bool {
        now_secs.saturating_sub(self.created_at_secs) >= self.ttl_secs
    }
}

#[derive(Debug, Clone, Default)]
pub struct KindStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl KindStats {
    pub fn hit_rate_pct(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub context: KindStats,
    pub retrieval: KindStats,
    pub generation: KindStats,
}

impl CacheStats {
    fn for_kind_mut(&mut self, kind: EntryKind) -> &mut KindStats {
        match kind {
            EntryKind::Context => &mut self.context,
            EntryKind::Retrieval => &mut self.retrieval,
            EntryKind::Generation => &mut self.generation,
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Fingerprint→artifact memo with an LRU hot layer backed by a redb table
/// (spec §4.12). The engine is single-threaded over segments, so "at-most-one
/// compute per fingerprint while the first is in flight" (spec §4.12) holds
/// trivially — there is never a second caller racing the first.
pub struct SegmentCache {
    db: Database,
    path: PathBuf,
    hot: LruCache<String, StoredEntry>,
    stats: CacheStats,
    max_entries: usize,
}

impl SegmentCache {
    pub fn open(path: impl AsRef<Path>, max_entries: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(&path)
            .with_context(|| format!("opening cache database at {}", path.display()))?;
        {
            let tx = db.begin_write()?;
            tx.open_table(ENTRIES_TABLE)?;
            tx.commit()?;
        }
        let capacity = NonZeroUsize::new(max_entries.max(1).min(HOT_CAPACITY)).unwrap();
        Ok(Self { db, path, hot: LruCache::new(capacity), stats: CacheStats::default(), max_entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached artifact for `key` if present and unexpired,
    /// recording a hit or miss against `kind`'s stats.
    pub fn get<T: DeserializeOwned>(&mut self, kind: EntryKind, key: &str) -> Result<Option<T>> {
        let now = now_secs();

        if let Some(entry) = self.hot.get(key) {
            if !entry.is_expired(now) {
                self.stats.for_kind_mut(kind).hits += 1;
                return Ok(Some(serde_json::from_value(entry.payload.clone())?));
            }
        }

        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(ENTRIES_TABLE)?;
        let Some(raw) = tbl.get(key)? else {
            self.stats.for_kind_mut(kind).misses += 1;
            return Ok(None);
        };
        let entry: StoredEntry = serde_json::from_slice(raw.value())?;
        if entry.is_expired(now) {
            self.stats.for_kind_mut(kind).misses += 1;
            return Ok(None);
        }

        self.stats.for_kind_mut(kind).hits += 1;
        let value = serde_json::from_value(entry.payload.clone())?;
        self.hot.put(key.to_string(), entry);
        Ok(Some(value))
    }

    /// Stores `value` under `key` for `kind` with the given TTL, evicting
    /// the hot layer's least-recently-used entry if it was already at
    /// capacity.
    pub fn put<T: Serialize>(&mut self, kind: EntryKind, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let entry = StoredEntry { payload: serde_json::to_value(value)?, created_at_secs: now_secs(), ttl_secs };
        let bytes = serde_json::to_vec(&entry)?;

        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(ENTRIES_TABLE)?;
            tbl.insert(key, bytes.as_slice())?;
        }
        tx.commit()?;

        if self.hot.len() >= self.hot.cap().get() && !self.hot.contains(key) {
            self.stats.for_kind_mut(kind).evictions += 1;
        }
        self.hot.put(key.to_string(), entry);
        self.enforce_max_entries()?;
        Ok(())
    }

    /// Drops the oldest redb rows beyond `max_entries` (spec §4.12: "LRU
    /// eviction at configured max-entries"). The hot layer already bounds
    /// itself; this keeps the durable table from growing unbounded across
    /// a long-running session.
    fn enforce_max_entries(&mut self) -> Result<()> {
        let tx = self.db.begin_write()?;
        let overflow = {
            let tbl = tx.open_table(ENTRIES_TABLE)?;
            let len = tbl.len()? as usize;
            len.saturating_sub(self.max_entries)
        };
        if overflow > 0 {
            let mut rows: Vec<(String, u64)> = {
                let tbl = tx.open_table(ENTRIES_TABLE)?;
                tbl.iter()?
                    .filter_map(|r| r.ok())
                    .filter_map(|(k, v)| {
                        serde_json::from_slice::<StoredEntry>(v.value())
                            .ok()
                            .map(|e| (k.value().to_string(), e.created_at_secs))
                    })
                    .collect()
            };
            rows.sort_by_key(|(_, created_at)| *created_at);
            let mut tbl = tx.open_table(ENTRIES_TABLE)?;
            for (key, _) in rows.into_iter().take(overflow) {
                tbl.remove(key.as_str())?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fingerprint_is_deterministic_and_order_sensitive() {
        let a = fingerprint(EntryKind::Retrieval, &["weather", "where:year<=2102", "5"]);
        let b = fingerprint(EntryKind::Retrieval, &["weather", "where:year<=2102", "5"]);
        let c = fingerprint(EntryKind::Retrieval, &["5", "where:year<=2102", "weather"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn put_then_get_round_trips_and_counts_a_hit() {
        let dir = tempdir().unwrap();
        let mut cache = SegmentCache::open(dir.path().join("cache.redb"), 100).unwrap();
        cache.put(EntryKind::Generation, "k1", &"hello".to_string(), 3600).unwrap();
        let value: Option<String> = cache.get(EntryKind::Generation, "k1").unwrap();
        assert_eq!(value, Some("hello".to_string()));
        assert_eq!(cache.stats().generation.hits, 1);
    }

    #[test]
    fn missing_key_counts_a_miss() {
        let dir = tempdir().unwrap();
        let mut cache = SegmentCache::open(dir.path().join("cache.redb"), 100).unwrap();
        let value: Option<String> = cache.get(EntryKind::Retrieval, "missing").unwrap();
        assert_eq!(value, None);
        assert_eq!(cache.stats().retrieval.misses, 1);
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let dir = tempdir().unwrap();
        let mut cache = SegmentCache::open(dir.path().join("cache.redb"), 100).unwrap();
        cache.put(EntryKind::Context, "k1", &42i32, 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let value: Option<i32> = cache.get(EntryKind::Context, "k1").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn max_entries_bounds_the_durable_table() {
        let dir = tempdir().unwrap();
        let mut cache = SegmentCache::open(dir.path().join("cache.redb"), 2).unwrap();
        cache.put(EntryKind::Retrieval, "k1", &1i32, 3600).unwrap();
        cache.put(EntryKind::Retrieval, "k2", &2i32, 3600).unwrap();
        cache.put(EntryKind::Retrieval, "k3", &3i32, 3600).unwrap();

        let tx = cache.db.begin_read().unwrap();
        let tbl = tx.open_table(ENTRIES_TABLE).unwrap();
        assert!(tbl.len().unwrap() as usize <= 2);
    }
}
