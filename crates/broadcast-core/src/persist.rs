//! Crash-safe persistence helpers.
//!
//! Generalized from the teacher's `MemoryEventLog`: atomic writes go
//! through a `.tmp` sibling file that is `fsync`'d then renamed over the
//! target, so a crash either leaves the old file untouched or a fully
//! consistent new one. Never a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

/// Atomically write `value` as pretty JSON to `path`.
pub async fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = tmp_sibling(path);
    let body = serde_json::to_vec_pretty(value)?;

    let write_result: Result<()> = async {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .await?;
        file.write_all(&body).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
    .await;

    if let Err(err) = write_result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err);
    }

    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }

    Ok(())
}

/// Read and deserialize a JSON artifact, returning `None` when the file does
/// not yet exist (fresh run).
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(value))
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact.json".to_string());
    path.with_file_name(format!("{filename}.tmp"))
}

/// Append-only JSONL log for the accepted-segment output stream (spec §6),
/// structurally identical to the teacher's `MemoryEventLog::append`.
#[derive(Debug, Clone)]
pub struct JsonlLog {
    path: PathBuf,
}

impl JsonlLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let line = serde_json::to_string(record)?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn atomic_write_then_read_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        atomic_write_json(&path, &Sample { value: 42 }).await?;
        let loaded: Option<Sample> = read_json(&path).await?;
        assert_eq!(loaded, Some(Sample { value: 42 }));
        Ok(())
    }

    #[tokio::test]
    async fn read_json_missing_file_returns_none() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("absent.json");
        let loaded: Option<Sample> = read_json(&path).await?;
        assert_eq!(loaded, None);
        Ok(())
    }

    #[tokio::test]
    async fn jsonl_log_appends_one_line_per_record() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("segments.jsonl");
        let log = JsonlLog::new(&path);

        log.append(&Sample { value: 1 }).await?;
        log.append(&Sample { value: 2 }).await?;

        let contents = tokio::fs::read_to_string(&path).await?;
        assert_eq!(contents.lines().count(), 2);
        Ok(())
    }
}
