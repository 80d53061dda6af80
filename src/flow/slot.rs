//! Durable slots — where the serialized wizard state lives between runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::SlotError;

/// Backend-agnostic key/value slot holding raw serialized payloads.
#[async_trait]
pub trait StateSlot: Send + Sync {
    /// Read the payload stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Overwrite the payload stored under `key`.
    async fn save(&self, key: &str, payload: &str) -> Result<(), SlotError>;
}

/// File-backed slot: one `<key>.json` file per key under a directory.
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Create a slot rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StateSlot for FileSlot {
    async fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), SlotError> {
        write_atomic(&self.path_for(key), payload).await
    }
}

/// Write via temp file + rename so a crash never leaves a half-written slot.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), SlotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// In-process slot for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySlot {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot with an existing payload.
    pub fn with_entry(key: &str, payload: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), payload.into());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl StateSlot for MemorySlot {
    async fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), SlotError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_slot_missing_key_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let slot = FileSlot::new(temp.path());
        assert!(slot.load("career-flow-state").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_slot_save_then_load() {
        let temp = tempfile::tempdir().expect("tempdir");
        let slot = FileSlot::new(temp.path().join("nested"));

        slot.save("career-flow-state", r#"{"a":1}"#).await.unwrap();
        slot.save("career-flow-state", r#"{"a":2}"#).await.unwrap();

        let loaded = slot.load("career-flow-state").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(r#"{"a":2}"#));
        assert!(slot.path_for("career-flow-state").exists());
        assert!(
            !slot
                .path_for("career-flow-state")
                .with_extension("json.tmp")
                .exists(),
            "temp file should be renamed away"
        );
    }

    #[tokio::test]
    async fn memory_slot_round_trips() {
        let slot = MemorySlot::new();
        assert!(slot.load("k").await.unwrap().is_none());
        slot.save("k", "v").await.unwrap();
        assert_eq!(slot.load("k").await.unwrap().as_deref(), Some("v"));

        let seeded = MemorySlot::with_entry("k", "seed");
        assert_eq!(seeded.load("k").await.unwrap().as_deref(), Some("seed"));
    }
}
