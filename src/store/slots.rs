//! Named JSON slots in the data directory.
//!
//! Each slot holds one serialized collection and is replaced wholesale on
//! every write. Directory layout:
//!   {data_dir}/{slot}.json

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub const STUDENTS_SLOT: &str = "la_students";
pub const GRADES_SLOT: &str = "la_grades";

/// Key-value persistence over plain files.
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    /// Create a slot store rooted at `dir`. Creates the directory if needed.
    pub async fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a collection. A missing slot is an empty collection. A slot that
    /// does not parse is moved aside to `{slot}.json.bak` before the empty
    /// collection is returned, so the next save cannot destroy it.
    pub async fn load<T: DeserializeOwned>(&self, slot: &str) -> Result<Vec<T>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                let backup = self.backup_path(slot);
                fs::rename(&path, &backup).await?;
                warn!(
                    "Failed to parse slot {}: {}. Moved it to {}",
                    slot,
                    e,
                    backup.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// First free `{slot}.json.bak`, `{slot}.json.bak.1`, ...
    fn backup_path(&self, slot: &str) -> PathBuf {
        let base = self.dir.join(format!("{}.json.bak", slot));
        if !base.exists() {
            return base;
        }
        (1u32..)
            .map(|n| self.dir.join(format!("{}.json.bak.{}", slot, n)))
            .find(|p| !p.exists())
            .unwrap_or(base)
    }

    /// Overwrite a slot with the full collection.
    pub async fn save<T: Serialize>(&self, slot: &str, items: &[T]) -> Result<()> {
        let path = self.slot_path(slot);
        let content = serde_json::to_string(items)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Saved {} entries to slot {}", items.len(), slot);
        Ok(())
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }
}
