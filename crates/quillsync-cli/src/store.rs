//! JSON-file-backed note store
//!
//! The CLI keeps its local snapshot in a single JSON file. Every
//! mutation rewrites the file; the dataset is a personal note
//! collection, not something that needs a database.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use quillsync_core::domain::{ChecklistItem, ImageRef, SyncUnit, UnitId};
use quillsync_core::ports::local_store::LocalStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    units: Vec<SyncUnit>,
    deleted: Vec<UnitId>,
}

/// [`LocalStore`] over a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    /// Opens the store, starting empty if the file does not exist yet
    pub async fn open(path: &Path) -> Result<Self> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(json) => serde_json::from_str(&json)
                .with_context(|| format!("parsing {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    async fn save(&self, data: &StoreData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(data).context("encoding note store")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl LocalStore for JsonFileStore {
    async fn list_all_units(&self) -> Result<Vec<SyncUnit>> {
        Ok(self.data.lock().await.units.clone())
    }

    async fn list_deleted_ids(&self) -> Result<Vec<UnitId>> {
        Ok(self.data.lock().await.deleted.clone())
    }

    async fn upsert_unit(&self, unit: &SyncUnit) -> Result<()> {
        let mut data = self.data.lock().await;
        match data.units.iter_mut().find(|u| u.id() == unit.id()) {
            Some(existing) => *existing = unit.clone(),
            None => data.units.push(unit.clone()),
        }
        self.save(&data).await
    }

    async fn replace_checklist_items(
        &self,
        unit_id: UnitId,
        items: &[ChecklistItem],
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        if let Some(unit) = data.units.iter_mut().find(|u| u.id() == unit_id) {
            unit.checklist_items = items.to_vec();
        }
        self.save(&data).await
    }

    async fn replace_images(&self, unit_id: UnitId, images: &[ImageRef]) -> Result<()> {
        let mut data = self.data.lock().await;
        if let Some(unit) = data.units.iter_mut().find(|u| u.id() == unit_id) {
            unit.images = images.to_vec();
        }
        self.save(&data).await
    }
}
