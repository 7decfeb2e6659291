//! Local store port (driven/secondary port)
//!
//! The persistent on-device store is an external collaborator; the sync
//! engine only needs this narrow read/write surface.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, flat files, ...) and don't need domain-level classification.
//! - A sync pass never deletes a unit through this port; deletion is an
//!   external operation whose outcome arrives as tombstones in
//!   `list_deleted_ids`.

use crate::domain::{ChecklistItem, ImageRef, SyncUnit, UnitId};

/// Port trait for the local persistent store
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    /// Returns the full local snapshot of units
    async fn list_all_units(&self) -> anyhow::Result<Vec<SyncUnit>>;

    /// Returns the ids of locally deleted units (tombstones)
    async fn list_deleted_ids(&self) -> anyhow::Result<Vec<UnitId>>;

    /// Inserts or wholly replaces a unit's note record
    async fn upsert_unit(&self, unit: &SyncUnit) -> anyhow::Result<()>;

    /// Replaces all checklist items of a unit
    async fn replace_checklist_items(
        &self,
        unit_id: UnitId,
        items: &[ChecklistItem],
    ) -> anyhow::Result<()>;

    /// Replaces all image references of a unit
    async fn replace_images(&self, unit_id: UnitId, images: &[ImageRef]) -> anyhow::Result<()>;
}
