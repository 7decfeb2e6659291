//! The synchronized unit: one note plus its checklist items and images
//!
//! A [`SyncUnit`] is the atomic object of synchronization. Its identity is
//! the note's [`UnitId`]; its version is the note's `updated_at` timestamp.
//! Conflict resolution is whole-record, last-writer-wins: two versions of
//! the same unit are never merged field-by-field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::UnitId;

/// A single note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable identity of the note across devices
    pub id: UnitId,
    /// Note title
    pub title: String,
    /// Note body text
    pub body: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp; the sole input to conflict resolution
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new note with both timestamps set to now
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UnitId::new(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One checklist entry attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// The checklist text
    pub text: String,
    /// Whether the item has been ticked off
    pub done: bool,
    /// Display order within the note
    pub position: u32,
}

/// Reference to an image attachment
///
/// Purely descriptive: the actual bytes live in the local image cache and
/// in the remote attachment directory, addressed by `file_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// File name within the attachment directory (no path components)
    pub file_name: String,
    /// Size of the image in bytes; used to detect stale remote copies
    pub size_bytes: u64,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
}

/// The atomic unit of synchronization
///
/// Serializes as `{note: {...}, checklistItems: [...], images: [...]}` in
/// the remote manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUnit {
    /// The note itself
    pub note: Note,
    /// Checklist items belonging to the note
    pub checklist_items: Vec<ChecklistItem>,
    /// Image attachments referenced by the note
    pub images: Vec<ImageRef>,
}

impl SyncUnit {
    /// Creates a unit with no checklist items or images
    pub fn new(note: Note) -> Self {
        Self {
            note,
            checklist_items: Vec::new(),
            images: Vec::new(),
        }
    }

    /// The unit's identity
    pub fn id(&self) -> UnitId {
        self.note.id
    }

    /// The unit's version timestamp
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.note.updated_at
    }

    /// Returns true if `other` is a strictly newer version of the same unit.
    ///
    /// Equal timestamps keep the receiver authoritative; only a strictly
    /// greater `updated_at` loses.
    pub fn is_superseded_by(&self, other: &SyncUnit) -> bool {
        self.id() == other.id() && other.updated_at() > self.updated_at()
    }
}
