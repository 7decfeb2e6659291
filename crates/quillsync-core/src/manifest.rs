//! Remote manifest wire format
//!
//! The remote side of a sync is a single JSON document at
//! `<json-subdir>/noteCombos.json` holding the full array of
//! [`SyncUnit`]s, plus a flat attachment directory for images. Every sync
//! pass rewrites the entire manifest; it is never patched incrementally,
//! so the document is always internally consistent.

use std::collections::HashSet;

use crate::domain::{SyncUnit, UnitId};

/// File name of the remote manifest document
pub const MANIFEST_FILE: &str = "noteCombos.json";

/// Remote subdirectory holding the manifest
pub const JSON_DIR: &str = "json";

/// Remote subdirectory holding image attachments (flat, filename-addressed)
pub const ATTACHMENT_DIR: &str = "attachments";

/// MIME type the manifest is uploaded with
pub const MANIFEST_MIME: &str = "application/json";

/// Serializes units into the manifest document
pub fn to_json(units: &[SyncUnit]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(units)
}

/// Parses a manifest document into units
pub fn from_json(json: &str) -> serde_json::Result<Vec<SyncUnit>> {
    serde_json::from_str(json)
}

/// Parses a manifest and drops every unit whose id is tombstoned
///
/// A locally deleted note must never be resurrected by a stale remote
/// copy, regardless of its timestamp.
pub fn from_json_filtered(
    json: &str,
    tombstones: &HashSet<UnitId>,
) -> serde_json::Result<Vec<SyncUnit>> {
    let units = from_json(json)?;
    Ok(units
        .into_iter()
        .filter(|u| !tombstones.contains(&u.id()))
        .collect())
}
