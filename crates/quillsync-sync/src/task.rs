//! The reconciliation pass
//!
//! A pass runs against a fully reachable remote (engine status `Ok`)
//! and walks six steps: pre-fetch locally referenced images, download
//! and merge the remote manifest, persist remote winners, rewrite the
//! manifest, upload missing images, and finally clean up orphans.
//! A missing remote path is never fatal anywhere in the pass; any other
//! failure aborts it.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use quillsync_core::domain::{ImageRef, SyncUnit, UnitId};
use quillsync_core::manifest::{self, ATTACHMENT_DIR, JSON_DIR, MANIFEST_FILE, MANIFEST_MIME};
use quillsync_core::ports::local_store::LocalStore;
use quillsync_core::status::{tolerate_not_found, EngineStatus, TaskError, TaskResult};
use quillsync_engine::{run_all, run_operation, ChildPolicy, Engine};

/// Reconciliation only runs against a remote that answered the probe
const TRIGGER: EngineStatus = EngineStatus::Ok;

/// Scratch names used inside the image cache during a pass
const INCOMING_MANIFEST: &str = ".noteCombos.incoming.json";
const OUTGOING_MANIFEST: &str = ".noteCombos.outgoing.json";

use crate::report::SyncReport;

/// Runs one full reconciliation pass
pub async fn run_sync(
    engine: &Arc<Engine>,
    store: &dyn LocalStore,
    image_cache: &Path,
) -> TaskResult<SyncReport> {
    let started = Instant::now();
    let mut report = SyncReport::default();

    tokio::fs::create_dir_all(image_cache)
        .await
        .map_err(|e| TaskError::other(format!("creating {}: {e}", image_cache.display())))?;

    let local_units = store.list_all_units().await.map_err(store_error)?;
    let tombstones: HashSet<UnitId> = store
        .list_deleted_ids()
        .await
        .map_err(store_error)?
        .into_iter()
        .collect();

    let attachment_dir = engine.absolute_path(&[ATTACHMENT_DIR]);
    let manifest_remote = engine.absolute_path(&[JSON_DIR, MANIFEST_FILE]);

    // Steps 1 and 2 touch disjoint remote paths and run side by side.
    let (prefetched, remote_units) = tokio::join!(
        fetch_missing_images(engine, &local_units, image_cache),
        fetch_manifest(engine, &manifest_remote, image_cache, &tombstones),
    );
    report.images_downloaded += prefetched?;
    let remote_units = remote_units?;

    // Step 3: whole-record last-writer-wins per unit id. The loser is
    // discarded entirely, never field-merged.
    let mut merged: HashMap<UnitId, SyncUnit> = local_units
        .iter()
        .map(|unit| (unit.id(), unit.clone()))
        .collect();
    let mut pulled: Vec<SyncUnit> = Vec::new();
    for remote in remote_units {
        let remote_wins = match merged.get(&remote.id()) {
            Some(local) => local.is_superseded_by(&remote),
            None => true,
        };
        if remote_wins {
            merged.insert(remote.id(), remote.clone());
            pulled.push(remote);
        }
    }
    for unit in &pulled {
        persist_unit(store, unit).await?;
    }
    report.units_pulled = pulled.len() as u32;
    report.images_downloaded += fetch_missing_images(engine, &pulled, image_cache).await?;

    // Step 4: the manifest is always rewritten in full, in a stable order.
    let mut manifest_units: Vec<SyncUnit> = merged.into_values().collect();
    manifest_units.sort_by_key(|unit| (unit.note.created_at, unit.id()));

    let outgoing = image_cache.join(OUTGOING_MANIFEST);
    let json = manifest::to_json(&manifest_units)
        .map_err(|e| TaskError::other(format!("encoding manifest: {e}")))?;
    tokio::fs::write(&outgoing, json)
        .await
        .map_err(|e| TaskError::other(format!("writing {}: {e}", outgoing.display())))?;
    run_operation(
        engine,
        TRIGGER,
        engine.upload_file(&outgoing, &manifest_remote, MANIFEST_MIME),
    )
    .await?;
    let _ = tokio::fs::remove_file(&outgoing).await;
    report.units_pushed = manifest_units.len() as u32;

    // Step 5: push every referenced image the remote lacks, matching by
    // name and size.
    let remote_files = tolerate_not_found(
        run_operation(
            engine,
            TRIGGER,
            engine.list_files(&attachment_dir, |file| !file.is_dir),
        )
        .await,
    )?
    .unwrap_or_default();
    let remote_present: HashSet<(String, u64)> = remote_files
        .iter()
        .map(|file| (file.file_name().to_string(), file.size))
        .collect();

    let mut to_upload: Vec<ImageRef> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for unit in &manifest_units {
        for image in &unit.images {
            if !seen.insert(image.file_name.as_str()) {
                continue;
            }
            if remote_present.contains(&(image.file_name.clone(), image.size_bytes)) {
                continue;
            }
            if image_cache.join(&image.file_name).is_file() {
                to_upload.push(image.clone());
            } else {
                warn!(file = %image.file_name, "referenced image missing from cache, cannot upload");
                report
                    .errors
                    .push(format!("missing cached image {}", image.file_name));
            }
        }
    }
    let uploaded = run_all(engine, TRIGGER, ChildPolicy::FailFast, to_upload, |image| {
        let local = image_cache.join(&image.file_name);
        let remote = engine.absolute_path(&[ATTACHMENT_DIR, image.file_name.as_str()]);
        async move {
            tolerate_not_found(engine.upload_file(&local, &remote, &image.mime_type).await)
        }
    })
    .await?;
    report.images_uploaded = uploaded.iter().filter(|r| r.is_some()).count() as u32;

    // Step 6: orphan cleanup, strictly last and best-effort.
    let referenced: HashSet<&str> = manifest_units
        .iter()
        .flat_map(|unit| unit.images.iter().map(|image| image.file_name.as_str()))
        .collect();
    let orphans: Vec<String> = remote_files
        .iter()
        .filter(|file| !referenced.contains(file.file_name()))
        .map(|file| engine.absolute_path(&[ATTACHMENT_DIR, file.file_name()]))
        .collect();
    let removed = run_all(engine, TRIGGER, ChildPolicy::Tolerant, orphans, |remote| {
        async move { engine.remove_file(&remote).await }
    })
    .await?;
    report.images_removed = removed.len() as u32;

    report.local_files_removed = remove_local_orphans(image_cache, &referenced).await;

    report.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        pulled = report.units_pulled,
        pushed = report.units_pushed,
        images_down = report.images_downloaded,
        images_up = report.images_uploaded,
        removed = report.images_removed,
        duration_ms = report.duration_ms,
        "sync pass finished"
    );
    Ok(report)
}

/// Downloads images referenced by `units` that are absent from the cache
///
/// Absence on the remote side is tolerated; the image may simply not
/// have been uploaded by the other device yet.
async fn fetch_missing_images(
    engine: &Arc<Engine>,
    units: &[SyncUnit],
    image_cache: &Path,
) -> TaskResult<u32> {
    let mut seen: HashSet<&str> = HashSet::new();
    let missing: Vec<&ImageRef> = units
        .iter()
        .flat_map(|unit| unit.images.iter())
        .filter(|image| seen.insert(image.file_name.as_str()))
        .filter(|image| !image_cache.join(&image.file_name).is_file())
        .collect();

    let results = run_all(engine, TRIGGER, ChildPolicy::FailFast, missing, |image| {
        let local = image_cache.join(&image.file_name);
        let remote = engine.absolute_path(&[ATTACHMENT_DIR, image.file_name.as_str()]);
        async move { tolerate_not_found(engine.download_file(&remote, &local).await) }
    })
    .await?;

    Ok(results.into_iter().flatten().count() as u32)
}

/// Downloads and parses the remote manifest, dropping tombstoned units
///
/// No manifest on the remote means a first sync: an empty remote set.
async fn fetch_manifest(
    engine: &Arc<Engine>,
    manifest_remote: &str,
    work_dir: &Path,
    tombstones: &HashSet<UnitId>,
) -> TaskResult<Vec<SyncUnit>> {
    let incoming = work_dir.join(INCOMING_MANIFEST);
    let downloaded = tolerate_not_found(
        run_operation(
            engine,
            TRIGGER,
            engine.download_file(manifest_remote, &incoming),
        )
        .await,
    )?;
    let Some(path) = downloaded else {
        debug!("no remote manifest yet, treating remote as empty");
        return Ok(Vec::new());
    };

    let json = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| TaskError::other(format!("reading {}: {e}", path.display())))?;
    let _ = tokio::fs::remove_file(&path).await;

    manifest::from_json_filtered(&json, tombstones)
        .map_err(|e| TaskError::other(format!("decoding manifest: {e}")))
}

/// Writes a remote-won unit into the local store
async fn persist_unit(store: &dyn LocalStore, unit: &SyncUnit) -> TaskResult<()> {
    store.upsert_unit(unit).await.map_err(store_error)?;
    store
        .replace_checklist_items(unit.id(), &unit.checklist_items)
        .await
        .map_err(store_error)?;
    store
        .replace_images(unit.id(), &unit.images)
        .await
        .map_err(store_error)
}

/// Deletes cached files nothing references anymore; purely best-effort
async fn remove_local_orphans(image_cache: &Path, referenced: &HashSet<&str>) -> u32 {
    let mut removed = 0;
    let Ok(mut entries) = tokio::fs::read_dir(image_cache).await else {
        return 0;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Scratch files use dot-prefixed names.
        if name.starts_with('.') || referenced.contains(name.as_str()) {
            continue;
        }
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file && tokio::fs::remove_file(entry.path()).await.is_ok() {
            debug!(file = %name, "removed unreferenced cached image");
            removed += 1;
        }
    }
    removed
}

fn store_error(err: anyhow::Error) -> TaskError {
    TaskError::other(format!("local store: {err:#}"))
}
