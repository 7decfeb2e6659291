//! Connection probe
//!
//! Verifies backend reachability and credentials without transferring any
//! user data: a fail-fast fan-out over the two required remote directories
//! (attachments and manifest), each driven through the idempotent
//! `create_dir`. The outcome maps straight onto the engine's readiness
//! level.

use std::sync::Arc;

use tracing::info;

use quillsync_core::manifest::{ATTACHMENT_DIR, JSON_DIR};
use quillsync_core::status::{EngineStatus, OpStatus, TaskError};

use crate::engine::Engine;
use crate::task::{run_all, run_operation, ChildPolicy};

/// Outcome of a connection probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// The readiness level the engine was left at
    pub engine_status: EngineStatus,
    /// The first failure encountered, if any
    pub error: Option<TaskError>,
}

impl ProbeReport {
    /// True when both required directories were confirmed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.engine_status == EngineStatus::Ok
    }
}

/// Maps a probe failure onto a readiness level
fn status_for_failure(err: &TaskError) -> EngineStatus {
    if err.status == OpStatus::AuthError {
        EngineStatus::AuthError
    } else {
        EngineStatus::Error
    }
}

/// Every prefix of the base path, shortest first
///
/// `create_dir` is single-level on all backends, so a nested base
/// directory has to be provisioned ancestor by ancestor.
fn ancestor_paths(base: &str) -> Vec<String> {
    let absolute = base.starts_with('/');
    let mut paths = Vec::new();
    let mut current = String::new();
    for segment in base.split('/').filter(|s| !s.is_empty()) {
        if current.is_empty() && !absolute {
            current.push_str(segment);
        } else {
            current.push('/');
            current.push_str(segment);
        }
        paths.push(current.clone());
    }
    paths
}

/// Runs the connection probe and updates the engine's readiness
///
/// Refuses to run while a probe is already in flight (or the engine is
/// disabled); the refusal is reported as an `Error`-level outcome without
/// touching the engine's level.
pub async fn run_probe(engine: &Arc<Engine>) -> ProbeReport {
    if !engine.begin_probe() {
        return ProbeReport {
            engine_status: engine.status(),
            error: Some(TaskError::other(
                "probe refused: engine disabled or already testing",
            )),
        };
    }

    let dirs = [
        engine.absolute_path(&[ATTACHMENT_DIR]),
        engine.absolute_path(&[JSON_DIR]),
    ];

    info!(?dirs, "probing backend");

    // Provision the base path first, ancestor by ancestor: on a fresh
    // server the required directories cannot be created under a base that
    // does not exist yet. Existing ancestors confirm as success.
    for path in ancestor_paths(&engine.absolute_path(&[])) {
        if let Err(err) =
            run_operation(engine, EngineStatus::Testing, engine.create_dir(&path)).await
        {
            let report = ProbeReport {
                engine_status: status_for_failure(&err),
                error: Some(err),
            };
            engine.on_probe_completed(report.engine_status);
            return report;
        }
    }

    // Probe children gate on Testing, the level the probe itself holds.
    let outcome = run_all(
        engine,
        EngineStatus::Testing,
        ChildPolicy::FailFast,
        dirs,
        |dir| async move { engine.create_dir(&dir).await },
    )
    .await;

    let report = match outcome {
        Ok(_) => ProbeReport {
            engine_status: EngineStatus::Ok,
            error: None,
        },
        Err(err) => ProbeReport {
            engine_status: status_for_failure(&err),
            error: Some(err),
        },
    };

    engine.on_probe_completed(report.engine_status);
    report
}
