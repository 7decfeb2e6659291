//! Gated tasks and fan-out composition
//!
//! A [`Task`] is one asynchronous unit of work against an engine: created
//! Waiting, started only once the engine's gate opens, finished exactly
//! once. Composite shapes are plain higher-order functions — [`run_all`]
//! fans out over a collection, [`list_then`] discovers remote files and
//! dispatches one child per match — rather than a parallel type hierarchy
//! per task shape.

use std::future::Future;
use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use quillsync_core::ports::backend::RemoteFile;
use quillsync_core::status::{EngineStatus, TaskError, TaskResult, TaskStatus};

use crate::engine::Engine;
use crate::gate::TaskKind;

/// How a composite reacts to a failing child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// The first child failure fails the whole composite; remaining
    /// children are dropped. The recorded error is deterministically the
    /// first failure observed.
    FailFast,
    /// Child failures are logged and dropped; the composite collects the
    /// successful results and never fails because of a child.
    Tolerant,
}

/// One gated, single-completion unit of work
pub struct Task {
    engine: Arc<Engine>,
    trigger: EngineStatus,
    kind: TaskKind,
    cancel: CancellationToken,
    status_tx: watch::Sender<TaskStatus>,
}

impl Task {
    /// Creates a task in the Waiting state
    pub fn new(engine: Arc<Engine>, trigger: EngineStatus, kind: TaskKind) -> Self {
        Self {
            engine,
            trigger,
            kind,
            cancel: CancellationToken::new(),
            status_tx: watch::channel(TaskStatus::Waiting).0,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> TaskStatus {
        *self.status_tx.borrow()
    }

    /// Subscribes to lifecycle changes
    pub fn watch_status(&self) -> watch::Receiver<TaskStatus> {
        self.status_tx.subscribe()
    }

    /// Token that cancels the task if it has not started yet
    ///
    /// A task already Running is not preempted; its result is simply
    /// discarded by whoever cancelled it.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Moves to `next` unless the task already reached a terminal state.
    ///
    /// Returns true when the transition happened, making completion
    /// notification idempotent.
    fn transition(&self, next: TaskStatus) -> bool {
        self.status_tx.send_if_modified(|current| {
            if current.is_terminal() {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Waits for the engine gate, runs `op`, and reports completion once.
    ///
    /// Cancellation before the gate opens yields `Cancelled` and an error
    /// result; the operation never runs in that case.
    pub async fn run<T, Fut>(self, op: Fut) -> TaskResult<T>
    where
        Fut: Future<Output = TaskResult<T>>,
    {
        let permit = match self
            .engine
            .gate()
            .open(self.trigger, self.kind, &self.cancel)
            .await
        {
            Some(permit) => permit,
            None => {
                self.transition(TaskStatus::Cancelled);
                debug!("task cancelled before start");
                return Err(TaskError::other("task cancelled before start"));
            }
        };

        self.transition(TaskStatus::Running);
        let result = op.await;
        drop(permit);

        self.transition(TaskStatus::Finished);
        result
    }
}

/// Runs one gated operation against the engine
///
/// Convenience for the common leaf shape: a single backend call wrapped in
/// a [`Task`] of kind Operation.
pub async fn run_operation<T, Fut>(
    engine: &Arc<Engine>,
    trigger: EngineStatus,
    op: Fut,
) -> TaskResult<T>
where
    Fut: Future<Output = TaskResult<T>>,
{
    Task::new(engine.clone(), trigger, TaskKind::Operation)
        .run(op)
        .await
}

/// Fans out one child operation per input item
///
/// Children run concurrently, each as its own gated operation task, so the
/// engine's budget throttles them collectively. An empty input completes
/// immediately with an empty success: a zero-child fan-out would otherwise
/// never reach "all children reported".
pub async fn run_all<T, I, F, Fut>(
    engine: &Arc<Engine>,
    trigger: EngineStatus,
    policy: ChildPolicy,
    items: I,
    f: F,
) -> TaskResult<Vec<T>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = TaskResult<T>>,
{
    let mut children: FuturesUnordered<_> = items
        .into_iter()
        .map(|item| run_operation(engine, trigger, f(item)))
        .collect();

    if children.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::with_capacity(children.len());
    while let Some(result) = children.next().await {
        match result {
            Ok(value) => results.push(value),
            Err(err) => match policy {
                ChildPolicy::FailFast => {
                    debug!(%err, "child task failed, aborting composite");
                    return Err(err);
                }
                ChildPolicy::Tolerant => {
                    warn!(%err, "child task failed (tolerated)");
                }
            },
        }
    }

    Ok(results)
}

/// Discover-then-act: lists a directory, then dispatches one child per
/// matching remote file
///
/// The listing itself is a gated operation; the fan-out layer is meta and
/// holds no budget slot. A `PathNotFound` from the listing propagates to
/// the caller, who decides whether absence is tolerable.
pub async fn list_then<T, P, F, Fut>(
    engine: &Arc<Engine>,
    trigger: EngineStatus,
    dir: &str,
    filter: P,
    policy: ChildPolicy,
    f: F,
) -> TaskResult<Vec<T>>
where
    P: Fn(&RemoteFile) -> bool,
    F: Fn(RemoteFile) -> Fut,
    Fut: Future<Output = TaskResult<T>>,
{
    let files = run_operation(engine, trigger, engine.list_files(dir, filter)).await?;
    run_all(engine, trigger, policy, files, f).await
}
