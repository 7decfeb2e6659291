//! The readiness gate tasks wait on before running
//!
//! A task may start only once `EngineStatus >= trigger` AND fewer than
//! [`MAX_RUNNING_OPERATIONS`] non-meta tasks are running. Meta tasks (pure
//! aggregators that only dispatch children) bypass the budget.
//!
//! Instead of re-checking on a fixed interval, the gate is woken whenever
//! the status or the running count changes, via `tokio::sync::watch`. The
//! observable predicate is unchanged.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use quillsync_core::status::EngineStatus;

/// Maximum number of concurrently running non-meta tasks per engine
pub const MAX_RUNNING_OPERATIONS: usize = 3;

/// Whether a task performs backend I/O or only dispatches children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// A leaf network operation; counts against the concurrency budget
    Operation,
    /// A pure aggregator; exempt from the budget
    Meta,
}

/// Shared gate state: the engine's readiness level and the running count
#[derive(Debug)]
pub(crate) struct Gate {
    status_tx: watch::Sender<EngineStatus>,
    running_tx: watch::Sender<usize>,
}

/// Budget slot held while an operation task runs
///
/// Dropping the permit releases the slot and wakes waiting tasks.
#[derive(Debug)]
pub struct Permit {
    running_tx: Option<watch::Sender<usize>>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(tx) = &self.running_tx {
            tx.send_modify(|n| *n = n.saturating_sub(1));
        }
    }
}

impl Gate {
    pub(crate) fn new(initial: EngineStatus) -> Self {
        Self {
            status_tx: watch::channel(initial).0,
            running_tx: watch::channel(0).0,
        }
    }

    pub(crate) fn status(&self) -> EngineStatus {
        *self.status_tx.borrow()
    }

    pub(crate) fn set_status(&self, status: EngineStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Atomically replaces the status if the current value satisfies `check`.
    ///
    /// Returns true when the swap happened.
    pub(crate) fn set_status_if(
        &self,
        check: impl FnOnce(EngineStatus) -> bool,
        status: EngineStatus,
    ) -> bool {
        let mut swapped = false;
        self.status_tx.send_if_modified(|current| {
            if check(*current) {
                *current = status;
                swapped = true;
                true
            } else {
                false
            }
        });
        swapped
    }

    pub(crate) fn subscribe_status(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn running(&self) -> usize {
        *self.running_tx.borrow()
    }

    /// Waits until the gate predicate holds, then claims a budget slot.
    ///
    /// Returns `None` if `cancel` fires first. Meta tasks skip the budget
    /// and receive a no-op permit.
    pub(crate) async fn open(
        &self,
        trigger: EngineStatus,
        kind: TaskKind,
        cancel: &CancellationToken,
    ) -> Option<Permit> {
        let mut status_rx = self.status_tx.subscribe();
        let mut running_rx = self.running_tx.subscribe();

        loop {
            let status_ok = *status_rx.borrow_and_update() >= trigger;
            let budget_ok =
                kind == TaskKind::Meta || *running_rx.borrow_and_update() < MAX_RUNNING_OPERATIONS;

            if status_ok && budget_ok {
                if kind == TaskKind::Meta {
                    return Some(Permit { running_tx: None });
                }

                // Claim a slot under the watch lock so two waiters cannot
                // both take the last one.
                let claimed = self.running_tx.send_if_modified(|n| {
                    if *n < MAX_RUNNING_OPERATIONS {
                        *n += 1;
                        true
                    } else {
                        false
                    }
                });

                if claimed {
                    // The status may have dropped between the check and the
                    // claim; release and go around again if so.
                    if *status_rx.borrow() >= trigger {
                        trace!(running = self.running(), "gate opened");
                        return Some(Permit {
                            running_tx: Some(self.running_tx.clone()),
                        });
                    }
                    self.running_tx.send_modify(|n| *n = n.saturating_sub(1));
                    continue;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = status_rx.changed() => {}
                _ = running_rx.changed() => {}
            }
        }
    }
}
