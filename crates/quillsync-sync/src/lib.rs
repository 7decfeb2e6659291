//! Reconciliation pass for QuillSync
//!
//! Runs the full note/image reconciliation between the local store and
//! a remote backend: manifest exchange with last-writer-wins conflict
//! resolution, image transfer in both directions, and orphan cleanup.

pub mod report;
pub mod task;

pub use report::SyncReport;
pub use task::run_sync;
