//! Integration tests for the reconciliation pass
//!
//! Runs full sync passes against in-memory backend and store doubles
//! and verifies the end states: conflict resolution, tombstone
//! suppression, image transfer and orphan convergence.


mod test_sync_pass;
