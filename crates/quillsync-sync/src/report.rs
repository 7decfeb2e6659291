//! Summary of a completed reconciliation pass

/// Per-step counters of one sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Units taken over from the remote manifest
    pub units_pulled: u32,
    /// Units written into the rewritten remote manifest
    pub units_pushed: u32,
    /// Images fetched from the remote attachment directory
    pub images_downloaded: u32,
    /// Images uploaded because they were absent or size-mismatched remotely
    pub images_uploaded: u32,
    /// Remote orphan images deleted
    pub images_removed: u32,
    /// Local cached files deleted because nothing references them anymore
    pub local_files_removed: u32,
    /// Non-fatal problems encountered along the way
    pub errors: Vec<String>,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// True when the pass moved no data at all
    pub fn is_noop(&self) -> bool {
        self.units_pulled == 0
            && self.images_downloaded == 0
            && self.images_uploaded == 0
            && self.images_removed == 0
            && self.local_files_removed == 0
    }
}
