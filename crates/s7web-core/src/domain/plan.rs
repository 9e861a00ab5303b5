//! Synchronization plan
//!
//! The output of diffing a desired tree against an observed tree: three
//! disjoint path sets. A plan is computed fresh on every synchronization
//! round and never persisted.

use super::newtypes::ResourcePath;

/// Set-difference between a desired and an observed resource tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Present in desired, absent on the device
    pub to_add: Vec<ResourcePath>,
    /// Present in both but differing (file-type only; kind mismatches
    /// surface as a delete plus an add)
    pub to_update: Vec<ResourcePath>,
    /// Present on the device, absent in desired
    pub to_delete: Vec<ResourcePath>,
}

impl SyncPlan {
    /// An empty plan (converged state)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when nothing needs to change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of operations in this plan
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_delete.len()
    }
}
