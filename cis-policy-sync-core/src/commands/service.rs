//! Policy synchronizer
//!
//! Holds a borrowed [`PolicyApi`] client and the run options. The operations
//! themselves live next door: `plan()` in plan.rs, `run()` in apply.rs.

use crate::rhacs::PolicyApi;

/// Options controlling one synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Skip catalog entries whose name already exists in Central instead of
    /// attempting to create them.
    pub skip_existing: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
        }
    }
}

/// Creates catalog policies in Central, one request at a time.
pub struct PolicySynchronizer<'a, C: PolicyApi + ?Sized> {
    pub(crate) client: &'a C,
    pub(crate) options: SyncOptions,
}

impl<'a, C: PolicyApi + ?Sized> PolicySynchronizer<'a, C> {
    pub fn new(client: &'a C, options: SyncOptions) -> Self {
        Self { client, options }
    }
}
