//! Plan creation: diff the catalog against the remote name snapshot.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::error::PolicySyncResult;
use crate::rhacs::PolicyApi;
use crate::types::{PlanAction, PlannedPolicy, SyncPlan};

impl<C: PolicyApi + ?Sized> super::service::PolicySynchronizer<'_, C> {
    /// Decide, for every catalog entry in order, whether it will be created
    /// or skipped. Pure; makes no remote calls.
    ///
    /// With `skip_existing` off every entry is planned for creation and a
    /// name collision is left for Central to report as a conflict.
    pub fn plan(&self, catalog: &Catalog, existing: &BTreeSet<String>) -> SyncPlan {
        let policies = catalog
            .entries()
            .map(|(target, policy)| {
                let action = if self.options.skip_existing && existing.contains(&policy.name) {
                    PlanAction::Skip
                } else {
                    PlanAction::Create
                };
                PlannedPolicy {
                    name: policy.name.clone(),
                    target,
                    action,
                }
            })
            .collect();
        SyncPlan { policies }
    }

    /// Fetch the remote snapshot and build the plan without creating anything.
    pub async fn dry_run(&self, catalog: &Catalog) -> PolicySyncResult<SyncPlan> {
        let existing = self.client.list_policy_names().await?;
        Ok(self.plan(catalog, &existing))
    }
}
