//! Apply logic: create every planned policy and record the outcome.

use crate::catalog::Catalog;
use crate::error::PolicySyncResult;
use crate::rhacs::{ClientError, PolicyApi};
use crate::types::{FailedPolicy, PlanAction, RunResult, SkipReason, SkippedPolicy};

impl<C: PolicyApi + ?Sized> super::service::PolicySynchronizer<'_, C> {
    /// Synchronize the catalog into Central.
    ///
    /// The remote name set is fetched once up front; any error there aborts
    /// the run. Entries are then processed sequentially in catalog order. A
    /// conflict counts as skipped, API and connectivity errors are recorded
    /// against the entry and processing continues. An authentication error
    /// aborts the run.
    pub async fn run(&self, catalog: &Catalog) -> PolicySyncResult<RunResult> {
        let existing = self.client.list_policy_names().await?;
        let plan = self.plan(catalog, &existing);
        let mut result = RunResult::default();

        for (planned, (target, policy)) in plan.policies.iter().zip(catalog.entries()) {
            if planned.action == PlanAction::Skip {
                log::info!("Policy '{}' already exists, skipping", policy.name);
                result.skipped.push(SkippedPolicy {
                    name: policy.name.clone(),
                    reason: SkipReason::AlreadyExists,
                });
                continue;
            }

            log::debug!(
                "Creating {target} policy '{}' (severity {})",
                policy.name,
                policy.severity
            );
            match self.client.create_policy(policy).await {
                Ok(created) => {
                    log::info!(
                        "Successfully created policy: {} (ID: {})",
                        policy.name,
                        created.id.as_deref().unwrap_or("unknown")
                    );
                    result.created.push(policy.name.clone());
                }
                Err(ClientError::Conflict(message)) => {
                    log::info!(
                        "Policy '{}' already exists in Central, skipping: {message}",
                        policy.name
                    );
                    result.skipped.push(SkippedPolicy {
                        name: policy.name.clone(),
                        reason: SkipReason::Conflict,
                    });
                }
                Err(e) if e.is_fatal() => {
                    log::error!("Aborting run while creating '{}': {e}", policy.name);
                    return Err(e.into());
                }
                Err(e) => {
                    log::error!("Failed to create policy {}: {e}", policy.name);
                    result.failed.push(FailedPolicy {
                        name: policy.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }
}
