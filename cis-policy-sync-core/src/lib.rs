//! This crate provides the core logic for CIS Policy Sync:
//! - Catalog loading and schema checks
//! - The RHACS Central policy client
//! - Idempotent synchronization of catalog policies into Central
//!

mod catalog;
pub mod commands;
pub mod config;
mod error;
pub mod rhacs;
mod types;

// Re-exports for a small, focused public API
pub use catalog::Catalog;
pub use commands::{PolicySynchronizer, SyncOptions};
pub use config::{AppConfig, ConnectionSettings};
pub use error::{PolicySyncError, PolicySyncResult};
pub use rhacs::{CentralClient, ClientError, CreatedPolicy, PolicyApi};
pub use types::{
    EnforcementAction, FailedPolicy, LifecycleStage, PlanAction, PlannedPolicy, PolicyDefinition,
    PolicyTarget, RunResult, Severity, SkipReason, SkippedPolicy, SyncPlan,
};
