//! Commands module - synchronizer operations (plan, dry run, run)

mod apply;
mod plan;
pub(crate) mod service;

pub use service::{PolicySynchronizer, SyncOptions};
