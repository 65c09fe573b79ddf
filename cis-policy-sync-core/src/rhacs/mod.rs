//! RHACS Central integration: the policy API seam and its HTTP client.

pub(crate) mod central_client;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::types::PolicyDefinition;

pub use central_client::CentralClient;

/// Errors from a single remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Could not reach RHACS Central: {0}")]
    Connectivity(String),
    #[error("RHACS Central rejected the API token (HTTP {status})")]
    Auth { status: u16 },
    #[error("Policy already exists: {0}")]
    Conflict(String),
    #[error("RHACS API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// Whether this error must abort the whole run rather than a single entry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Response body of a successful create call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedPolicy {
    #[serde(default)]
    pub id: Option<String>,
}

/// Remote operations the synchronizer depends on.
#[async_trait]
pub trait PolicyApi: Send + Sync {
    /// Verify Central is reachable and the token is accepted.
    async fn check_connection(&self) -> ClientResult<()>;

    /// Names of all policies currently defined in Central.
    async fn list_policy_names(&self) -> ClientResult<BTreeSet<String>>;

    /// Create a policy, sending its catalog document unchanged.
    async fn create_policy(&self, policy: &PolicyDefinition) -> ClientResult<CreatedPolicy>;
}
