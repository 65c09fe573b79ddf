//! Core data types: policy definitions as read from the catalog, and the
//! plan/result records produced by the synchronizer.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{PolicySyncError, PolicySyncResult};

/// Policy severity.
///
/// Accepts both the short catalog form (`HIGH`) and the RHACS wire form
/// (`HIGH_SEVERITY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "LOW_SEVERITY", alias = "LOW")]
    Low,
    #[serde(rename = "MEDIUM_SEVERITY", alias = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH_SEVERITY", alias = "HIGH")]
    High,
    #[serde(rename = "CRITICAL_SEVERITY", alias = "CRITICAL")]
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Point in a workload's life at which a policy is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStage {
    Build,
    Deploy,
    Runtime,
}

/// Consequence applied by RHACS when a policy matches.
///
/// Values this tool does not know about deserialize to [`EnforcementAction::Other`];
/// the original text is still sent to Central since the source document is
/// transmitted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementAction {
    UnsetEnforcement,
    ScaleToZeroEnforcement,
    UnsatisfiableNodeConstraintEnforcement,
    KillPodEnforcement,
    FailBuildEnforcement,
    FailKubeRequestEnforcement,
    FailDeploymentCreateEnforcement,
    FailDeploymentUpdateEnforcement,
    #[serde(other)]
    Other,
}

/// Catalog collection a policy was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyTarget {
    Kubernetes,
    Docker,
    Runtime,
}

impl PolicyTarget {
    /// All targets, in the order the catalog is processed.
    pub const ALL: [PolicyTarget; 3] = [Self::Kubernetes, Self::Docker, Self::Runtime];

    /// Top-level key of this collection in the catalog document.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes_policies",
            Self::Docker => "docker_policies",
            Self::Runtime => "runtime_policies",
        }
    }
}

impl fmt::Display for PolicyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kubernetes => "Kubernetes",
            Self::Docker => "Docker",
            Self::Runtime => "Runtime",
        };
        f.write_str(s)
    }
}

/// Typed view of the fields the synchronizer and loader care about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyFields {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    remediation: Option<String>,
    severity: Severity,
    #[serde(default)]
    lifecycle_stages: Vec<LifecycleStage>,
    #[serde(default)]
    enforcement_actions: Vec<EnforcementAction>,
}

/// A single policy record from the catalog.
///
/// The source JSON object is kept alongside the typed fields and is what gets
/// serialized, so `policySections`, `mitreAttackVectors` and any field not
/// modelled here reach Central exactly as written in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDefinition {
    pub name: String,
    pub description: Option<String>,
    pub rationale: Option<String>,
    pub remediation: Option<String>,
    pub severity: Severity,
    pub lifecycle_stages: Vec<LifecycleStage>,
    pub enforcement_actions: Vec<EnforcementAction>,
    document: Map<String, Value>,
}

impl PolicyDefinition {
    /// Build a definition from a catalog object.
    ///
    /// Fails with [`PolicySyncError::Schema`] when a required field is missing
    /// or a typed field carries an unknown value.
    pub fn from_document(document: Map<String, Value>) -> PolicySyncResult<Self> {
        match document.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => {}
            Some(Value::String(_)) => {
                return Err(PolicySyncError::schema("field `name` must not be empty"));
            }
            Some(_) => return Err(PolicySyncError::schema("field `name` must be a string")),
            None => return Err(PolicySyncError::schema("missing required field `name`")),
        }
        if !document.contains_key("severity") {
            return Err(PolicySyncError::schema("missing required field `severity`"));
        }

        let fields: PolicyFields = serde_json::from_value(Value::Object(document.clone()))
            .map_err(|e| PolicySyncError::schema(e.to_string()))?;

        Ok(Self {
            name: fields.name,
            description: fields.description,
            rationale: fields.rationale,
            remediation: fields.remediation,
            severity: fields.severity,
            lifecycle_stages: fields.lifecycle_stages,
            enforcement_actions: fields.enforcement_actions,
            document,
        })
    }
}

impl Serialize for PolicyDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

/// What the synchronizer intends to do with one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Create,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPolicy {
    pub name: String,
    pub target: PolicyTarget,
    pub action: PlanAction,
}

/// Per-entry actions in catalog order, computed from the catalog and the
/// remote name snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub policies: Vec<PlannedPolicy>,
}

impl SyncPlan {
    pub fn create_count(&self) -> usize {
        self.count(PlanAction::Create)
    }

    pub fn skip_count(&self) -> usize {
        self.count(PlanAction::Skip)
    }

    fn count(&self, action: PlanAction) -> usize {
        self.policies.iter().filter(|p| p.action == action).count()
    }
}

/// Why a policy was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Name was present in the remote snapshot.
    AlreadyExists,
    /// Central answered the create call with a conflict.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPolicy {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPolicy {
    pub name: String,
    pub error: String,
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub created: Vec<String>,
    pub skipped: Vec<SkippedPolicy>,
    pub failed: Vec<FailedPolicy>,
}

impl RunResult {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.created_count() + self.skipped_count() + self.failed_count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
