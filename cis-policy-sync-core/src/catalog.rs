//! Catalog loading: reads the JSON policy catalog into typed definitions.
//!
//! The catalog is a JSON object with up to three ordered collections,
//! `kubernetes_policies`, `docker_policies` and `runtime_policies`. Missing
//! collections are empty. Names must be unique across the whole catalog.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::{PolicySyncError, PolicySyncResult};
use crate::types::{PolicyDefinition, PolicyTarget};

/// Immutable, ordered set of policy definitions grouped by target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    kubernetes: Vec<PolicyDefinition>,
    docker: Vec<PolicyDefinition>,
    runtime: Vec<PolicyDefinition>,
}

impl Catalog {
    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> PolicySyncResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PolicySyncError::io(path, e))?;
        let catalog = Self::from_json_str(&content)?;
        log::info!(
            "Loaded {} policies from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from an in-memory JSON document.
    pub fn from_json_str(content: &str) -> PolicySyncResult<Self> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| PolicySyncError::parsing(format!("invalid JSON: {e}")))?;
        let Value::Object(mut root) = root else {
            return Err(PolicySyncError::parsing(
                "catalog must be a JSON object at the top level",
            ));
        };

        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for target in PolicyTarget::ALL {
            let key = target.collection_key();
            let entries = match root.remove(key) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(PolicySyncError::parsing(format!("`{key}` must be a list")));
                }
            };

            let policies = catalog.policies_mut(target);
            for (index, entry) in entries.into_iter().enumerate() {
                let Value::Object(document) = entry else {
                    return Err(PolicySyncError::schema(format!(
                        "{key}[{index}]: entry must be an object"
                    )));
                };
                let definition =
                    PolicyDefinition::from_document(document).map_err(|e| match e {
                        PolicySyncError::Schema(reason) => {
                            PolicySyncError::schema(format!("{key}[{index}]: {reason}"))
                        }
                        other => other,
                    })?;
                if !seen.insert(definition.name.clone()) {
                    return Err(PolicySyncError::schema(format!(
                        "{key}[{index}]: duplicate policy name '{}'",
                        definition.name
                    )));
                }
                policies.push(definition);
            }
        }

        for key in root.keys() {
            log::debug!("Ignoring unknown catalog section '{key}'");
        }

        Ok(catalog)
    }

    /// Policies of one collection, in document order.
    pub fn policies(&self, target: PolicyTarget) -> &[PolicyDefinition] {
        match target {
            PolicyTarget::Kubernetes => &self.kubernetes,
            PolicyTarget::Docker => &self.docker,
            PolicyTarget::Runtime => &self.runtime,
        }
    }

    fn policies_mut(&mut self, target: PolicyTarget) -> &mut Vec<PolicyDefinition> {
        match target {
            PolicyTarget::Kubernetes => &mut self.kubernetes,
            PolicyTarget::Docker => &mut self.docker,
            PolicyTarget::Runtime => &mut self.runtime,
        }
    }

    /// All entries in processing order: Kubernetes, then Docker, then runtime.
    pub fn entries(&self) -> impl Iterator<Item = (PolicyTarget, &PolicyDefinition)> {
        PolicyTarget::ALL
            .into_iter()
            .flat_map(move |target| self.policies(target).iter().map(move |p| (target, p)))
    }

    pub fn len(&self) -> usize {
        self.kubernetes.len() + self.docker.len() + self.runtime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
