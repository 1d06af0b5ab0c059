//! Stored object types.
//!
//! Objects are serialized to JSON for storage in redb tables.

use std::collections::HashMap;

use gpuinfo_core::{PlacementDecision, PlacementRequest};
use serde::{Deserialize, Serialize};

/// A placement request object: the requester's spec plus the controller's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub namespace: String,
    pub name: String,
    pub spec: PlacementRequest,
    #[serde(default)]
    pub status: PlacementDecision,
    /// Assigned by the store; bumped on every write.
    #[serde(default)]
    pub resource_version: u64,
}

impl GpuInfo {
    pub fn new(namespace: &str, name: &str, spec: PlacementRequest) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            spec,
            status: PlacementDecision::default(),
            resource_version: 0,
        }
    }

    /// Build the composite key for the requests table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// A cluster node as listed by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl NodeInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: HashMap::new(),
        }
    }
}
