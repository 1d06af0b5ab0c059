//! Shared types used across gpuinfo crates.

use serde::{Deserialize, Serialize};

/// Name reported for both node and host when no candidate qualifies.
pub const NONE_AVAILABLE: &str = "None available";

/// What a workload needs from the node it lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Minimum accelerator time (hours) the node must still offer.
    #[serde(rename = "desAccTime")]
    pub desired_access_time: i64,
    /// Whether the node must (or must not) carry an accelerator.
    #[serde(rename = "gpuRequired")]
    pub gpu_required: bool,
}

/// A correlated (node, host) pair with usage and accelerator attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub node_name: String,
    pub host_name: String,
    /// Hours until the host's next maintenance window.
    pub available_accelerator_time: u32,
    pub has_accelerator: bool,
    pub memory_usage: i64,
    pub cpu_usage: i64,
}

/// The persisted placement outcome, stored as the request's status.
///
/// The default value is the undecided status: empty names and zeroed usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementDecision {
    #[serde(rename = "suitableNodeName")]
    pub suitable_node_name: String,
    #[serde(rename = "suitableHostName")]
    pub suitable_host_name: String,
    #[serde(rename = "nodeMemoryUsage")]
    pub node_memory_usage: i64,
    #[serde(rename = "nodeCPUUsage")]
    pub node_cpu_usage: i64,
    #[serde(rename = "availableAcceleratorTime")]
    pub available_accelerator_time: i64,
}

impl PlacementDecision {
    /// The "no candidate" decision.
    pub fn none_available() -> Self {
        Self {
            suitable_node_name: NONE_AVAILABLE.to_string(),
            suitable_host_name: NONE_AVAILABLE.to_string(),
            node_memory_usage: 0,
            node_cpu_usage: 0,
            available_accelerator_time: 0,
        }
    }

    /// A request is terminal once a node name has been recorded.
    pub fn is_decided(&self) -> bool {
        !self.suitable_node_name.is_empty()
    }

    pub fn is_none_available(&self) -> bool {
        self.suitable_node_name == NONE_AVAILABLE
    }
}

impl From<&Candidate> for PlacementDecision {
    fn from(c: &Candidate) -> Self {
        Self {
            suitable_node_name: c.node_name.clone(),
            suitable_host_name: c.host_name.clone(),
            node_memory_usage: c.memory_usage,
            node_cpu_usage: c.cpu_usage,
            available_accelerator_time: i64::from(c.available_accelerator_time),
        }
    }
}
