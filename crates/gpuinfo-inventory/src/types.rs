//! Inventory object types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side handle of a container view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Object type a container view collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    VirtualMachine,
    HostSystem,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::VirtualMachine => f.write_str("VirtualMachine"),
            ViewKind::HostSystem => f.write_str("HostSystem"),
        }
    }
}

/// Identity of an inventory object, e.g. `HostSystem:host-21`.
///
/// Two references denote the same object iff both type and value match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn host(value: &str) -> Self {
        Self {
            kind: "HostSystem".to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Live usage figures of a VM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmQuickStats {
    /// CPU demand in MHz.
    pub overall_cpu_demand: i32,
    /// Guest memory in active use, in MB.
    pub guest_memory_usage: i32,
}

/// Summary of a virtual machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSummary {
    /// Configured VM name; matches the cluster node name for node VMs.
    pub name: String,
    /// Host the VM currently runs on. Absent for VMs that are not running.
    #[serde(default)]
    pub host: Option<ManagedObjectRef>,
    #[serde(default)]
    pub quick_stats: VmQuickStats,
}

/// Summary of a hypervisor host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    /// Configured host name.
    pub name: String,
    /// The host's own identity.
    pub host: ManagedObjectRef,
}

/// Point-in-time view of the whole inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySnapshot {
    pub vms: Vec<VmSummary>,
    pub hosts: Vec<HostSummary>,
}
