//! Node → VM → host correlation.
//!
//! A cluster node is backed by the VM whose configured name equals the
//! node name; that VM runs on the host whose identity equals the VM's
//! runtime host reference. Both lookups go through hash indexes built
//! once per pass.

use std::collections::HashMap;

use gpuinfo_inventory::{HostSummary, ManagedObjectRef, VmQuickStats, VmSummary};
use tracing::debug;

/// A node matched to the host its VM runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedPair {
    pub node_name: String,
    pub host_name: String,
    /// Live usage of the node's VM.
    pub usage: VmQuickStats,
}

/// Identity indexes over one inventory retrieval.
///
/// Each bucket keeps inventory order, so lookups yield matches in the same
/// order a scan of the inventory lists would.
pub struct InventoryIndex<'a> {
    vms_by_name: HashMap<&'a str, Vec<&'a VmSummary>>,
    hosts_by_ref: HashMap<&'a ManagedObjectRef, Vec<&'a HostSummary>>,
}

impl<'a> InventoryIndex<'a> {
    pub fn build(vms: &'a [VmSummary], hosts: &'a [HostSummary]) -> Self {
        let mut vms_by_name: HashMap<&str, Vec<&VmSummary>> = HashMap::new();
        for vm in vms {
            vms_by_name.entry(vm.name.as_str()).or_default().push(vm);
        }
        let mut hosts_by_ref: HashMap<&ManagedObjectRef, Vec<&HostSummary>> = HashMap::new();
        for host in hosts {
            hosts_by_ref.entry(&host.host).or_default().push(host);
        }
        Self {
            vms_by_name,
            hosts_by_ref,
        }
    }

    /// Every (VM, host) pair backing the named node.
    pub fn pairs_for<'s>(
        &'s self,
        node_name: &str,
    ) -> impl Iterator<Item = (&'a VmSummary, &'a HostSummary)> + 's {
        self.vms_by_name
            .get(node_name)
            .into_iter()
            .flatten()
            .flat_map(move |&vm| {
                vm.host
                    .as_ref()
                    .and_then(|host_ref| self.hosts_by_ref.get(host_ref))
                    .into_iter()
                    .flatten()
                    .map(move |&host| (vm, host))
            })
    }
}

/// Correlate nodes to hosts.
///
/// Nodes without a matching VM, and VMs whose host reference matches no
/// host, contribute nothing. Duplicate matches are all kept.
pub fn correlate<S: AsRef<str>>(
    nodes: &[S],
    vms: &[VmSummary],
    hosts: &[HostSummary],
) -> Vec<CorrelatedPair> {
    let index = InventoryIndex::build(vms, hosts);
    let mut pairs = Vec::new();

    for node in nodes {
        let node = node.as_ref();
        let before = pairs.len();
        for (vm, host) in index.pairs_for(node) {
            pairs.push(CorrelatedPair {
                node_name: vm.name.clone(),
                host_name: host.name.clone(),
                usage: vm.quick_stats,
            });
        }
        if pairs.len() == before {
            debug!(node, "node has no correlated host");
        }
    }

    pairs
}
