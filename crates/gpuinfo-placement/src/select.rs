//! The full placement pass: correlate, attribute, filter, rank.

use gpuinfo_core::{PlacementDecision, PlacementRequest};
use gpuinfo_inventory::{HostSummary, VmSummary};
use tracing::info;

use crate::attribute::{AttributePass, attribute_candidates};
use crate::correlate::correlate;
use crate::filter::filter_candidates;
use crate::rank::{Ranking, rank_candidates};

/// What one placement pass saw and decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Candidates produced by correlation.
    pub correlated: usize,
    /// Candidates left after filtering.
    pub suitable: usize,
    pub ranking: Ranking,
}

impl PassReport {
    pub fn decision(&self) -> PlacementDecision {
        self.ranking.decision()
    }
}

/// Run one placement pass for `request` over already-retrieved inventory.
pub fn select_placement<S: AsRef<str>>(
    request: &PlacementRequest,
    nodes: &[S],
    vms: &[VmSummary],
    hosts: &[HostSummary],
    pass: &mut (dyn AttributePass + '_),
) -> PassReport {
    let pairs = correlate(nodes, vms, hosts);
    let correlated = pairs.len();

    let candidates = attribute_candidates(pairs, pass);
    let suitable = filter_candidates(request, candidates);
    let suitable_count = suitable.len();

    let ranking = rank_candidates(suitable);
    match &ranking {
        Ranking::NoCandidate => info!(correlated, "found no suitable candidates"),
        Ranking::Single(winner) => info!(
            correlated,
            node = %winner.node_name,
            host = %winner.host_name,
            "found exactly one suitable candidate"
        ),
        Ranking::LeastCpu { winner, considered } => info!(
            correlated,
            suitable = considered,
            node = %winner.node_name,
            host = %winner.host_name,
            cpu = winner.cpu_usage,
            "picked least-loaded of several suitable candidates"
        ),
    }

    PassReport {
        correlated,
        suitable: suitable_count,
        ranking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AcceleratorAttributes, AttributeSource, FixedAttributeSource};
    use gpuinfo_inventory::{ManagedObjectRef, VmQuickStats};

    fn vm(name: &str, host: &str, cpu: i32) -> VmSummary {
        VmSummary {
            name: name.to_string(),
            host: Some(ManagedObjectRef::host(host)),
            quick_stats: VmQuickStats {
                overall_cpu_demand: cpu,
                guest_memory_usage: 1024,
            },
        }
    }

    fn host(name: &str, id: &str) -> HostSummary {
        HostSummary {
            name: name.to_string(),
            host: ManagedObjectRef::host(id),
        }
    }

    fn no_gpu() -> FixedAttributeSource {
        FixedAttributeSource::new(AcceleratorAttributes {
            available_hours: 0,
            has_accelerator: false,
        })
    }

    #[test]
    fn picks_single_match_among_three() {
        let vms = vec![
            vm("nodeA", "h-a", 50),
            vm("nodeB", "h-b", 30),
            vm("nodeC", "h-c", 10),
        ];
        let hosts = vec![host("esxi-a", "h-a"), host("esxi-b", "h-b"), host("esxi-c", "h-c")];
        let source = no_gpu()
            .with_node("nodeA", 320, true)
            .with_node("nodeB", 380, true)
            .with_node("nodeC", 390, false);
        let request = PlacementRequest {
            desired_access_time: 350,
            gpu_required: true,
        };

        let report = select_placement(
            &request,
            &["nodeA", "nodeB", "nodeC"],
            &vms,
            &hosts,
            source.open_pass().as_mut(),
        );

        assert_eq!(report.correlated, 3);
        assert_eq!(report.suitable, 1);
        let decision = report.decision();
        assert_eq!(decision.suitable_node_name, "nodeB");
        assert_eq!(decision.suitable_host_name, "esxi-b");
        assert_eq!(decision.node_cpu_usage, 30);
        assert_eq!(decision.node_memory_usage, 1024);
        assert_eq!(decision.available_accelerator_time, 380);
    }

    #[test]
    fn uncorrelated_nodes_yield_none_available() {
        let request = PlacementRequest {
            desired_access_time: 0,
            gpu_required: false,
        };
        let report = select_placement(
            &request,
            &["orphan"],
            &[vm("other", "h-1", 5)],
            &[host("esxi-1", "h-1")],
            no_gpu().open_pass().as_mut(),
        );

        assert_eq!(report.correlated, 0);
        assert_eq!(report.ranking, Ranking::NoCandidate);
        assert_eq!(report.decision(), PlacementDecision::none_available());
    }
}
