//! Single-shot reconciliation of one placement request.
//!
//! A request is decided at most once. Once its status names a node (or the
//! "none available" marker), later reconciliations return without touching
//! the inventory, so the status write that ends a reconciliation and any
//! unrelated update to the object never trigger a second placement pass.

use std::sync::Arc;

use gpuinfo_core::PlacementDecision;
use gpuinfo_inventory::{ContainerView, InventoryClient, ViewKind};
use gpuinfo_placement::{AttributeSource, PassReport, select_placement};
use gpuinfo_state::{GpuInfo, StateError, StateStore};
use tracing::{debug, info, warn};

use crate::error::{ReconcileError, ReconcileResult};

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The request no longer exists.
    Gone,
    /// A decision was already recorded; nothing was done.
    AlreadyDecided,
    /// A decision was computed and written at `version`.
    Decided {
        decision: PlacementDecision,
        version: u64,
    },
}

/// Decides placement for requests stored in a [`StateStore`].
pub struct Reconciler {
    store: StateStore,
    inventory: Arc<dyn InventoryClient>,
    attributes: Arc<dyn AttributeSource>,
}

impl Reconciler {
    pub fn new(
        store: StateStore,
        inventory: Arc<dyn InventoryClient>,
        attributes: Arc<dyn AttributeSource>,
    ) -> Self {
        Self {
            store,
            inventory,
            attributes,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Reconcile the request stored under `key` (`namespace/name`).
    ///
    /// Blocking: reads the store, queries the inventory and writes the
    /// status. Any error leaves the stored status untouched.
    pub fn reconcile(&self, key: &str) -> ReconcileResult<ReconcileOutcome> {
        let request = match self.store.get_request(key) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(request = %key, "request not found, ignoring");
                return Ok(ReconcileOutcome::Gone);
            }
            Err(source) => {
                return Err(ReconcileError::ReadRequest {
                    key: key.to_string(),
                    source,
                });
            }
        };

        if request.status.is_decided() {
            debug!(
                request = %key,
                node = %request.status.suitable_node_name,
                "decision already recorded, skipping"
            );
            return Ok(ReconcileOutcome::AlreadyDecided);
        }

        info!(
            request = %key,
            desired_hours = request.spec.desired_access_time,
            gpu_required = request.spec.gpu_required,
            "reconciling placement request"
        );

        let report = self.place(&request)?;
        let decision = report.decision();

        match self
            .store
            .update_status(key, request.resource_version, &decision)
        {
            Ok(version) => {
                info!(
                    request = %key,
                    node = %decision.suitable_node_name,
                    host = %decision.suitable_host_name,
                    version,
                    "placement decision recorded"
                );
                Ok(ReconcileOutcome::Decided { decision, version })
            }
            Err(StateError::NotFound(_)) => {
                debug!(request = %key, "request deleted before the decision was written");
                Ok(ReconcileOutcome::Gone)
            }
            Err(source) => {
                warn!(request = %key, error = %source, "failed to record placement decision");
                Err(ReconcileError::PersistFailure {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Gather nodes and inventory, then run one placement pass.
    ///
    /// Both container views are released when this returns, on every path.
    fn place(&self, request: &GpuInfo) -> ReconcileResult<PassReport> {
        let nodes = self
            .store
            .list_nodes()
            .map_err(ReconcileError::NodeListUnavailable)?;
        if nodes.is_empty() {
            return Err(ReconcileError::EmptyInventory);
        }
        debug!(nodes = nodes.len(), "found nodes in cluster");
        let node_names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();

        let inventory = self.inventory.as_ref();
        let vm_view = ContainerView::open(inventory, ViewKind::VirtualMachine)?;
        let vms = vm_view.vms()?;
        let host_view = ContainerView::open(inventory, ViewKind::HostSystem)?;
        let hosts = host_view.hosts()?;
        debug!(vms = vms.len(), hosts = hosts.len(), "inventory retrieved");

        let mut pass = self.attributes.open_pass();
        Ok(select_placement(
            &request.spec,
            &node_names,
            &vms,
            &hosts,
            pass.as_mut(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuinfo_core::PlacementRequest;
    use gpuinfo_inventory::{
        FailPoint, HostSummary, InMemoryInventory, InventorySnapshot, ManagedObjectRef,
        VmQuickStats, VmSummary,
    };
    use gpuinfo_placement::{AcceleratorAttributes, FixedAttributeSource};
    use gpuinfo_state::NodeInfo;

    struct Fixture {
        store: StateStore,
        inventory: Arc<InMemoryInventory>,
        reconciler: Reconciler,
    }

    fn fixture() -> Fixture {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&NodeInfo::new("worker-1")).unwrap();
        let inventory = Arc::new(InMemoryInventory::new(InventorySnapshot {
            vms: vec![VmSummary {
                name: "worker-1".to_string(),
                host: Some(ManagedObjectRef::host("host-1")),
                quick_stats: VmQuickStats {
                    overall_cpu_demand: 25,
                    guest_memory_usage: 2048,
                },
            }],
            hosts: vec![HostSummary {
                name: "esxi-01".to_string(),
                host: ManagedObjectRef::host("host-1"),
            }],
        }));
        let attributes = FixedAttributeSource::new(AcceleratorAttributes {
            available_hours: 360,
            has_accelerator: true,
        });
        let reconciler = Reconciler::new(store.clone(), inventory.clone(), Arc::new(attributes));
        Fixture {
            store,
            inventory,
            reconciler,
        }
    }

    fn submit(store: &StateStore) -> String {
        let request = GpuInfo::new(
            "default",
            "job",
            PlacementRequest {
                desired_access_time: 300,
                gpu_required: true,
            },
        );
        store.put_request(&request).unwrap();
        request.table_key()
    }

    #[test]
    fn decides_and_records() {
        let f = fixture();
        let key = submit(&f.store);

        let outcome = f.reconciler.reconcile(&key).unwrap();

        let ReconcileOutcome::Decided { decision, version } = outcome else {
            panic!("expected a recorded decision");
        };
        assert_eq!(decision.suitable_node_name, "worker-1");
        assert_eq!(decision.suitable_host_name, "esxi-01");
        assert_eq!(version, 2);

        let stored = f.store.get_request(&key).unwrap().unwrap();
        assert_eq!(stored.status, decision);
        assert_eq!(f.inventory.open_views(), 0);
    }

    #[test]
    fn missing_request_is_gone() {
        let f = fixture();
        assert_eq!(
            f.reconciler.reconcile("default/nope").unwrap(),
            ReconcileOutcome::Gone
        );
        assert_eq!(f.inventory.calls().total(), 0);
    }

    #[test]
    fn host_view_failure_releases_vm_view() {
        let f = fixture();
        let key = submit(&f.store);
        f.inventory
            .fail_on(FailPoint::CreateView(ViewKind::HostSystem));

        let err = f.reconciler.reconcile(&key).unwrap_err();

        assert!(err.is_inventory_unavailable());
        assert_eq!(f.inventory.open_views(), 0);
        let stored = f.store.get_request(&key).unwrap().unwrap();
        assert!(!stored.status.is_decided());
    }
}
