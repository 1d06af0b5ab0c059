//! Host loop: finds changed requests and reconciles them.
//!
//! Each tick lists the stored requests and hands every request whose
//! `resource_version` differs from the last one reconciled successfully to
//! a blocking worker. At most `max_concurrent` reconciliations run at once.
//! A failed reconciliation is not marked as seen, so it is tried again on
//! the next tick.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::ReconcileResult;
use crate::reconciler::{ReconcileOutcome, Reconciler};

/// Counts from one resync tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Requests handed to a worker.
    pub triggered: usize,
    pub decided: usize,
    pub already_decided: usize,
    pub gone: usize,
    pub failed: usize,
}

pub struct Controller {
    reconciler: Arc<Reconciler>,
    workers: Arc<Semaphore>,
    /// Key → version last reconciled without error.
    seen: HashMap<String, u64>,
}

impl Controller {
    pub fn new(reconciler: Reconciler, max_concurrent: usize) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            workers: Arc::new(Semaphore::new(max_concurrent.max(1))),
            seen: HashMap::new(),
        }
    }

    /// Reconcile every request that changed since the last tick.
    pub async fn sync_once(&mut self) -> anyhow::Result<SyncSummary> {
        let requests = self.reconciler.store().list_requests()?;

        let live: HashSet<String> = requests.iter().map(|r| r.table_key()).collect();
        self.seen.retain(|key, _| live.contains(key));

        let mut summary = SyncSummary::default();
        let mut tasks: JoinSet<(String, u64, ReconcileResult<ReconcileOutcome>)> = JoinSet::new();

        for request in requests {
            let key = request.table_key();
            let version = request.resource_version;
            if self.seen.get(&key) == Some(&version) {
                continue;
            }

            let permit = self.workers.clone().acquire_owned().await?;
            let reconciler = self.reconciler.clone();
            debug!(request = %key, version, "request changed, reconciling");
            summary.triggered += 1;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = reconciler.reconcile(&key);
                (key, version, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (key, version, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!(error = %e, "reconcile worker panicked");
                    summary.failed += 1;
                    continue;
                }
            };
            match result {
                Ok(outcome) => {
                    match outcome {
                        ReconcileOutcome::Decided { .. } => summary.decided += 1,
                        ReconcileOutcome::AlreadyDecided => summary.already_decided += 1,
                        ReconcileOutcome::Gone => summary.gone += 1,
                    }
                    self.seen.insert(key, version);
                }
                Err(e) => {
                    error!(request = %key, error = %e, "reconcile failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Resync every `interval` until `shutdown` changes.
    pub async fn run(&mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = interval.as_millis() as u64, "controller started");

        loop {
            match self.sync_once().await {
                Ok(summary) if summary.triggered > 0 => info!(
                    triggered = summary.triggered,
                    decided = summary.decided,
                    failed = summary.failed,
                    "resync complete"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "resync failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("controller shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpuinfo_core::PlacementRequest;
    use gpuinfo_inventory::{
        FailPoint, HostSummary, InMemoryInventory, InventorySnapshot, ManagedObjectRef,
        ViewKind, VmQuickStats, VmSummary,
    };
    use gpuinfo_placement::{AcceleratorAttributes, FixedAttributeSource};
    use gpuinfo_state::{GpuInfo, NodeInfo, StateStore};

    fn setup() -> (StateStore, Arc<InMemoryInventory>, Controller) {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&NodeInfo::new("worker-1")).unwrap();
        let inventory = Arc::new(InMemoryInventory::new(InventorySnapshot {
            vms: vec![VmSummary {
                name: "worker-1".to_string(),
                host: Some(ManagedObjectRef::host("host-1")),
                quick_stats: VmQuickStats::default(),
            }],
            hosts: vec![HostSummary {
                name: "esxi-01".to_string(),
                host: ManagedObjectRef::host("host-1"),
            }],
        }));
        let attributes = Arc::new(FixedAttributeSource::new(AcceleratorAttributes {
            available_hours: 380,
            has_accelerator: false,
        }));
        let reconciler = Reconciler::new(store.clone(), inventory.clone(), attributes);
        (store, inventory, Controller::new(reconciler, 2))
    }

    fn request(name: &str) -> GpuInfo {
        GpuInfo::new(
            "default",
            name,
            PlacementRequest {
                desired_access_time: 100,
                gpu_required: false,
            },
        )
    }

    #[tokio::test]
    async fn decides_then_settles() {
        let (store, _inventory, mut controller) = setup();
        store.put_request(&request("a")).unwrap();
        store.put_request(&request("b")).unwrap();

        let first = controller.sync_once().await.unwrap();
        assert_eq!(first.triggered, 2);
        assert_eq!(first.decided, 2);

        // The status writes bumped both versions; the follow-up pass is a no-op.
        let second = controller.sync_once().await.unwrap();
        assert_eq!(second.triggered, 2);
        assert_eq!(second.already_decided, 2);

        let third = controller.sync_once().await.unwrap();
        assert_eq!(third, SyncSummary::default());
    }

    #[tokio::test]
    async fn failed_reconcile_is_retried() {
        let (store, inventory, mut controller) = setup();
        store.put_request(&request("a")).unwrap();
        inventory.fail_on(FailPoint::Retrieve(ViewKind::VirtualMachine));

        let first = controller.sync_once().await.unwrap();
        assert_eq!(first.failed, 1);

        inventory.clear_faults();
        let second = controller.sync_once().await.unwrap();
        assert_eq!(second.decided, 1);
        assert_eq!(inventory.open_views(), 0);
    }

    #[tokio::test]
    async fn deleted_requests_are_forgotten() {
        let (store, _inventory, mut controller) = setup();
        let req = request("a");
        store.put_request(&req).unwrap();
        controller.sync_once().await.unwrap();
        controller.sync_once().await.unwrap();

        store.delete_request(&req.table_key()).unwrap();
        controller.sync_once().await.unwrap();
        assert!(controller.seen.is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (store, _inventory, mut controller) = setup();
        let req = request("a");
        store.put_request(&req).unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            controller.run(Duration::from_millis(10), rx).await;
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let stored = store.get_request(&req.table_key()).unwrap().unwrap();
        assert_eq!(stored.status.suitable_node_name, "worker-1");
    }
}
