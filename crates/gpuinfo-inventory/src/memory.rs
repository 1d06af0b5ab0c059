//! In-memory inventory backed by an [`InventorySnapshot`].
//!
//! Used by `gpuinfod` (snapshot loaded from a TOML file) and by tests,
//! which can inject failures at specific calls and inspect how many views
//! are still open.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::client::InventoryClient;
use crate::error::{InventoryError, InventoryResult};
use crate::types::*;

/// A call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateView(ViewKind),
    Retrieve(ViewKind),
    DestroyView,
}

/// Number of calls served, by operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub created: u64,
    pub retrieved: u64,
    pub destroyed: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.created + self.retrieved + self.destroyed
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: InventorySnapshot,
    views: HashMap<ViewId, ViewKind>,
    next_view: u64,
    faults: HashSet<FailPoint>,
    calls: CallCounts,
}

/// Thread-safe inventory serving a fixed snapshot.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    inner: Mutex<Inner>,
}

impl InMemoryInventory {
    pub fn new(snapshot: InventorySnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot,
                ..Inner::default()
            }),
        }
    }

    /// Load a snapshot from a TOML file.
    pub fn load(path: &Path) -> InventoryResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Load(format!("{}: {e}", path.display())))?;
        let snapshot: InventorySnapshot = toml::from_str(&content)
            .map_err(|e| InventoryError::Load(format!("{}: {e}", path.display())))?;
        debug!(
            ?path,
            vms = snapshot.vms.len(),
            hosts = snapshot.hosts.len(),
            "inventory snapshot loaded"
        );
        Ok(Self::new(snapshot))
    }

    /// Replace the served snapshot. Open views are kept.
    pub fn replace(&self, snapshot: InventorySnapshot) {
        self.inner().snapshot = snapshot;
    }

    /// Make every subsequent call at `point` fail.
    pub fn fail_on(&self, point: FailPoint) {
        self.inner().faults.insert(point);
    }

    pub fn clear_faults(&self) {
        self.inner().faults.clear();
    }

    /// Views created and not yet destroyed.
    pub fn open_views(&self) -> usize {
        self.inner().views.len()
    }

    pub fn calls(&self) -> CallCounts {
        self.inner().calls
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn view_kind(&self, view: ViewId, expected: ViewKind) -> InventoryResult<()> {
        match self.views.get(&view) {
            None => Err(InventoryError::UnknownView(view)),
            Some(&actual) if actual != expected => Err(InventoryError::WrongKind {
                view,
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    fn check_retrieve(&mut self, view: ViewId, kind: ViewKind) -> InventoryResult<()> {
        self.view_kind(view, kind)?;
        if self.faults.contains(&FailPoint::Retrieve(kind)) {
            return Err(InventoryError::Retrieve {
                kind,
                reason: "injected failure".to_string(),
            });
        }
        self.calls.retrieved += 1;
        Ok(())
    }
}

impl InventoryClient for InMemoryInventory {
    fn create_container_view(&self, kind: ViewKind) -> InventoryResult<ViewId> {
        let mut inner = self.inner();
        if inner.faults.contains(&FailPoint::CreateView(kind)) {
            return Err(InventoryError::CreateView {
                kind,
                reason: "injected failure".to_string(),
            });
        }
        inner.next_view += 1;
        let id = ViewId(inner.next_view);
        inner.views.insert(id, kind);
        inner.calls.created += 1;
        Ok(id)
    }

    fn retrieve_vms(&self, view: ViewId) -> InventoryResult<Vec<VmSummary>> {
        let mut inner = self.inner();
        inner.check_retrieve(view, ViewKind::VirtualMachine)?;
        Ok(inner.snapshot.vms.clone())
    }

    fn retrieve_hosts(&self, view: ViewId) -> InventoryResult<Vec<HostSummary>> {
        let mut inner = self.inner();
        inner.check_retrieve(view, ViewKind::HostSystem)?;
        Ok(inner.snapshot.hosts.clone())
    }

    fn destroy_view(&self, view: ViewId) -> InventoryResult<()> {
        let mut inner = self.inner();
        if inner.faults.contains(&FailPoint::DestroyView) {
            return Err(InventoryError::DestroyView {
                view,
                reason: "injected failure".to_string(),
            });
        }
        if inner.views.remove(&view).is_none() {
            return Err(InventoryError::UnknownView(view));
        }
        inner.calls.destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
[[vms]]
name = "worker-1"
host = { type = "HostSystem", value = "host-21" }
quick_stats = { overall_cpu_demand = 50, guest_memory_usage = 2048 }

[[vms]]
name = "powered-off"

[[hosts]]
name = "esxi-01.lab"
host = { type = "HostSystem", value = "host-21" }
"#;

    #[test]
    fn load_snapshot_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.toml");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let inv = InMemoryInventory::load(&path).unwrap();
        let view = inv.create_container_view(ViewKind::VirtualMachine).unwrap();
        let vms = inv.retrieve_vms(view).unwrap();

        assert_eq!(vms.len(), 2);
        assert_eq!(vms[0].host, Some(ManagedObjectRef::host("host-21")));
        assert_eq!(vms[0].quick_stats.overall_cpu_demand, 50);
        assert_eq!(vms[1].host, None);
        assert_eq!(vms[1].quick_stats, VmQuickStats::default());
    }

    #[test]
    fn load_missing_file_fails() {
        let err = InMemoryInventory::load(Path::new("/nonexistent/inventory.toml")).unwrap_err();
        assert!(matches!(err, InventoryError::Load(_)));
    }

    #[test]
    fn retrieve_through_unknown_view_fails() {
        let inv = InMemoryInventory::default();
        let err = inv.retrieve_hosts(ViewId(7)).unwrap_err();
        assert!(matches!(err, InventoryError::UnknownView(ViewId(7))));
    }

    #[test]
    fn create_view_fault_is_reported() {
        let inv = InMemoryInventory::default();
        inv.fail_on(FailPoint::CreateView(ViewKind::HostSystem));

        assert!(inv.create_container_view(ViewKind::VirtualMachine).is_ok());
        assert!(matches!(
            inv.create_container_view(ViewKind::HostSystem),
            Err(InventoryError::CreateView { .. })
        ));

        inv.clear_faults();
        assert!(inv.create_container_view(ViewKind::HostSystem).is_ok());
    }

    #[test]
    fn calls_are_counted() {
        let inv = InMemoryInventory::default();
        let view = inv.create_container_view(ViewKind::HostSystem).unwrap();
        inv.retrieve_hosts(view).unwrap();
        inv.destroy_view(view).unwrap();

        assert_eq!(
            inv.calls(),
            CallCounts {
                created: 1,
                retrieved: 1,
                destroyed: 1
            }
        );
        assert!(matches!(
            inv.destroy_view(view),
            Err(InventoryError::UnknownView(_))
        ));
    }

    #[test]
    fn replace_swaps_served_snapshot() {
        let inv = InMemoryInventory::default();
        inv.replace(InventorySnapshot {
            vms: Vec::new(),
            hosts: vec![HostSummary {
                name: "esxi-02".to_string(),
                host: ManagedObjectRef::host("host-2"),
            }],
        });
        let view = inv.create_container_view(ViewKind::HostSystem).unwrap();
        assert_eq!(inv.retrieve_hosts(view).unwrap()[0].name, "esxi-02");
    }
}
