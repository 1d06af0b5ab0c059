//! Inventory client contract and the container-view guard.

use tracing::{debug, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::types::{HostSummary, ViewId, ViewKind, VmSummary};

/// Blocking access to a virtualization inventory service.
///
/// Summaries are read through container views. Every view created with
/// `create_container_view` holds server-side resources until
/// `destroy_view` is called; use [`ContainerView`] rather than calling
/// these directly.
pub trait InventoryClient: Send + Sync {
    /// Create a view over every object of `kind` in the inventory.
    fn create_container_view(&self, kind: ViewKind) -> InventoryResult<ViewId>;

    /// Retrieve the summaries of all VMs in a `VirtualMachine` view.
    fn retrieve_vms(&self, view: ViewId) -> InventoryResult<Vec<VmSummary>>;

    /// Retrieve the summaries of all hosts in a `HostSystem` view.
    fn retrieve_hosts(&self, view: ViewId) -> InventoryResult<Vec<HostSummary>>;

    /// Release a view.
    fn destroy_view(&self, view: ViewId) -> InventoryResult<()>;
}

/// A container view that is destroyed when dropped.
///
/// Dropping happens on every exit path of the caller, including `?`
/// returns. A failed destroy is logged and otherwise ignored.
pub struct ContainerView<'a> {
    client: &'a dyn InventoryClient,
    id: ViewId,
    kind: ViewKind,
}

impl<'a> ContainerView<'a> {
    /// Create a view over every object of `kind`.
    pub fn open(client: &'a dyn InventoryClient, kind: ViewKind) -> InventoryResult<Self> {
        let id = client.create_container_view(kind)?;
        debug!(view = %id, %kind, "container view created");
        Ok(Self { client, id, kind })
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Retrieve VM summaries. Fails unless this is a `VirtualMachine` view.
    pub fn vms(&self) -> InventoryResult<Vec<VmSummary>> {
        self.expect_kind(ViewKind::VirtualMachine)?;
        self.client.retrieve_vms(self.id)
    }

    /// Retrieve host summaries. Fails unless this is a `HostSystem` view.
    pub fn hosts(&self) -> InventoryResult<Vec<HostSummary>> {
        self.expect_kind(ViewKind::HostSystem)?;
        self.client.retrieve_hosts(self.id)
    }

    fn expect_kind(&self, expected: ViewKind) -> InventoryResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(InventoryError::WrongKind {
                view: self.id,
                expected,
                actual: self.kind,
            })
        }
    }
}

impl Drop for ContainerView<'_> {
    fn drop(&mut self) {
        match self.client.destroy_view(self.id) {
            Ok(()) => debug!(view = %self.id, kind = %self.kind, "container view destroyed"),
            Err(e) => warn!(view = %self.id, kind = %self.kind, error = %e, "failed to destroy container view"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailPoint, InMemoryInventory};
    use crate::types::{InventorySnapshot, ManagedObjectRef};

    fn inventory() -> InMemoryInventory {
        InMemoryInventory::new(InventorySnapshot {
            vms: vec![VmSummary {
                name: "worker-1".to_string(),
                host: Some(ManagedObjectRef::host("host-1")),
                quick_stats: Default::default(),
            }],
            hosts: vec![HostSummary {
                name: "esxi-01".to_string(),
                host: ManagedObjectRef::host("host-1"),
            }],
        })
    }

    #[test]
    fn view_is_destroyed_on_drop() {
        let inv = inventory();
        {
            let view = ContainerView::open(&inv, ViewKind::VirtualMachine).unwrap();
            assert_eq!(view.vms().unwrap().len(), 1);
            assert_eq!(inv.open_views(), 1);
        }
        assert_eq!(inv.open_views(), 0);
        assert_eq!(inv.calls().destroyed, 1);
    }

    #[test]
    fn view_is_destroyed_after_retrieve_error() {
        let inv = inventory();
        inv.fail_on(FailPoint::Retrieve(ViewKind::HostSystem));

        let result = (|| {
            let view = ContainerView::open(&inv, ViewKind::HostSystem)?;
            view.hosts()
        })();

        assert!(matches!(result, Err(InventoryError::Retrieve { .. })));
        assert_eq!(inv.open_views(), 0);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let inv = inventory();
        let view = ContainerView::open(&inv, ViewKind::HostSystem).unwrap();

        let err = view.vms().unwrap_err();
        assert!(matches!(
            err,
            InventoryError::WrongKind {
                expected: ViewKind::VirtualMachine,
                actual: ViewKind::HostSystem,
                ..
            }
        ));
    }

    #[test]
    fn destroy_failure_does_not_panic() {
        let inv = inventory();
        inv.fail_on(FailPoint::DestroyView);
        {
            let _view = ContainerView::open(&inv, ViewKind::HostSystem).unwrap();
        }
        // The server kept the view; the guard only logged.
        assert_eq!(inv.open_views(), 1);
    }
}
