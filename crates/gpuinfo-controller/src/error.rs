//! Reconciliation error types.

use gpuinfo_inventory::InventoryError;
use gpuinfo_state::StateError;
use thiserror::Error;

/// Errors that abort a reconciliation. No status is written on any of them.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to read request {key}: {source}")]
    ReadRequest {
        key: String,
        #[source]
        source: StateError,
    },

    #[error("node listing unavailable: {0}")]
    NodeListUnavailable(#[source] StateError),

    #[error("no nodes found in cluster")]
    EmptyInventory,

    #[error("virtualization inventory unavailable: {0}")]
    InventoryUnavailable(#[from] InventoryError),

    #[error("failed to persist decision for {key}: {source}")]
    PersistFailure {
        key: String,
        #[source]
        source: StateError,
    },
}

impl ReconcileError {
    /// Whether an input needed for the decision could not be read.
    pub fn is_inventory_unavailable(&self) -> bool {
        matches!(
            self,
            ReconcileError::NodeListUnavailable(_) | ReconcileError::InventoryUnavailable(_)
        )
    }

    /// Whether the status write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReconcileError::PersistFailure {
                source: StateError::Conflict { .. },
                ..
            }
        )
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
