//! Inventory error types.

use thiserror::Error;

use crate::types::{ViewId, ViewKind};

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors reported by an inventory service.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to create {kind} container view: {reason}")]
    CreateView { kind: ViewKind, reason: String },

    #[error("failed to retrieve {kind} summaries: {reason}")]
    Retrieve { kind: ViewKind, reason: String },

    #[error("failed to destroy view {view}: {reason}")]
    DestroyView { view: ViewId, reason: String },

    #[error("unknown container view: {0}")]
    UnknownView(ViewId),

    #[error("view {view} holds {actual} objects, not {expected}")]
    WrongKind {
        view: ViewId,
        expected: ViewKind,
        actual: ViewKind,
    },

    #[error("failed to load inventory snapshot: {0}")]
    Load(String),
}
