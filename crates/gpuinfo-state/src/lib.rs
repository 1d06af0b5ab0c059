//! gpuinfo-state — object store for the placement controller.
//!
//! Backed by [redb](https://docs.rs/redb), holds the two kinds of control
//! plane objects the controller reads: placement requests (`GpuInfo`, spec
//! plus status) and cluster nodes.
//!
//! # Concurrency
//!
//! Every request write bumps its `resource_version`. Status writes name the
//! version they were computed from and fail with [`StateError::Conflict`]
//! when the stored object has moved on; the store never merges.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across blocking workers.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
