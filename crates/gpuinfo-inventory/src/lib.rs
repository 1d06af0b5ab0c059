//! gpuinfo-inventory — the virtualization inventory the controller reads.
//!
//! The inventory service reports which host each VM runs on and the VM's
//! live usage. It is consumed through the blocking [`InventoryClient`]
//! trait: summaries are retrieved through server-side container views
//! that must be destroyed after use.
//!
//! # Components
//!
//! - **`client`** — `InventoryClient` trait and the `ContainerView` guard
//!   that destroys its view on drop
//! - **`memory`** — `InMemoryInventory`, loaded from a snapshot file or
//!   built in tests, with fault injection and call accounting
//! - **`types`** — managed-object references and VM/host summaries

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{ContainerView, InventoryClient};
pub use error::{InventoryError, InventoryResult};
pub use memory::{CallCounts, FailPoint, InMemoryInventory};
pub use types::*;
