//! gpuinfo-controller — reconciles placement requests.
//!
//! The `Reconciler` runs the placement pipeline at most once per request:
//! a request whose status already names a node is left alone, and a new
//! decision is written with an optimistic-concurrency check. The
//! `Controller` is the host loop that notices changed requests and runs
//! reconciliations on blocking workers.
//!
//! # Architecture
//!
//! ```text
//! Controller (resync tick, shutdown via watch channel)
//!   └── per changed request, on spawn_blocking
//!       └── Reconciler::reconcile(key)
//!           ├── StateStore      (read request + nodes, write status)
//!           ├── InventoryClient (VM and host container views)
//!           └── gpuinfo_placement::select_placement
//! ```
//!
//! Errors abort the reconciliation and are reported to the host loop,
//! which retries on a later tick. The reconciler never retries on its own.

pub mod controller;
pub mod error;
pub mod reconciler;

pub use controller::{Controller, SyncSummary};
pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{ReconcileOutcome, Reconciler};
