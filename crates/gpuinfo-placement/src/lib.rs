//! gpuinfo placement pipeline.
//!
//! Decides which cluster node best fits a single placement request. The
//! pipeline is pure: it takes already-retrieved node names and inventory
//! summaries and returns a decision. Fetching inputs and persisting the
//! decision belong to `gpuinfo-controller`.
//!
//! # Components
//!
//! - **`correlate`** — node → VM → host join over identity indexes
//! - **`attribute`** — usage figures plus accelerator attributes from an
//!   injectable [`AttributeSource`]
//! - **`filter`** — hard requirements (access time, exact GPU match)
//! - **`rank`** — zero / one / least-CPU selection
//! - **`select`** — the four stages composed

pub mod attribute;
pub mod correlate;
pub mod filter;
pub mod rank;
pub mod select;

pub use attribute::{
    AcceleratorAttributes, AttributePass, AttributeSource, FixedAttributeSource, Seed,
    SimulatedAttributeSource, attribute_candidates,
};
pub use correlate::{CorrelatedPair, InventoryIndex, correlate};
pub use filter::{filter_candidates, is_suitable};
pub use rank::{Ranking, rank_candidates};
pub use select::{PassReport, select_placement};
