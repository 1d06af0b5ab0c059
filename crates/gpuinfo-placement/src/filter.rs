//! Hard-requirement filtering.

use gpuinfo_core::{Candidate, PlacementRequest};
use tracing::debug;

/// Whether a candidate satisfies the request.
///
/// Accelerator presence must match `gpu_required` exactly: a request that
/// does not need an accelerator rejects hosts that have one.
pub fn is_suitable(request: &PlacementRequest, candidate: &Candidate) -> bool {
    i64::from(candidate.available_accelerator_time) >= request.desired_access_time
        && candidate.has_accelerator == request.gpu_required
}

/// Keep the suitable candidates, in input order.
pub fn filter_candidates(request: &PlacementRequest, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let total = candidates.len();
    let matched: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let ok = is_suitable(request, c);
            if !ok {
                debug!(
                    node = %c.node_name,
                    available_hours = c.available_accelerator_time,
                    has_accelerator = c.has_accelerator,
                    "candidate rejected"
                );
            }
            ok
        })
        .collect();
    debug!(total, matched = matched.len(), "candidates filtered");
    matched
}
