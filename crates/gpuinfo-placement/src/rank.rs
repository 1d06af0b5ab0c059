//! Winner selection among suitable candidates.

use gpuinfo_core::{Candidate, PlacementDecision};
use tracing::debug;

/// Outcome of ranking the suitable candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ranking {
    /// Nothing qualified.
    NoCandidate,
    /// Exactly one candidate qualified.
    Single(Candidate),
    /// Several qualified; the one with the lowest CPU usage won.
    LeastCpu { winner: Candidate, considered: usize },
}

impl Ranking {
    pub fn winner(&self) -> Option<&Candidate> {
        match self {
            Ranking::NoCandidate => None,
            Ranking::Single(c) => Some(c),
            Ranking::LeastCpu { winner, .. } => Some(winner),
        }
    }

    /// The status to persist for this outcome.
    pub fn decision(&self) -> PlacementDecision {
        self.winner()
            .map_or_else(PlacementDecision::none_available, PlacementDecision::from)
    }
}

/// Pick the winner among suitable candidates.
///
/// With several candidates, the first one with the strictly lowest CPU
/// usage wins; later candidates with equal usage never displace it, so
/// ties go to the earliest in input order.
pub fn rank_candidates(suitable: Vec<Candidate>) -> Ranking {
    let considered = suitable.len();
    if considered <= 1 {
        return suitable
            .into_iter()
            .next()
            .map_or(Ranking::NoCandidate, Ranking::Single);
    }

    let mut best: Option<Candidate> = None;
    for candidate in suitable {
        if let Some(current) = &best
            && candidate.cpu_usage >= current.cpu_usage
        {
            debug!(
                node = %candidate.node_name,
                cpu = candidate.cpu_usage,
                leader = %current.node_name,
                "not the winning candidate"
            );
            continue;
        }
        best = Some(candidate);
    }

    match best {
        Some(winner) => Ranking::LeastCpu { winner, considered },
        None => Ranking::NoCandidate,
    }
}
