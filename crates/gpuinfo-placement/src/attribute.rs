//! Candidate attribution.
//!
//! Usage figures come straight from the VM's live statistics. The two
//! accelerator attributes (hours until the host's next maintenance window,
//! and whether the host carries an accelerator) come from an
//! [`AttributeSource`]. No real feed exists yet, so the default source is
//! [`SimulatedAttributeSource`].

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use gpuinfo_core::Candidate;
use gpuinfo_core::config::SimulationConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::correlate::CorrelatedPair;

/// Accelerator attributes of one (node, host) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratorAttributes {
    /// Hours until the host's next maintenance window.
    pub available_hours: u32,
    pub has_accelerator: bool,
}

/// Capability feed for accelerator attributes.
///
/// A source opens one [`AttributePass`] per reconciliation, so any
/// per-pass state (such as a random generator) is never shared between
/// concurrent reconciliations.
pub trait AttributeSource: Send + Sync {
    fn open_pass(&self) -> Box<dyn AttributePass + '_>;
}

/// Attribute lookups for a single reconciliation pass.
pub trait AttributePass {
    fn attributes(&mut self, node_name: &str, host_name: &str) -> AcceleratorAttributes;
}

/// Attach usage and accelerator attributes to correlated pairs.
pub fn attribute_candidates(
    pairs: Vec<CorrelatedPair>,
    pass: &mut (dyn AttributePass + '_),
) -> Vec<Candidate> {
    pairs
        .into_iter()
        .map(|pair| {
            let attrs = pass.attributes(&pair.node_name, &pair.host_name);
            debug!(
                node = %pair.node_name,
                host = %pair.host_name,
                available_hours = attrs.available_hours,
                has_accelerator = attrs.has_accelerator,
                cpu = pair.usage.overall_cpu_demand,
                memory = pair.usage.guest_memory_usage,
                "candidate attributed"
            );
            Candidate {
                node_name: pair.node_name,
                host_name: pair.host_name,
                available_accelerator_time: attrs.available_hours,
                has_accelerator: attrs.has_accelerator,
                memory_usage: i64::from(pair.usage.guest_memory_usage),
                cpu_usage: i64::from(pair.usage.overall_cpu_demand),
            }
        })
        .collect()
}

// ── Simulation ─────────────────────────────────────────────────────

/// How each simulated pass seeds its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Current wall-clock time, so every pass draws fresh values.
    WallClock,
    /// The same seed for every pass.
    Fixed(u64),
}

/// Random accelerator attributes.
///
/// Available hours are uniform over `[min_hours, max_hours]`; accelerator
/// presence is an independent draw with the configured probability.
#[derive(Debug, Clone)]
pub struct SimulatedAttributeSource {
    min_hours: u32,
    max_hours: u32,
    probability: f64,
    seed: Seed,
}

impl SimulatedAttributeSource {
    /// Build from configuration. Bounds are reordered and the probability
    /// clamped if the configuration was not validated.
    pub fn new(config: &SimulationConfig) -> Self {
        let (min_hours, max_hours) = if config.min_hours <= config.max_hours {
            (config.min_hours, config.max_hours)
        } else {
            (config.max_hours, config.min_hours)
        };
        let probability = if config.accelerator_probability.is_nan() {
            0.0
        } else {
            config.accelerator_probability.clamp(0.0, 1.0)
        };
        Self {
            min_hours,
            max_hours,
            probability,
            seed: config.seed.map_or(Seed::WallClock, Seed::Fixed),
        }
    }

    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }
}

impl Default for SimulatedAttributeSource {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl AttributeSource for SimulatedAttributeSource {
    fn open_pass(&self) -> Box<dyn AttributePass + '_> {
        let seed = match self.seed {
            Seed::Fixed(seed) => seed,
            Seed::WallClock => wall_clock_seed(),
        };
        Box::new(SimulatedPass {
            rng: SmallRng::seed_from_u64(seed),
            source: self,
        })
    }
}

struct SimulatedPass<'a> {
    rng: SmallRng,
    source: &'a SimulatedAttributeSource,
}

impl AttributePass for SimulatedPass<'_> {
    fn attributes(&mut self, _node_name: &str, _host_name: &str) -> AcceleratorAttributes {
        AcceleratorAttributes {
            available_hours: self
                .rng
                .gen_range(self.source.min_hours..=self.source.max_hours),
            has_accelerator: self.rng.gen_bool(self.source.probability),
        }
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ── Fixed table ────────────────────────────────────────────────────

/// Attributes looked up by node name, with a fallback for unknown nodes.
#[derive(Debug, Clone)]
pub struct FixedAttributeSource {
    by_node: HashMap<String, AcceleratorAttributes>,
    fallback: AcceleratorAttributes,
}

impl FixedAttributeSource {
    pub fn new(fallback: AcceleratorAttributes) -> Self {
        Self {
            by_node: HashMap::new(),
            fallback,
        }
    }

    pub fn with_node(mut self, node_name: &str, available_hours: u32, has_accelerator: bool) -> Self {
        self.by_node.insert(
            node_name.to_string(),
            AcceleratorAttributes {
                available_hours,
                has_accelerator,
            },
        );
        self
    }
}

impl AttributeSource for FixedAttributeSource {
    fn open_pass(&self) -> Box<dyn AttributePass + '_> {
        Box::new(FixedPass { source: self })
    }
}

struct FixedPass<'a> {
    source: &'a FixedAttributeSource,
}

impl AttributePass for FixedPass<'_> {
    fn attributes(&mut self, node_name: &str, _host_name: &str) -> AcceleratorAttributes {
        self.source
            .by_node
            .get(node_name)
            .copied()
            .unwrap_or(self.source.fallback)
    }
}
