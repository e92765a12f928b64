//! Genome representation and variation operators
//!
//! Provides the NEAT genome operations:
//! - Minimal fully-connected genome construction
//! - Weight, bias, and structural mutation
//! - Innovation-aligned crossover
//! - Compatibility distance

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::NeatConfig;
use crate::innovation::InnovationTracker;

// ============================================================================
// Constants
// ============================================================================

/// Observation features fed into every network
pub const NUM_INPUTS: usize = 3;

/// Action scores produced by every network
pub const NUM_OUTPUTS: usize = 3;

/// Stddev for freshly drawn weights and output biases
const INIT_STDEV: f64 = 1.0;

/// Attempts to find a legal endpoint pair before giving up on an
/// add-connection mutation
const ADD_CONN_ATTEMPTS: usize = 20;

/// Chance a gene disabled in either parent comes back enabled in the child
const DISABLED_INHERIT_ENABLE_RATE: f64 = 0.25;

// ============================================================================
// Core types
// ============================================================================

/// Identity of a genome, stable across its lifetime and the key for
/// fitness accounting
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GenomeId(pub u64);

/// Identity of a node within the population's shared id space
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

/// Role of a node in the network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
}

/// Node gene: an activation site with a bias term
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    /// Node identity
    pub id: NodeId,
    /// Role in the network
    pub kind: NodeKind,
    /// Bias added before activation (zero and unused for inputs)
    pub bias: f64,
}

/// Connection gene
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnGene {
    /// Source node
    pub in_node: NodeId,
    /// Destination node
    pub out_node: NodeId,
    /// Connection weight
    pub weight: f64,
    /// Disabled genes are carried but not expressed
    pub enabled: bool,
    /// Historical marker aligning genes across genomes
    pub innovation: u64,
}

/// One genome: node genes plus innovation-numbered connection genes.
/// Always encodes a feed-forward network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Node genes, inputs first
    pub nodes: Vec<NodeGene>,
    /// Connection genes
    pub conns: Vec<ConnGene>,
}

impl Genome {
    /// Build the starting genome: three inputs fully connected to three
    /// outputs with Gaussian weights and output biases.
    pub fn minimal(tracker: &mut InnovationTracker, rng: &mut impl Rng) -> Self {
        let mut nodes = Vec::with_capacity(NUM_INPUTS + NUM_OUTPUTS);
        for i in 0..NUM_INPUTS {
            nodes.push(NodeGene {
                id: NodeId(i as u32),
                kind: NodeKind::Input,
                bias: 0.0,
            });
        }
        for o in 0..NUM_OUTPUTS {
            nodes.push(NodeGene {
                id: NodeId((NUM_INPUTS + o) as u32),
                kind: NodeKind::Output,
                bias: gaussian(INIT_STDEV, rng),
            });
        }

        let mut conns = Vec::with_capacity(NUM_INPUTS * NUM_OUTPUTS);
        for i in 0..NUM_INPUTS {
            for o in 0..NUM_OUTPUTS {
                let in_node = NodeId(i as u32);
                let out_node = NodeId((NUM_INPUTS + o) as u32);
                conns.push(ConnGene {
                    in_node,
                    out_node,
                    weight: gaussian(INIT_STDEV, rng),
                    enabled: true,
                    innovation: tracker.innovation_for(in_node, out_node),
                });
            }
        }

        Self { nodes, conns }
    }

    /// Node count
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Enabled connection count
    pub fn enabled_conn_count(&self) -> usize {
        self.conns.iter().filter(|c| c.enabled).count()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Apply one generation's worth of mutation: per-gene weight and bias
    /// perturbation, then at most one of each structural change.
    pub fn mutate(
        &mut self,
        config: &NeatConfig,
        tracker: &mut InnovationTracker,
        rng: &mut impl Rng,
    ) {
        self.mutate_weights(config, rng);
        self.mutate_biases(config, rng);
        if rng.gen::<f64>() < config.add_conn_rate {
            self.mutate_add_conn(tracker, rng);
        }
        if rng.gen::<f64>() < config.add_node_rate {
            self.mutate_add_node(tracker, rng);
        }
        if rng.gen::<f64>() < config.toggle_rate {
            self.mutate_toggle(rng);
        }
    }

    /// Perturb or replace connection weights, per gene
    fn mutate_weights(&mut self, config: &NeatConfig, rng: &mut impl Rng) {
        for conn in &mut self.conns {
            if rng.gen::<f64>() < config.weight_mutate_rate {
                if rng.gen::<f64>() < config.weight_replace_rate {
                    conn.weight = gaussian(INIT_STDEV, rng);
                } else {
                    conn.weight += gaussian(config.weight_perturb_stdev, rng);
                }
            }
        }
    }

    /// Perturb non-input biases, per gene
    fn mutate_biases(&mut self, config: &NeatConfig, rng: &mut impl Rng) {
        for node in &mut self.nodes {
            if node.kind != NodeKind::Input && rng.gen::<f64>() < config.bias_mutate_rate {
                node.bias += gaussian(config.bias_perturb_stdev, rng);
            }
        }
    }

    /// Add one new connection between a legal endpoint pair: source is never
    /// an output, destination is never an input, no duplicates, no cycles.
    fn mutate_add_conn(&mut self, tracker: &mut InnovationTracker, rng: &mut impl Rng) {
        let sources: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Output)
            .map(|n| n.id)
            .collect();
        let targets: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Input)
            .map(|n| n.id)
            .collect();

        for _ in 0..ADD_CONN_ATTEMPTS {
            let in_node = sources[rng.gen_range(0..sources.len())];
            let out_node = targets[rng.gen_range(0..targets.len())];

            if in_node == out_node {
                continue;
            }
            if self
                .conns
                .iter()
                .any(|c| c.in_node == in_node && c.out_node == out_node)
            {
                continue;
            }
            if self.path_exists(out_node, in_node) {
                continue;
            }

            let innovation = tracker.innovation_for(in_node, out_node);
            self.conns.push(ConnGene {
                in_node,
                out_node,
                weight: gaussian(INIT_STDEV, rng),
                enabled: true,
                innovation,
            });
            return;
        }
    }

    /// Split one enabled connection with a new hidden node. The old gene is
    /// disabled; the incoming half gets weight 1, the outgoing half keeps
    /// the old weight.
    fn mutate_add_node(&mut self, tracker: &mut InnovationTracker, rng: &mut impl Rng) {
        let enabled: Vec<usize> = self
            .conns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return;
        }

        let idx = enabled[rng.gen_range(0..enabled.len())];
        let old = self.conns[idx];
        let node = tracker.node_for_split(old.innovation);
        if self.nodes.iter().any(|n| n.id == node) {
            // This genome already split this gene once; a re-enabled copy
            // cannot be split again.
            return;
        }

        self.conns[idx].enabled = false;
        self.nodes.push(NodeGene {
            id: node,
            kind: NodeKind::Hidden,
            bias: 0.0,
        });

        let innov_in = tracker.innovation_for(old.in_node, node);
        let innov_out = tracker.innovation_for(node, old.out_node);
        self.conns.push(ConnGene {
            in_node: old.in_node,
            out_node: node,
            weight: 1.0,
            enabled: true,
            innovation: innov_in,
        });
        self.conns.push(ConnGene {
            in_node: node,
            out_node: old.out_node,
            weight: old.weight,
            enabled: true,
            innovation: innov_out,
        });
    }

    /// Flip one connection's enabled flag
    fn mutate_toggle(&mut self, rng: &mut impl Rng) {
        if self.conns.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.conns.len());
        self.conns[idx].enabled = !self.conns[idx].enabled;
    }

    /// Whether `to` is reachable from `from` over the connection genes.
    /// Disabled genes still count, so a toggled-on gene can never create
    /// a cycle.
    fn path_exists(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = FxHashSet::default();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.insert(node) {
                stack.extend(
                    self.conns
                        .iter()
                        .filter(|c| c.in_node == node)
                        .map(|c| c.out_node),
                );
            }
        }
        false
    }

    // ========================================================================
    // Crossover and distance
    // ========================================================================

    /// Cross two parents into a child.
    ///
    /// Matching genes (same innovation) pick a parent at random; disjoint and
    /// excess genes come from the fitter parent. A gene disabled in either
    /// parent is usually disabled in the child.
    ///
    /// # Arguments
    /// * `fitter` - Parent with the higher fitness (ties: caller's choice)
    /// * `other` - The other parent
    /// * `rng` - Random number generator
    pub fn crossover(fitter: &Genome, other: &Genome, rng: &mut impl Rng) -> Genome {
        let other_conns: FxHashMap<u64, &ConnGene> =
            other.conns.iter().map(|c| (c.innovation, c)).collect();
        let other_nodes: FxHashMap<NodeId, &NodeGene> =
            other.nodes.iter().map(|n| (n.id, n)).collect();

        let mut conns = Vec::with_capacity(fitter.conns.len());
        for gene in &fitter.conns {
            let matched = other_conns.get(&gene.innovation);
            let mut child = match matched {
                Some(o) if rng.gen_bool(0.5) => **o,
                _ => *gene,
            };
            let disabled_somewhere = !gene.enabled || matched.map_or(false, |o| !o.enabled);
            if disabled_somewhere {
                child.enabled = rng.gen::<f64>() < DISABLED_INHERIT_ENABLE_RATE;
            }
            conns.push(child);
        }

        let nodes = fitter
            .nodes
            .iter()
            .map(|n| match other_nodes.get(&n.id) {
                Some(o) if rng.gen_bool(0.5) => **o,
                _ => *n,
            })
            .collect();

        Genome { nodes, conns }
    }

    /// Compatibility distance between two genomes:
    /// excess_coef * E/N + disjoint_coef * D/N + weight_coef * mean matching
    /// weight difference, with N the larger gene count (at least 1).
    pub fn distance(&self, other: &Genome, config: &NeatConfig) -> f64 {
        let self_by_innov: FxHashMap<u64, f64> =
            self.conns.iter().map(|c| (c.innovation, c.weight)).collect();
        let other_by_innov: FxHashMap<u64, f64> =
            other.conns.iter().map(|c| (c.innovation, c.weight)).collect();

        let self_max = self.conns.iter().map(|c| c.innovation).max().unwrap_or(0);
        let other_max = other.conns.iter().map(|c| c.innovation).max().unwrap_or(0);

        let mut matching = 0usize;
        let mut weight_diff = 0.0;
        let mut disjoint = 0usize;
        let mut excess = 0usize;

        for conn in &self.conns {
            if let Some(weight) = other_by_innov.get(&conn.innovation) {
                matching += 1;
                weight_diff += (conn.weight - weight).abs();
            } else if conn.innovation > other_max {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }
        for conn in &other.conns {
            if !self_by_innov.contains_key(&conn.innovation) {
                if conn.innovation > self_max {
                    excess += 1;
                } else {
                    disjoint += 1;
                }
            }
        }

        let n = self.conns.len().max(other.conns.len()).max(1) as f64;
        let mean_weight_diff = if matching > 0 {
            weight_diff / matching as f64
        } else {
            0.0
        };

        config.excess_coef * excess as f64 / n
            + config.disjoint_coef * disjoint as f64 / n
            + config.weight_coef * mean_weight_diff
    }
}

/// Sample a zero-mean Gaussian. Config stddevs are finite and non-negative,
/// so construction cannot fail in practice.
fn gaussian(stdev: f64, rng: &mut impl Rng) -> f64 {
    Normal::new(0.0, stdev)
        .map(|normal| normal.sample(rng))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fresh_tracker() -> InnovationTracker {
        InnovationTracker::new(
            (NUM_INPUTS + NUM_OUTPUTS) as u32,
            (NUM_INPUTS * NUM_OUTPUTS) as u64,
        )
    }

    fn minimal_genome(seed: u64) -> (Genome, InnovationTracker) {
        let mut tracker = fresh_tracker();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let genome = Genome::minimal(&mut tracker, &mut rng);
        (genome, tracker)
    }

    fn has_cycle(genome: &Genome) -> bool {
        for conn in &genome.conns {
            if genome.path_exists(conn.out_node, conn.in_node) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_minimal_genome_shape() {
        let (genome, _) = minimal_genome(1);
        assert_eq!(genome.node_count(), NUM_INPUTS + NUM_OUTPUTS);
        assert_eq!(genome.conns.len(), NUM_INPUTS * NUM_OUTPUTS);
        assert_eq!(genome.enabled_conn_count(), NUM_INPUTS * NUM_OUTPUTS);
        assert!(genome
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Input)
            .all(|n| n.bias == 0.0));
    }

    #[test]
    fn test_minimal_genomes_share_innovations() {
        let mut tracker = fresh_tracker();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let a = Genome::minimal(&mut tracker, &mut rng);
        let b = Genome::minimal(&mut tracker, &mut rng);

        let innovs_a: Vec<u64> = a.conns.iter().map(|c| c.innovation).collect();
        let innovs_b: Vec<u64> = b.conns.iter().map(|c| c.innovation).collect();
        assert_eq!(innovs_a, innovs_b);
    }

    #[test]
    fn test_add_node_splits_connection() {
        let (mut genome, mut tracker) = minimal_genome(3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let conns_before = genome.conns.len();

        genome.mutate_add_node(&mut tracker, &mut rng);

        assert_eq!(genome.node_count(), NUM_INPUTS + NUM_OUTPUTS + 1);
        assert_eq!(genome.conns.len(), conns_before + 2);

        let disabled: Vec<&ConnGene> = genome.conns.iter().filter(|c| !c.enabled).collect();
        assert_eq!(disabled.len(), 1);
        let old = disabled[0];

        // Incoming half carries weight 1, outgoing half the old weight
        let hidden = genome
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Hidden)
            .map(|n| n.id)
            .unwrap();
        let incoming = genome
            .conns
            .iter()
            .find(|c| c.out_node == hidden)
            .unwrap();
        let outgoing = genome
            .conns
            .iter()
            .find(|c| c.in_node == hidden)
            .unwrap();
        assert_eq!(incoming.weight, 1.0);
        assert_eq!(outgoing.weight, old.weight);
        assert_eq!(incoming.in_node, old.in_node);
        assert_eq!(outgoing.out_node, old.out_node);
    }

    #[test]
    fn test_mutation_keeps_genome_well_formed() {
        let (mut genome, mut tracker) = minimal_genome(4);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let config = NeatConfig {
            add_conn_rate: 0.5,
            add_node_rate: 0.5,
            toggle_rate: 0.2,
            ..NeatConfig::default()
        };

        for _ in 0..200 {
            genome.mutate(&config, &mut tracker, &mut rng);
        }

        // No duplicate connections
        let mut pairs = FxHashSet::default();
        for conn in &genome.conns {
            assert!(pairs.insert((conn.in_node, conn.out_node)));
        }
        // No duplicate nodes
        let mut ids = FxHashSet::default();
        for node in &genome.nodes {
            assert!(ids.insert(node.id));
        }
        // Still feed-forward
        assert!(!has_cycle(&genome));
        // Inputs never gain incoming edges, outputs never gain outgoing ones
        for conn in &genome.conns {
            let out_kind = genome.nodes.iter().find(|n| n.id == conn.out_node).unwrap().kind;
            let in_kind = genome.nodes.iter().find(|n| n.id == conn.in_node).unwrap().kind;
            assert_ne!(out_kind, NodeKind::Input);
            assert_ne!(in_kind, NodeKind::Output);
        }
    }

    #[test]
    fn test_crossover_aligns_by_innovation() {
        let mut tracker = fresh_tracker();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut a = Genome::minimal(&mut tracker, &mut rng);
        let b = Genome::minimal(&mut tracker, &mut rng);

        // Give the fitter parent extra structure
        a.mutate_add_node(&mut tracker, &mut rng);

        let child = Genome::crossover(&a, &b, &mut rng);

        // Child structure mirrors the fitter parent's gene set
        let child_innovs: FxHashSet<u64> = child.conns.iter().map(|c| c.innovation).collect();
        let a_innovs: FxHashSet<u64> = a.conns.iter().map(|c| c.innovation).collect();
        assert_eq!(child_innovs, a_innovs);
        assert_eq!(child.node_count(), a.node_count());

        // Every matching weight came from one of the parents
        for conn in &child.conns {
            let from_a = a
                .conns
                .iter()
                .any(|c| c.innovation == conn.innovation && c.weight == conn.weight);
            let from_b = b
                .conns
                .iter()
                .any(|c| c.innovation == conn.innovation && c.weight == conn.weight);
            assert!(from_a || from_b);
        }
    }

    #[test]
    fn test_distance_zero_for_identical() {
        let (genome, _) = minimal_genome(6);
        let clone = genome.clone();
        assert_eq!(genome.distance(&clone, &NeatConfig::default()), 0.0);
    }

    #[test]
    fn test_distance_grows_with_divergence() {
        let (genome, mut tracker) = minimal_genome(7);
        let config = NeatConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut weights_changed = genome.clone();
        for conn in &mut weights_changed.conns {
            conn.weight += 2.0;
        }
        let weight_distance = genome.distance(&weights_changed, &config);
        assert!(weight_distance > 0.0);

        let mut structure_changed = weights_changed.clone();
        structure_changed.mutate_add_node(&mut tracker, &mut rng);
        let structure_distance = genome.distance(&structure_changed, &config);
        assert!(structure_distance > weight_distance);
    }

    #[test]
    fn test_toggle_flips_enabled() {
        let (mut genome, _) = minimal_genome(8);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let enabled_before = genome.enabled_conn_count();

        genome.mutate_toggle(&mut rng);
        assert_eq!(genome.enabled_conn_count(), enabled_before - 1);
        assert!(!has_cycle(&genome));
    }
}
