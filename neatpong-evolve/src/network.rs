//! Feed-forward phenotype compiled from a genome

use rustc_hash::FxHashMap;

use crate::genome::{Genome, NodeKind, NUM_INPUTS, NUM_OUTPUTS};

/// One node's evaluation step: weighted sum of already-computed sources,
/// plus bias, through tanh
#[derive(Clone, Debug)]
struct NodeEval {
    slot: usize,
    bias: f64,
    incoming: Vec<(usize, f64)>,
}

/// A runnable feed-forward network.
///
/// Compiled once from a genome; `activate` is then allocation-light and
/// deterministic. Nodes with no enabled incoming connection (including
/// outputs a mutation disconnected) hold 0.
#[derive(Clone, Debug)]
pub struct Network {
    values: Vec<f64>,
    input_slots: Vec<usize>,
    output_slots: Vec<usize>,
    evals: Vec<NodeEval>,
}

impl Network {
    /// Compile a genome into evaluation order
    pub fn from_genome(genome: &Genome) -> Self {
        let n_nodes = genome.nodes.len();
        let slot_of: FxHashMap<_, _> = genome
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id, slot))
            .collect();

        let input_slots = slots_of_kind(genome, &slot_of, NodeKind::Input);
        let output_slots = slots_of_kind(genome, &slot_of, NodeKind::Output);

        // Enabled connections grouped by destination slot
        let mut incoming: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_nodes];
        for conn in genome.conns.iter().filter(|c| c.enabled) {
            if let (Some(&src), Some(&dst)) =
                (slot_of.get(&conn.in_node), slot_of.get(&conn.out_node))
            {
                incoming[dst].push((src, conn.weight));
            }
        }

        // Sweep until no node becomes computable; each placed node may feed
        // nodes later in the same sweep, so the order is topological.
        let mut known: Vec<bool> = genome
            .nodes
            .iter()
            .map(|n| n.kind == NodeKind::Input)
            .collect();
        let mut evals = Vec::new();
        loop {
            let mut progressed = false;
            for slot in 0..n_nodes {
                if known[slot] || incoming[slot].is_empty() {
                    continue;
                }
                if incoming[slot].iter().all(|&(src, _)| known[src]) {
                    evals.push(NodeEval {
                        slot,
                        bias: genome.nodes[slot].bias,
                        incoming: std::mem::take(&mut incoming[slot]),
                    });
                    known[slot] = true;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        Self {
            values: vec![0.0; n_nodes],
            input_slots,
            output_slots,
            evals,
        }
    }

    /// Run one observation through the network, returning the three
    /// action scores.
    pub fn activate(&mut self, inputs: &[f64; NUM_INPUTS]) -> Vec<f64> {
        for value in &mut self.values {
            *value = 0.0;
        }
        for (&slot, &value) in self.input_slots.iter().zip(inputs.iter()) {
            self.values[slot] = value;
        }

        for eval in &self.evals {
            let mut sum = eval.bias;
            for &(src, weight) in &eval.incoming {
                sum += self.values[src] * weight;
            }
            self.values[eval.slot] = sum.tanh();
        }

        self.output_slots
            .iter()
            .map(|&slot| self.values[slot])
            .collect()
    }

    /// Number of evaluation steps (hidden + reachable output nodes)
    pub fn eval_count(&self) -> usize {
        self.evals.len()
    }
}

/// Slots of one node kind, ordered by node id so observation features and
/// action scores always line up the same way
fn slots_of_kind(
    genome: &Genome,
    slot_of: &FxHashMap<crate::genome::NodeId, usize>,
    kind: NodeKind,
) -> Vec<usize> {
    let mut ids: Vec<_> = genome
        .nodes
        .iter()
        .filter(|n| n.kind == kind)
        .map(|n| n.id)
        .collect();
    ids.sort();
    ids.iter().filter_map(|id| slot_of.get(id).copied()).collect()
}
