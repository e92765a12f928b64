//! Innovation-number bookkeeping
//!
//! Structural mutations discovered independently within one generation must
//! receive the same innovation number (and the same node id for splits), or
//! crossover alignment and compatibility distance fall apart. Records are
//! cleared between generations; the counters never rewind.

use serde::{Deserialize, Serialize};

use crate::genome::NodeId;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct ConnRecord {
    in_node: NodeId,
    out_node: NodeId,
    innovation: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SplitRecord {
    conn_innovation: u64,
    node: NodeId,
}

/// Assigns innovation numbers to new connections and node ids to splits,
/// memoized within the current generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InnovationTracker {
    conn_records: Vec<ConnRecord>,
    split_records: Vec<SplitRecord>,
    next_innovation: u64,
    next_node: u32,
}

impl InnovationTracker {
    /// Create a tracker whose counters start after the fixed input/output
    /// nodes and their initial connections.
    pub fn new(first_hidden_node: u32, first_innovation: u64) -> Self {
        Self {
            conn_records: Vec::new(),
            split_records: Vec::new(),
            next_innovation: first_innovation,
            next_node: first_hidden_node,
        }
    }

    /// Innovation number for a connection, reusing the number if this pair
    /// was already seen this generation.
    pub fn innovation_for(&mut self, in_node: NodeId, out_node: NodeId) -> u64 {
        if let Some(record) = self
            .conn_records
            .iter()
            .find(|r| r.in_node == in_node && r.out_node == out_node)
        {
            return record.innovation;
        }

        let innovation = self.next_innovation;
        self.next_innovation += 1;
        self.conn_records.push(ConnRecord {
            in_node,
            out_node,
            innovation,
        });
        innovation
    }

    /// Node id for splitting a connection, reusing the id if this split
    /// already happened this generation.
    pub fn node_for_split(&mut self, conn_innovation: u64) -> NodeId {
        if let Some(record) = self
            .split_records
            .iter()
            .find(|r| r.conn_innovation == conn_innovation)
        {
            return record.node;
        }

        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.split_records.push(SplitRecord {
            conn_innovation,
            node,
        });
        node
    }

    /// Drop this generation's memos; counters keep counting
    pub fn begin_generation(&mut self) {
        self.conn_records.clear();
        self.split_records.clear();
    }
}
