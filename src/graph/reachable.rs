//! Reachability over a linear graph.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::graph::bitset::NodeBitSet;
use crate::graph::linear::{LinearGraph, NodeId};

/// Compute the set of node indices reachable from `root_ids` by following
/// child edges downward.
///
/// `None` roots mean "no filter": every index in the graph is marked. Root ids
/// that do not resolve to an index in this graph are skipped; if none resolve
/// the result is empty.
pub fn reachable_nodes(graph: &dyn LinearGraph, root_ids: Option<&HashSet<NodeId>>) -> NodeBitSet {
    let Some(root_ids) = root_ids else {
        return NodeBitSet::full(graph.node_count());
    };

    let mut reachable = NodeBitSet::with_capacity(graph.node_count());
    let mut frontier = VecDeque::new();
    for &id in root_ids {
        match graph.node_index(id) {
            Some(index) => {
                if !reachable.get(index) {
                    reachable.set(index, true);
                    frontier.push_back(index);
                }
            }
            None => trace!(id, "root id does not resolve in this graph, skipping"),
        }
    }

    while let Some(index) = frontier.pop_front() {
        for down in graph.down_nodes(index) {
            if !reachable.get(down) {
                reachable.set(down, true);
                frontier.push_back(down);
            }
        }
    }

    reachable
}
