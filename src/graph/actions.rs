//! Expansion and collapse algorithms over a [`CollapsedGraph`].
//!
//! All functions mutate the graph in delegate-index space; gesture
//! interpretation ([`perform_action`]) translates from compiled space first.
//! Walks over hidden regions always process the structurally nearest pending
//! node next, which is what [`SortedNodeQueue`] guarantees.

use std::collections::BTreeSet;

use tracing::debug;

use crate::graph::bitset::NodeBitSet;
use crate::graph::collapsed::CollapsedGraph;
use crate::graph::controller::{GraphAction, GraphActionKind, GraphAnswer, GraphChanges};
use crate::graph::linear::{EdgeFilter, EdgeKind, GraphElement, LinearGraph, NodeIndex};
use crate::graph::walk::{SortedNodeQueue, WalkDirection};

/// Visible nodes bounding a hidden region around some node: the ones adjacent
/// directly, and the ones only reachable through at least one hidden node.
struct HiddenBoundary {
    direct: BTreeSet<NodeIndex>,
    via_hidden: BTreeSet<NodeIndex>,
}

impl HiddenBoundary {
    fn needs_synthetic_edge(&self, node: NodeIndex) -> bool {
        self.via_hidden.contains(&node) && !self.direct.contains(&node)
    }

    fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.direct.iter().chain(&self.via_hidden).copied()
    }
}

fn hidden_boundary(
    graph: &CollapsedGraph,
    node: NodeIndex,
    direction: WalkDirection,
) -> HiddenBoundary {
    let delegate = graph.delegate().clone();
    let neighbors = |index: NodeIndex| match direction {
        WalkDirection::Descending => delegate.up_nodes(index),
        WalkDirection::Ascending => delegate.down_nodes(index),
    };

    let mut direct = BTreeSet::new();
    let mut via_hidden = BTreeSet::new();
    let mut queue = SortedNodeQueue::empty(direction);
    let mut enqueued = NodeBitSet::new();

    for neighbor in neighbors(node) {
        if graph.is_visible(neighbor) {
            direct.insert(neighbor);
        } else if !enqueued.get(neighbor) {
            enqueued.set(neighbor, true);
            queue.add(neighbor);
        }
    }
    while !queue.is_empty() {
        let hidden = queue.pop();
        for neighbor in neighbors(hidden) {
            if graph.is_visible(neighbor) {
                via_hidden.insert(neighbor);
            } else if !enqueued.get(neighbor) {
                enqueued.set(neighbor, true);
                queue.add(neighbor);
            }
        }
    }

    HiddenBoundary { direct, via_hidden }
}

/// Mark every given delegate node visible and resolve the synthetic edges
/// masking it: a collapsed edge spanning an expanded node is removed, and
/// replaced by shorter spans toward the boundary sides that still hide nodes.
///
/// Calling this twice with the same set is a no-op the second time.
pub fn expand_nodes(graph: &mut CollapsedGraph, nodes: impl IntoIterator<Item = NodeIndex>) {
    for node in nodes {
        graph.set_visible(node, true);

        let above = hidden_boundary(graph, node, WalkDirection::Descending);
        let below = hidden_boundary(graph, node, WalkDirection::Ascending);
        for up in above.iter() {
            for down in below.iter() {
                if !graph.remove_collapsed_edge(up, down) {
                    continue;
                }
                debug!(up, down, node, "split collapsed edge around expanded node");
                if above.needs_synthetic_edge(up) {
                    graph.add_collapsed_edge(up, node);
                }
                if below.needs_synthetic_edge(down) {
                    graph.add_collapsed_edge(node, down);
                }
            }
        }
    }
}

/// Remove the collapsed edge `(up, down)` and reveal the hidden chain it was
/// standing in for: every hidden node lying on a path from `up` to `down`.
///
/// Returns the revealed delegate nodes, or `None` when the pair is not a
/// registered collapsed edge.
pub fn expand_collapsed_edge(
    graph: &mut CollapsedGraph,
    up: NodeIndex,
    down: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    if !graph.remove_collapsed_edge(up, down) {
        return None;
    }
    let delegate = graph.delegate().clone();

    // Hidden nodes reachable downward from `up`, bounded by `down`: indices
    // are topologically ordered, so nothing on a path to `down` lies outside
    // (up, down).
    let mut from_up = NodeBitSet::new();
    let mut queue = SortedNodeQueue::empty(WalkDirection::Ascending);
    queue.add_all(
        delegate
            .down_nodes(up)
            .into_iter()
            .filter(|&n| !graph.is_visible(n) && n < down),
    );
    while !queue.is_empty() {
        let hidden = queue.pop();
        from_up.set(hidden, true);
        queue.add_all(
            delegate
                .down_nodes(hidden)
                .into_iter()
                .filter(|&n| !graph.is_visible(n) && n < down && !from_up.get(n)),
        );
    }

    // Hidden nodes reaching `down` upward, bounded by `up`.
    let mut from_down = NodeBitSet::new();
    let mut queue = SortedNodeQueue::empty(WalkDirection::Descending);
    queue.add_all(
        delegate
            .up_nodes(down)
            .into_iter()
            .filter(|&n| !graph.is_visible(n) && n > up),
    );
    while !queue.is_empty() {
        let hidden = queue.pop();
        from_down.set(hidden, true);
        queue.add_all(
            delegate
                .up_nodes(hidden)
                .into_iter()
                .filter(|&n| !graph.is_visible(n) && n > up && !from_down.get(n)),
        );
    }

    let revealed: Vec<NodeIndex> = from_up
        .iter_set()
        .filter(|&node| from_down.get(node))
        .collect();
    for &node in &revealed {
        graph.set_visible(node, true);
    }
    debug!(up, down, count = revealed.len(), "expanded collapsed edge");
    Some(revealed)
}

/// A linear fragment that was just collapsed, in delegate-index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedFragment {
    pub up: NodeIndex,
    pub down: NodeIndex,
    /// The nodes hidden by the collapse, between `up` and `down`.
    pub interior: Vec<NodeIndex>,
}

/// Collapse the maximal linear fragment headed at `compiled_head`: the run of
/// nodes downward from it in which every link is the sole edge on both sides.
/// The interior is hidden and one dotted edge bridges the endpoints; dotted
/// edges already inside the run are absorbed into the new span.
///
/// Returns `None` when the fragment has no interior to hide.
///
/// # Panics
///
/// Panics when `compiled_head` is outside the compiled range.
pub fn collapse_linear_fragment(
    graph: &mut CollapsedGraph,
    compiled_head: NodeIndex,
) -> Option<CollapsedFragment> {
    let compiled = graph.compiled_graph();
    let mut chain = vec![compiled_head];
    let mut current = compiled_head;
    loop {
        let downs = compiled.adjacent_edges(current, EdgeFilter::Down);
        // Interior links must be sole, fully loaded edges on both sides.
        let [link] = downs.as_slice() else { break };
        let Some(next) = link.down else { break };
        if compiled.adjacent_edges(next, EdgeFilter::Up).len() != 1 {
            break;
        }
        chain.push(next);
        current = next;
    }
    if chain.len() < 3 {
        return None;
    }

    let delegate_chain: Vec<NodeIndex> = chain
        .iter()
        .map(|&compiled_index| compiled.to_delegate_index(compiled_index))
        .collect();
    drop(compiled);

    for link in delegate_chain.windows(2) {
        graph.remove_collapsed_edge(link[0], link[1]);
    }
    let up = delegate_chain[0];
    let down = *delegate_chain.last().expect("chain has endpoints");
    let interior = delegate_chain[1..delegate_chain.len() - 1].to_vec();
    for &node in &interior {
        graph.set_visible(node, false);
    }
    graph.add_collapsed_edge(up, down);
    debug!(up, down, hidden = interior.len(), "collapsed linear fragment");
    Some(CollapsedFragment { up, down, interior })
}

/// Collapse every maximal linear fragment, top to bottom.
pub fn collapse_linear_branches(graph: &mut CollapsedGraph) -> Vec<CollapsedFragment> {
    let mut fragments = Vec::new();
    let mut index = 0;
    while index < graph.compiled_graph().node_count() {
        if let Some(fragment) = collapse_linear_fragment(graph, index) {
            fragments.push(fragment);
        }
        index += 1;
    }
    fragments
}

/// Reveal every hidden delegate node and drop every synthetic edge.
///
/// Returns the nodes that became visible and the dotted edges that were
/// removed.
pub fn expand_all(graph: &mut CollapsedGraph) -> (Vec<NodeIndex>, Vec<(NodeIndex, NodeIndex)>) {
    let revealed: Vec<NodeIndex> = (0..graph.delegate().node_count())
        .filter(|&node| !graph.is_visible(node))
        .collect();
    let removed_edges: Vec<(NodeIndex, NodeIndex)> = graph.collapsed_edges().iter().collect();
    graph.clear_collapsed_edges();
    graph.set_all_visible();
    (revealed, removed_edges)
}

/// Interpret a user gesture against the graph. Returns `None` when the
/// gesture means nothing at this layer (it then cascades to the delegate).
pub fn perform_action(graph: &mut CollapsedGraph, action: &GraphAction) -> Option<GraphAnswer> {
    match (action.kind, action.affected) {
        (GraphActionKind::MouseClick, Some(GraphElement::Edge(edge))) => {
            if edge.kind != EdgeKind::Dotted {
                return None;
            }
            let (Some(up), Some(down)) = (edge.up, edge.down) else {
                return None;
            };
            let up = graph.to_delegate_index(up);
            let down = graph.to_delegate_index(down);
            let revealed = expand_collapsed_edge(graph, up, down)?;

            let delegate = graph.delegate().clone();
            let mut changes = GraphChanges::default();
            for &node in &revealed {
                changes.node(delegate.node_id(node), false);
            }
            changes.edge(
                Some(delegate.node_id(up)),
                Some(delegate.node_id(down)),
                true,
            );
            Some(GraphAnswer::changed(changes))
        }
        (GraphActionKind::MouseClick, Some(GraphElement::Node(node))) => {
            let fragment = collapse_linear_fragment(graph, node.index)?;
            Some(GraphAnswer::changed(fragment_changes(graph, &[fragment])))
        }
        (GraphActionKind::CollapseAll, _) => {
            let fragments = collapse_linear_branches(graph);
            if fragments.is_empty() {
                return Some(GraphAnswer::unchanged());
            }
            Some(GraphAnswer::changed(fragment_changes(graph, &fragments)))
        }
        (GraphActionKind::ExpandAll, _) => {
            let (revealed, removed_edges) = expand_all(graph);
            if revealed.is_empty() && removed_edges.is_empty() {
                return Some(GraphAnswer::unchanged());
            }
            let delegate = graph.delegate().clone();
            let mut changes = GraphChanges::default();
            for node in revealed {
                changes.node(delegate.node_id(node), false);
            }
            for (up, down) in removed_edges {
                changes.edge(
                    Some(delegate.node_id(up)),
                    Some(delegate.node_id(down)),
                    true,
                );
            }
            Some(GraphAnswer::changed(changes))
        }
        _ => None,
    }
}

fn fragment_changes(graph: &CollapsedGraph, fragments: &[CollapsedFragment]) -> GraphChanges {
    let delegate = graph.delegate().clone();
    let mut changes = GraphChanges::default();
    for fragment in fragments {
        for &node in &fragment.interior {
            changes.node(delegate.node_id(node), true);
        }
        changes.edge(
            Some(delegate.node_id(fragment.up)),
            Some(delegate.node_id(fragment.down)),
            false,
        );
    }
    changes
}
