//! Two-layer filtered graph: a delegate graph, a visibility bitset, and the
//! compiled view the next layer up consumes.
//!
//! Delegate indices are stable; compiled indices are a dense renumbering of
//! the visible delegate nodes, recomputed from the bitset whenever a mutation
//! invalidated the cached translation. The rebuild is lazy so a bulk operation
//! toggling many nodes pays for one rebuild, not one per toggle.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::debug;

use crate::graph::bitset::NodeBitSet;
use crate::graph::linear::{
    EdgeFilter, EdgeKind, GraphEdge, GraphElement, GraphNode, LinearGraph, NodeId, NodeIndex,
};

/// Registry of synthetic dotted edges, keyed by delegate node indices.
///
/// A collapsed edge always runs downward: its upper endpoint has the smaller
/// delegate index. Both endpoints must stay visible for as long as the edge is
/// registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapsedEdges {
    up_to_down: BTreeMap<NodeIndex, BTreeSet<NodeIndex>>,
    down_to_up: BTreeMap<NodeIndex, BTreeSet<NodeIndex>>,
}

impl CollapsedEdges {
    /// Register `(up, down)`. Returns false when the pair was already present.
    ///
    /// # Panics
    ///
    /// Panics unless `up < down`.
    pub fn add(&mut self, up: NodeIndex, down: NodeIndex) -> bool {
        assert!(up < down, "collapsed edge must run downward: {up} -> {down}");
        let inserted = self.up_to_down.entry(up).or_default().insert(down);
        if inserted {
            self.down_to_up.entry(down).or_default().insert(up);
        }
        inserted
    }

    /// Unregister `(up, down)`. Returns false when the pair was not present.
    pub fn remove(&mut self, up: NodeIndex, down: NodeIndex) -> bool {
        let removed = match self.up_to_down.get_mut(&up) {
            Some(downs) => downs.remove(&down),
            None => false,
        };
        if removed {
            if self.up_to_down.get(&up).is_some_and(|downs| downs.is_empty()) {
                self.up_to_down.remove(&up);
            }
            let ups = self.down_to_up.get_mut(&down).expect("edge maps out of sync");
            ups.remove(&up);
            if ups.is_empty() {
                self.down_to_up.remove(&down);
            }
        }
        removed
    }

    pub fn contains(&self, up: NodeIndex, down: NodeIndex) -> bool {
        self.up_to_down
            .get(&up)
            .is_some_and(|downs| downs.contains(&down))
    }

    /// Lower endpoints of edges whose upper endpoint is `up`, ascending.
    pub fn downs_from(&self, up: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.up_to_down.get(&up).into_iter().flatten().copied()
    }

    /// Upper endpoints of edges whose lower endpoint is `down`, ascending.
    pub fn ups_to(&self, down: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.down_to_up.get(&down).into_iter().flatten().copied()
    }

    /// All registered pairs, ordered by upper then lower endpoint.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.up_to_down
            .iter()
            .flat_map(|(&up, downs)| downs.iter().map(move |&down| (up, down)))
    }

    pub fn is_empty(&self) -> bool {
        self.up_to_down.is_empty()
    }

    pub fn len(&self) -> usize {
        self.up_to_down.values().map(BTreeSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.up_to_down.clear();
        self.down_to_up.clear();
    }
}

/// Dense renumbering of the visible delegate nodes.
#[derive(Debug)]
struct TranslationTable {
    to_delegate: Vec<NodeIndex>,
    to_compiled: Vec<Option<NodeIndex>>,
}

impl TranslationTable {
    fn build(visibility: &NodeBitSet, delegate_len: usize) -> Self {
        let mut to_delegate = Vec::with_capacity(visibility.count_set());
        let mut to_compiled = vec![None; delegate_len];
        for delegate_index in visibility.iter_set() {
            if delegate_index >= delegate_len {
                break;
            }
            to_compiled[delegate_index] = Some(to_delegate.len());
            to_delegate.push(delegate_index);
        }
        TranslationTable {
            to_delegate,
            to_compiled,
        }
    }
}

/// The filtered [`LinearGraph`] a [`CollapsedGraph`] exposes upward.
///
/// A compiled graph is an immutable snapshot: mutating the owning
/// [`CollapsedGraph`] afterwards does not disturb it, the next
/// [`CollapsedGraph::compiled_graph`] call simply yields a fresh one.
pub struct CompiledGraph {
    delegate: Rc<dyn LinearGraph>,
    table: TranslationTable,
    collapsed_edges: CollapsedEdges,
}

impl CompiledGraph {
    /// Translate a compiled index back to the delegate index it renumbers.
    ///
    /// # Panics
    ///
    /// Panics when `compiled` is outside the current compiled range.
    pub fn to_delegate_index(&self, compiled: NodeIndex) -> NodeIndex {
        match self.table.to_delegate.get(compiled) {
            Some(&delegate_index) => delegate_index,
            None => panic!(
                "compiled index {compiled} out of range (visible node count {})",
                self.table.to_delegate.len()
            ),
        }
    }

    /// Translate a delegate index to its compiled position, or `None` when the
    /// node is hidden.
    pub fn to_compiled_index(&self, delegate: NodeIndex) -> Option<NodeIndex> {
        self.table.to_compiled.get(delegate).copied().flatten()
    }

    fn compiled_endpoint(&self, delegate: NodeIndex) -> NodeIndex {
        self.to_compiled_index(delegate)
            .expect("collapsed edge endpoint must be visible")
    }

    fn map_edge(&self, edge: &GraphEdge) -> Option<GraphEdge> {
        let up = match edge.up {
            Some(up) => Some(self.to_compiled_index(up)?),
            None => None,
        };
        let down = match edge.down {
            Some(down) => Some(self.to_compiled_index(down)?),
            None => None,
        };
        Some(GraphEdge {
            up,
            down,
            target_id: edge.target_id,
            kind: edge.kind,
        })
    }
}

impl LinearGraph for CompiledGraph {
    fn node_count(&self) -> usize {
        self.table.to_delegate.len()
    }

    fn node_id(&self, index: NodeIndex) -> NodeId {
        self.delegate.node_id(self.to_delegate_index(index))
    }

    fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        let delegate_index = self.delegate.node_index(id)?;
        self.to_compiled_index(delegate_index)
    }

    fn adjacent_edges(&self, index: NodeIndex, filter: EdgeFilter) -> Vec<GraphEdge> {
        let delegate_index = self.to_delegate_index(index);
        let mut edges = Vec::new();
        for edge in self.delegate.adjacent_edges(delegate_index, filter) {
            // A real edge between the endpoints of a registered collapsed pair
            // is subsumed by the synthetic edge added below.
            if let (Some(up), Some(down)) = (edge.up, edge.down) {
                if self.collapsed_edges.contains(up, down) {
                    continue;
                }
            }
            if let Some(mapped) = self.map_edge(&edge) {
                edges.push(mapped);
            }
        }
        if filter.wants_down() {
            for down in self.collapsed_edges.downs_from(delegate_index) {
                edges.push(GraphEdge::dotted(index, self.compiled_endpoint(down)));
            }
        }
        if filter.wants_up() {
            for up in self.collapsed_edges.ups_to(delegate_index) {
                edges.push(GraphEdge::dotted(self.compiled_endpoint(up), index));
            }
        }
        edges
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("node_count", &self.node_count())
            .field("collapsed_edges", &self.collapsed_edges.len())
            .finish()
    }
}

/// Mutable view state over a delegate graph: which delegate nodes are visible
/// and which hidden chains are replaced by dotted edges.
pub struct CollapsedGraph {
    delegate: Rc<dyn LinearGraph>,
    visibility: NodeBitSet,
    collapsed_edges: CollapsedEdges,
    compiled: RefCell<Option<Rc<CompiledGraph>>>,
}

impl CollapsedGraph {
    /// Fresh instance over `delegate` with the given initial visibility.
    pub fn new_instance(delegate: Rc<dyn LinearGraph>, visibility: NodeBitSet) -> Self {
        CollapsedGraph {
            delegate,
            visibility,
            collapsed_edges: CollapsedEdges::default(),
            compiled: RefCell::new(None),
        }
    }

    /// Rebind `old`'s state to a new delegate graph. The visibility bitset and
    /// the collapsed-edge set carry over unchanged; only the delegate binding
    /// and the (lazily rebuilt) translation differ.
    pub fn update_instance(old: &CollapsedGraph, new_delegate: Rc<dyn LinearGraph>) -> Self {
        debug!(
            old_nodes = old.delegate.node_count(),
            new_nodes = new_delegate.node_count(),
            "rebinding collapsed graph to updated delegate"
        );
        CollapsedGraph {
            delegate: new_delegate,
            visibility: old.visibility.clone(),
            collapsed_edges: old.collapsed_edges.clone(),
            compiled: RefCell::new(None),
        }
    }

    pub fn delegate(&self) -> &Rc<dyn LinearGraph> {
        &self.delegate
    }

    pub fn visibility(&self) -> &NodeBitSet {
        &self.visibility
    }

    pub fn collapsed_edges(&self) -> &CollapsedEdges {
        &self.collapsed_edges
    }

    pub fn is_visible(&self, delegate_index: NodeIndex) -> bool {
        self.visibility.get(delegate_index)
    }

    /// Show or hide a delegate node. Invalidates the compiled view.
    ///
    /// # Panics
    ///
    /// Panics when `delegate_index` is outside the delegate graph.
    pub fn set_visible(&mut self, delegate_index: NodeIndex, visible: bool) {
        assert!(
            delegate_index < self.delegate.node_count(),
            "delegate index {delegate_index} out of range (node count {})",
            self.delegate.node_count()
        );
        self.visibility.set(delegate_index, visible);
        self.invalidate();
    }

    /// Mark every delegate node visible.
    pub fn set_all_visible(&mut self) {
        self.visibility = NodeBitSet::full(self.delegate.node_count());
        self.invalidate();
    }

    pub fn is_collapsed_edge(&self, up: NodeIndex, down: NodeIndex) -> bool {
        self.collapsed_edges.contains(up, down)
    }

    /// Register a synthetic dotted edge between two visible delegate nodes.
    ///
    /// # Panics
    ///
    /// Panics when either endpoint is hidden, or when `up >= down`.
    pub fn add_collapsed_edge(&mut self, up: NodeIndex, down: NodeIndex) {
        assert!(
            self.is_visible(up) && self.is_visible(down),
            "collapsed edge ({up}, {down}) must connect visible nodes"
        );
        if self.collapsed_edges.add(up, down) {
            self.invalidate();
        }
    }

    pub fn remove_collapsed_edge(&mut self, up: NodeIndex, down: NodeIndex) -> bool {
        let removed = self.collapsed_edges.remove(up, down);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Drop every synthetic edge.
    pub fn clear_collapsed_edges(&mut self) {
        if !self.collapsed_edges.is_empty() {
            self.collapsed_edges.clear();
            self.invalidate();
        }
    }

    /// The compiled (filtered) view. Rebuilt lazily after mutations; repeated
    /// calls between mutations return the same snapshot.
    pub fn compiled_graph(&self) -> Rc<CompiledGraph> {
        if let Some(compiled) = self.compiled.borrow().as_ref() {
            return compiled.clone();
        }
        let compiled = Rc::new(self.compile());
        *self.compiled.borrow_mut() = Some(compiled.clone());
        compiled
    }

    /// See [`CompiledGraph::to_delegate_index`].
    pub fn to_delegate_index(&self, compiled: NodeIndex) -> NodeIndex {
        self.compiled_graph().to_delegate_index(compiled)
    }

    /// See [`CompiledGraph::to_compiled_index`].
    pub fn to_compiled_index(&self, delegate: NodeIndex) -> Option<NodeIndex> {
        self.compiled_graph().to_compiled_index(delegate)
    }

    /// Translate an element of the compiled view into delegate-index space.
    /// Synthetic dotted edges have no delegate representation and yield
    /// `None`.
    ///
    /// # Panics
    ///
    /// Panics when the element references a compiled index outside the
    /// current compiled range.
    pub fn convert_to_delegate(&self, element: &GraphElement) -> Option<GraphElement> {
        match element {
            GraphElement::Node(node) => Some(GraphElement::Node(GraphNode {
                index: self.to_delegate_index(node.index),
                kind: node.kind,
            })),
            GraphElement::Edge(edge) => {
                let up = edge.up.map(|index| self.to_delegate_index(index));
                let down = edge.down.map(|index| self.to_delegate_index(index));
                if edge.kind == EdgeKind::Dotted {
                    if let (Some(up), Some(down)) = (up, down) {
                        if self.is_collapsed_edge(up, down) {
                            return None;
                        }
                    }
                }
                Some(GraphElement::Edge(GraphEdge {
                    up,
                    down,
                    target_id: edge.target_id,
                    kind: edge.kind,
                }))
            }
        }
    }

    fn compile(&self) -> CompiledGraph {
        let table = TranslationTable::build(&self.visibility, self.delegate.node_count());
        for (up, down) in self.collapsed_edges.iter() {
            assert!(
                table.to_compiled.get(up).copied().flatten().is_some()
                    && table.to_compiled.get(down).copied().flatten().is_some(),
                "collapsed edge ({up}, {down}) has a hidden endpoint"
            );
        }
        CompiledGraph {
            delegate: self.delegate.clone(),
            table,
            collapsed_edges: self.collapsed_edges.clone(),
        }
    }

    fn invalidate(&mut self) {
        *self.compiled.borrow_mut() = None;
    }
}

impl std::fmt::Debug for CollapsedGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapsedGraph")
            .field("delegate_nodes", &self.delegate.node_count())
            .field("visible_nodes", &self.visibility.count_set())
            .field("collapsed_edges", &self.collapsed_edges.len())
            .finish()
    }
}
