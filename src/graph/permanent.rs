//! The permanent graph: the full, immutable set of loaded commits.
//!
//! Built once per loading session and shared read-only by every controller
//! layered on top of it. Node indices follow the insertion order of the
//! builder, which must feed commits children-first (a topological revwalk
//! does); node ids are interned in first-reference order, so a parent that is
//! referenced before it is loaded already has an id. Parents never loaded at
//! all keep their id and show up as [`EdgeKind::NotLoaded`] edges.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use tracing::debug;

use crate::graph::bitset::NodeBitSet;
use crate::graph::linear::{EdgeFilter, GraphEdge, LinearGraph, NodeId, NodeIndex};
use crate::graph::reachable::reachable_nodes;
use crate::models::CommitInfo;

/// Adjacency-list implementation of [`LinearGraph`] for the permanent graph.
#[derive(Debug, Default)]
pub struct PermanentLinearGraph {
    node_ids: Vec<NodeId>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    /// Per node: edges to its parents, including truncated ones.
    down_edges: Vec<Vec<GraphEdge>>,
    /// Per node: indices of its children.
    up_nodes: Vec<Vec<NodeIndex>>,
}

impl LinearGraph for PermanentLinearGraph {
    fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    fn node_id(&self, index: NodeIndex) -> NodeId {
        self.node_ids[index]
    }

    fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    fn adjacent_edges(&self, index: NodeIndex, filter: EdgeFilter) -> Vec<GraphEdge> {
        assert!(
            index < self.node_count(),
            "node index {index} out of range (node count {})",
            self.node_count()
        );
        let mut edges = Vec::new();
        if filter.wants_up() {
            edges.extend(
                self.up_nodes[index]
                    .iter()
                    .map(|&child| GraphEdge::usual(child, index)),
            );
        }
        if filter.wants_down() {
            edges.extend(self.down_edges[index].iter().copied());
        }
        edges
    }
}

/// The immutable source of truth a controller chain is built over.
#[derive(Debug)]
pub struct PermanentGraphInfo {
    graph: Rc<PermanentLinearGraph>,
    commits: Vec<CommitInfo>,
    id_by_hash: HashMap<String, NodeId>,
}

impl PermanentGraphInfo {
    pub fn linear_graph(&self) -> Rc<dyn LinearGraph> {
        self.graph.clone()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Reachability helper: the indices reachable from the given root ids by
    /// following child edges downward. `None` means every node.
    pub fn reachable_from(
        &self,
        root_ids: Option<&std::collections::HashSet<NodeId>>,
    ) -> NodeBitSet {
        reachable_nodes(self.graph.as_ref(), root_ids)
    }

    /// Commit metadata for the node at `index`, when the graph was loaded from
    /// a repository. Synthetic graphs carry no metadata.
    pub fn commit_info(&self, index: NodeIndex) -> Option<&CommitInfo> {
        self.commits.get(index)
    }

    /// Resolve a full commit hash to its stable id.
    pub fn id_for_commit(&self, hash: &str) -> Option<NodeId> {
        self.id_by_hash.get(hash).copied()
    }

    /// Attach per-commit metadata, in node-index order.
    ///
    /// # Panics
    ///
    /// Panics when the metadata length disagrees with the node count.
    pub fn with_commits(mut self, commits: Vec<CommitInfo>) -> Self {
        assert_eq!(
            commits.len(),
            self.graph.node_count(),
            "commit metadata must cover every loaded node"
        );
        self.id_by_hash = commits
            .iter()
            .enumerate()
            .map(|(index, commit)| (commit.id.clone(), self.graph.node_id(index)))
            .collect();
        self.commits = commits;
        self
    }
}

/// Builds a [`PermanentGraphInfo`] from `(commit, parents)` rows fed
/// children-first.
#[derive(Debug)]
pub struct PermanentGraphBuilder<K> {
    interned: HashMap<K, NodeId>,
    rows: Vec<(NodeId, Vec<NodeId>)>,
}

impl<K: Eq + Hash + Clone> PermanentGraphBuilder<K> {
    pub fn new() -> Self {
        PermanentGraphBuilder {
            interned: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn intern(&mut self, key: &K) -> NodeId {
        let next_id = self.interned.len() as NodeId;
        *self.interned.entry(key.clone()).or_insert(next_id)
    }

    /// Append a commit row. Rows must arrive children-first: a commit may
    /// reference parents that come later (or never), but not the other way
    /// around.
    pub fn add_commit(&mut self, key: K, parents: &[K]) {
        let id = self.intern(&key);
        let parent_ids = parents.iter().map(|parent| self.intern(parent)).collect();
        self.rows.push((id, parent_ids));
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// # Panics
    ///
    /// Panics when the rows are not in topological (children-first) order or
    /// when the same commit was added twice.
    pub fn build(self) -> PermanentGraphInfo {
        let mut id_to_index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(self.rows.len());
        for (index, (id, _)) in self.rows.iter().enumerate() {
            let previous = id_to_index.insert(*id, index);
            assert!(previous.is_none(), "commit id {id} added twice");
        }

        let node_count = self.rows.len();
        let mut node_ids = Vec::with_capacity(node_count);
        let mut down_edges: Vec<Vec<GraphEdge>> = vec![Vec::new(); node_count];
        let mut up_nodes: Vec<Vec<NodeIndex>> = vec![Vec::new(); node_count];

        for (index, (id, parent_ids)) in self.rows.iter().enumerate() {
            node_ids.push(*id);
            for parent_id in parent_ids {
                match id_to_index.get(parent_id) {
                    Some(&parent_index) => {
                        assert!(
                            parent_index > index,
                            "rows out of topological order: parent {parent_id} \
                             (index {parent_index}) above child {id} (index {index})"
                        );
                        down_edges[index].push(GraphEdge::usual(index, parent_index));
                        up_nodes[parent_index].push(index);
                    }
                    None => {
                        down_edges[index].push(GraphEdge::not_loaded(index, *parent_id));
                    }
                }
            }
        }

        debug!(
            nodes = node_count,
            ids = self.interned.len(),
            "built permanent graph"
        );
        PermanentGraphInfo {
            graph: Rc::new(PermanentLinearGraph {
                node_ids,
                id_to_index,
                down_edges,
                up_nodes,
            }),
            commits: Vec::new(),
            id_by_hash: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Default for PermanentGraphBuilder<K> {
    fn default() -> Self {
        PermanentGraphBuilder::new()
    }
}
