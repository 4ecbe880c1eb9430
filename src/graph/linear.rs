//! Read-only contract for a linear commit graph.
//!
//! A linear graph is a directed acyclic graph whose nodes carry both a stable
//! id and a dense display index. Indices follow the row order of the log view:
//! children sit above their parents, so every normal edge runs from a lower
//! index (the upper end) down to a higher index (the lower end). Ids survive
//! filtering and collapsing; indices are view-local.

/// Dense position of a node inside one particular graph view.
pub type NodeIndex = usize;

/// Stable identifier of a commit, shared by every view layered over the same
/// permanent graph.
pub type NodeId = u32;

/// Which adjacency lists a [`LinearGraph::adjacent_edges`] call should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeFilter {
    /// Edges arriving from above (the node is the lower end).
    Up,
    /// Edges leaving downward (the node is the upper end).
    Down,
    /// Both directions.
    All,
}

impl EdgeFilter {
    pub fn wants_up(self) -> bool {
        matches!(self, EdgeFilter::Up | EdgeFilter::All)
    }

    pub fn wants_down(self) -> bool {
        matches!(self, EdgeFilter::Down | EdgeFilter::All)
    }
}

/// Visual/semantic classification of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A real parent link between two loaded commits.
    Usual,
    /// A synthetic edge standing in for a hidden chain of commits.
    Dotted,
    /// An edge leading to a commit outside the loaded range; the missing end
    /// is identified by [`GraphEdge::target_id`].
    NotLoaded,
}

impl EdgeKind {
    /// Normal edges are the ones that exist in the underlying commit data.
    pub fn is_normal(self) -> bool {
        matches!(self, EdgeKind::Usual)
    }
}

/// Classification of a node row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A loaded commit.
    Usual,
    /// A placeholder row for a commit outside the loaded range.
    NotLoaded,
}

/// A node of a linear graph, in the index space of the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphNode {
    pub index: NodeIndex,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn usual(index: NodeIndex) -> Self {
        GraphNode {
            index,
            kind: NodeKind::Usual,
        }
    }
}

/// An edge of a linear graph, in the index space of the graph that produced it.
///
/// Either endpoint may be absent when the edge is truncated at the graph
/// boundary; a truncated edge names the missing commit via `target_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    /// The upper (lower-index) endpoint, if loaded.
    pub up: Option<NodeIndex>,
    /// The lower (higher-index) endpoint, if loaded.
    pub down: Option<NodeIndex>,
    /// Stable id of the missing end for truncated edges.
    pub target_id: Option<NodeId>,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn usual(up: NodeIndex, down: NodeIndex) -> Self {
        GraphEdge {
            up: Some(up),
            down: Some(down),
            target_id: None,
            kind: EdgeKind::Usual,
        }
    }

    pub fn dotted(up: NodeIndex, down: NodeIndex) -> Self {
        GraphEdge {
            up: Some(up),
            down: Some(down),
            target_id: None,
            kind: EdgeKind::Dotted,
        }
    }

    pub fn not_loaded(up: NodeIndex, target_id: NodeId) -> Self {
        GraphEdge {
            up: Some(up),
            down: None,
            target_id: Some(target_id),
            kind: EdgeKind::NotLoaded,
        }
    }

    /// The loaded endpoint opposite to `node`, if any.
    pub fn other_end(&self, node: NodeIndex) -> Option<NodeIndex> {
        match (self.up, self.down) {
            (Some(up), _) if up != node => Some(up),
            (_, Some(down)) if down != node => Some(down),
            _ => None,
        }
    }
}

/// What the user clicked, or what a change affected: a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphElement {
    Node(GraphNode),
    Edge(GraphEdge),
}

/// Read-only view of a directed graph over dense integer node indices.
pub trait LinearGraph {
    fn node_count(&self) -> usize;

    /// Stable id of the node at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside `[0, node_count)`.
    fn node_id(&self, index: NodeIndex) -> NodeId;

    /// Index of the node with the given id, or `None` when the id does not
    /// resolve in this view (not loaded, or filtered out).
    fn node_index(&self, id: NodeId) -> Option<NodeIndex>;

    /// Edges incident on the node at `index`, restricted by `filter`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is outside `[0, node_count)`.
    fn adjacent_edges(&self, index: NodeIndex, filter: EdgeFilter) -> Vec<GraphEdge>;

    /// Loaded nodes directly below `index`.
    fn down_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.adjacent_edges(index, EdgeFilter::Down)
            .into_iter()
            .filter_map(|edge| edge.down)
            .collect()
    }

    /// Loaded nodes directly above `index`.
    fn up_nodes(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.adjacent_edges(index, EdgeFilter::Up)
            .into_iter()
            .filter_map(|edge| edge.up)
            .collect()
    }
}
