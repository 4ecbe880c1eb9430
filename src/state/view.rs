//! Composition of the controller chain into a renderable row view.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::graph::{
    BaseController, BranchFilterController, CollapsedController, EdgeFilter, EdgeKind,
    GraphAction, GraphChanges, GraphEdge, GraphElement, GraphNode, LinearGraph,
    LinearGraphController, NodeId, NodeIndex, PermanentGraphInfo,
};

/// One visible row of the log, ready for rendering.
#[derive(Debug, Clone)]
pub struct GraphRow {
    pub row: NodeIndex,
    pub id: NodeId,
    pub short_id: Option<String>,
    pub summary: Option<String>,
    pub down_edges: Vec<RowEdge>,
}

/// An edge leaving a row downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowEdge {
    /// Target row, or `None` for edges truncated at the graph boundary.
    pub to_row: Option<NodeIndex>,
    pub kind: EdgeKind,
}

/// The full controller chain over one loaded repository: base, collapsing,
/// branch filter. The UI talks to this and nothing below it.
pub struct GraphView {
    permanent: Rc<PermanentGraphInfo>,
    controller: Box<dyn LinearGraphController>,
}

impl GraphView {
    pub fn new(
        permanent: Rc<PermanentGraphInfo>,
        visible_branch_ids: Option<HashSet<NodeId>>,
    ) -> Self {
        let base = BaseController::new(permanent.clone());
        let collapsing = CollapsedController::new(permanent.clone(), Box::new(base), None);
        let controller = BranchFilterController::new(
            permanent.clone(),
            Box::new(collapsing),
            visible_branch_ids,
        );
        debug!(
            nodes = permanent.node_count(),
            "built graph view controller chain"
        );
        GraphView {
            permanent,
            controller: Box::new(controller),
        }
    }

    pub fn permanent(&self) -> &Rc<PermanentGraphInfo> {
        &self.permanent
    }

    pub fn row_count(&self) -> usize {
        self.controller.compiled_graph().node_count()
    }

    /// The visible rows in display order, with commit metadata when the
    /// permanent graph carries it.
    pub fn visible_rows(&self) -> Vec<GraphRow> {
        let compiled = self.controller.compiled_graph();
        let permanent_graph = self.permanent.linear_graph();
        (0..compiled.node_count())
            .map(|row| {
                let id = compiled.node_id(row);
                let info = permanent_graph
                    .node_index(id)
                    .and_then(|index| self.permanent.commit_info(index));
                let down_edges = compiled
                    .adjacent_edges(row, EdgeFilter::Down)
                    .into_iter()
                    .map(|edge| RowEdge {
                        to_row: edge.down,
                        kind: edge.kind,
                    })
                    .collect();
                GraphRow {
                    row,
                    id,
                    short_id: info.map(|info| info.short_id.clone()),
                    summary: info.map(|info| info.summary.clone()),
                    down_edges,
                }
            })
            .collect()
    }

    /// Toggle collapse of the linear fragment headed at `row`. Returns
    /// whether the graph changed.
    pub fn click_row(&mut self, row: NodeIndex) -> bool {
        let action = GraphAction::click(GraphElement::Node(GraphNode::usual(row)));
        self.controller.perform_action(&action).changes.is_some()
    }

    /// Expand the dotted edge between two rows. Returns whether the graph
    /// changed (clicking anything but a dotted edge is a no-op).
    pub fn click_edge(&mut self, up_row: NodeIndex, down_row: NodeIndex) -> bool {
        let action = GraphAction::click(GraphElement::Edge(GraphEdge::dotted(up_row, down_row)));
        self.controller.perform_action(&action).changes.is_some()
    }

    pub fn collapse_linear_branches(&mut self) -> bool {
        self.controller
            .perform_action(&GraphAction::collapse_all())
            .changes
            .is_some()
    }

    pub fn expand_all(&mut self) -> bool {
        self.controller
            .perform_action(&GraphAction::expand_all())
            .changes
            .is_some()
    }

    /// Apply an upstream "commits changed" notification to the whole chain.
    pub fn commits_changed(&mut self, changes: GraphChanges) -> bool {
        self.controller
            .delegate_graph_changed(crate::graph::GraphAnswer::changed(changes))
            .changes
            .is_some()
    }
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("rows", &self.row_count())
            .finish()
    }
}
