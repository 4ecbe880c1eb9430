//! The branch-filtering layer of the controller chain.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::graph::collapsed::CollapsedGraph;
use crate::graph::controller::{
    CascadeLayer, GraphAction, GraphAnswer, LinearGraphController,
};
use crate::graph::linear::{GraphElement, LinearGraph, NodeId};
use crate::graph::permanent::PermanentGraphInfo;
use crate::graph::reachable::reachable_nodes;

/// Restricts the view to the commits reachable from a fixed set of branch
/// heads.
///
/// The head set is immutable for the controller's lifetime; changing the
/// filter means building a new controller. This layer never interprets
/// gestures, and on every delegate change it recomputes its visibility from
/// scratch rather than patching incrementally: the recompute is rare next to
/// collapse toggling, and starting over cannot drift out of sync.
pub struct BranchFilterController {
    permanent: Rc<PermanentGraphInfo>,
    delegate: Box<dyn LinearGraphController>,
    visible_branch_ids: Option<HashSet<NodeId>>,
    collapsed: CollapsedGraph,
}

impl BranchFilterController {
    /// `None` branch ids disable the filter; an empty set hides everything.
    pub fn new(
        permanent: Rc<PermanentGraphInfo>,
        delegate: Box<dyn LinearGraphController>,
        visible_branch_ids: Option<HashSet<NodeId>>,
    ) -> Self {
        let collapsed = Self::filtered_graph(&*delegate, visible_branch_ids.as_ref());
        BranchFilterController {
            permanent,
            delegate,
            visible_branch_ids,
            collapsed,
        }
    }

    fn filtered_graph(
        delegate: &dyn LinearGraphController,
        visible_branch_ids: Option<&HashSet<NodeId>>,
    ) -> CollapsedGraph {
        let delegate_graph = delegate.compiled_graph();
        let visibility = reachable_nodes(delegate_graph.as_ref(), visible_branch_ids);
        CollapsedGraph::new_instance(delegate_graph, visibility)
    }
}

impl CascadeLayer for BranchFilterController {
    fn delegate_mut(&mut self) -> &mut dyn LinearGraphController {
        self.delegate.as_mut()
    }

    fn try_perform(&mut self, _action: &GraphAction) -> Option<GraphAnswer> {
        // A pure filter: every gesture belongs to some other layer.
        None
    }

    fn reconcile(&mut self, delegate_answer: GraphAnswer) -> GraphAnswer {
        if delegate_answer.changes.is_none() {
            return delegate_answer;
        }
        self.collapsed = Self::filtered_graph(&*self.delegate, self.visible_branch_ids.as_ref());
        debug!(
            permanent_nodes = self.permanent.node_count(),
            visible = self.collapsed.visibility().count_set(),
            "recomputed branch-filter visibility after delegate change"
        );
        delegate_answer
    }

    fn convert_element(&self, element: &GraphElement) -> Option<GraphElement> {
        self.collapsed.convert_to_delegate(element)
    }
}

impl LinearGraphController for BranchFilterController {
    fn compiled_graph(&self) -> Rc<dyn LinearGraph> {
        self.collapsed.compiled_graph()
    }

    fn perform_action(&mut self, action: &GraphAction) -> GraphAnswer {
        self.cascade_perform(action)
    }

    fn delegate_graph_changed(&mut self, answer: GraphAnswer) -> GraphAnswer {
        self.cascade_graph_changed(answer)
    }

    fn convert_to_delegate(&self, element: &GraphElement) -> Option<GraphElement> {
        self.convert_element(element)
    }
}

impl std::fmt::Debug for BranchFilterController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchFilterController")
            .field("visible_branch_ids", &self.visible_branch_ids)
            .field("collapsed", &self.collapsed)
            .finish()
    }
}
