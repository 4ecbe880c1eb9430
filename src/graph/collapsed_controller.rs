//! The collapsing layer of the controller chain.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::graph::actions;
use crate::graph::collapsed::CollapsedGraph;
use crate::graph::controller::{
    CascadeLayer, GraphAction, GraphAnswer, LinearGraphController,
};
use crate::graph::linear::{GraphElement, LinearGraph, NodeId, NodeIndex};
use crate::graph::permanent::PermanentGraphInfo;
use crate::graph::reachable::reachable_nodes;

/// Owns a [`CollapsedGraph`] over its delegate's compiled graph and
/// interprets expand/collapse gestures against it.
///
/// When the delegate reports changes, the collapsed graph is rebound to the
/// delegate's fresh compiled graph and every node or edge endpoint named in
/// the changes (unless removed) is re-shown: newly arrived content must never
/// start out hidden inside a collapsed region.
pub struct CollapsedController {
    permanent: Rc<PermanentGraphInfo>,
    delegate: Box<dyn LinearGraphController>,
    collapsed: CollapsedGraph,
}

impl CollapsedController {
    /// Initial visibility is the reachable set of `visible_branch_ids` over
    /// the delegate's compiled graph; `None` shows everything.
    pub fn new(
        permanent: Rc<PermanentGraphInfo>,
        delegate: Box<dyn LinearGraphController>,
        visible_branch_ids: Option<&HashSet<NodeId>>,
    ) -> Self {
        let delegate_graph = delegate.compiled_graph();
        let visibility = reachable_nodes(delegate_graph.as_ref(), visible_branch_ids);
        let collapsed = CollapsedGraph::new_instance(delegate_graph, visibility);
        CollapsedController {
            permanent,
            delegate,
            collapsed,
        }
    }

    pub fn collapsed_graph(&self) -> &CollapsedGraph {
        &self.collapsed
    }
}

impl CascadeLayer for CollapsedController {
    fn delegate_mut(&mut self) -> &mut dyn LinearGraphController {
        self.delegate.as_mut()
    }

    fn try_perform(&mut self, action: &GraphAction) -> Option<GraphAnswer> {
        actions::perform_action(&mut self.collapsed, action)
    }

    fn reconcile(&mut self, delegate_answer: GraphAnswer) -> GraphAnswer {
        let Some(changes) = delegate_answer.changes.as_ref() else {
            return delegate_answer;
        };

        self.collapsed =
            CollapsedGraph::update_instance(&self.collapsed, self.delegate.compiled_graph());

        let delegate_graph = self.collapsed.delegate().clone();
        let mut to_show: Vec<NodeIndex> = Vec::new();
        for change in &changes.nodes {
            if change.removed {
                continue;
            }
            if let Some(index) = delegate_graph.node_index(change.id) {
                to_show.push(index);
            }
        }
        for change in &changes.edges {
            if change.removed {
                continue;
            }
            for id in [change.up_id, change.down_id].into_iter().flatten() {
                if let Some(index) = delegate_graph.node_index(id) {
                    to_show.push(index);
                }
            }
        }
        if !to_show.is_empty() {
            actions::expand_nodes(&mut self.collapsed, to_show);
        }
        debug!(
            permanent_nodes = self.permanent.node_count(),
            visible = self.collapsed.visibility().count_set(),
            "reconciled collapsing layer after delegate change"
        );
        delegate_answer
    }

    fn convert_element(&self, element: &GraphElement) -> Option<GraphElement> {
        self.collapsed.convert_to_delegate(element)
    }
}

impl LinearGraphController for CollapsedController {
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

impl std::fmt::Debug for CollapsedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapsedController")
            .field("collapsed", &self.collapsed)
            .finish()
    }
}
