//! Controller chain over a permanent graph.
//!
//! Controllers compose child-to-parent: each one wraps a delegate controller
//! and contributes one transformation (collapsing, branch filtering) over the
//! delegate's compiled graph. User gestures enter at the outermost layer and
//! cascade downward until some layer handles them; the resulting answer then
//! drives reconciliation on the way back up, so `compiled_graph` never
//! exposes a torn view.

use std::rc::Rc;

use crate::graph::linear::{GraphElement, LinearGraph, NodeId};
use crate::graph::permanent::PermanentGraphInfo;

/// A user gesture, in the index space of the controller receiving it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphAction {
    /// What was clicked or hovered; `None` for graph-wide gestures.
    pub affected: Option<GraphElement>,
    pub kind: GraphActionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphActionKind {
    MouseClick,
    MouseOver,
    /// Collapse every linear branch.
    CollapseAll,
    /// Reveal everything hidden by collapsing.
    ExpandAll,
}

impl GraphAction {
    pub fn click(element: GraphElement) -> Self {
        GraphAction {
            affected: Some(element),
            kind: GraphActionKind::MouseClick,
        }
    }

    pub fn collapse_all() -> Self {
        GraphAction {
            affected: None,
            kind: GraphActionKind::CollapseAll,
        }
    }

    pub fn expand_all() -> Self {
        GraphAction {
            affected: None,
            kind: GraphActionKind::ExpandAll,
        }
    }
}

/// A changed node, in stable id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeChange {
    pub id: NodeId,
    pub removed: bool,
}

/// A changed edge, in stable id space. Truncated ends stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeChange {
    pub up_id: Option<NodeId>,
    pub down_id: Option<NodeId>,
    pub removed: bool,
}

/// What changed in a graph, expressed in permanent-graph node ids so the
/// description survives index renumbering between layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphChanges {
    pub nodes: Vec<NodeChange>,
    pub edges: Vec<EdgeChange>,
}

impl GraphChanges {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&mut self, id: NodeId, removed: bool) {
        self.nodes.push(NodeChange { id, removed });
    }

    pub fn edge(&mut self, up_id: Option<NodeId>, down_id: Option<NodeId>, removed: bool) {
        self.edges.push(EdgeChange {
            up_id,
            down_id,
            removed,
        });
    }
}

/// The outcome of an action or change notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphAnswer {
    /// `None` means the graph did not change.
    pub changes: Option<GraphChanges>,
}

impl GraphAnswer {
    pub fn unchanged() -> Self {
        GraphAnswer { changes: None }
    }

    pub fn changed(changes: GraphChanges) -> Self {
        GraphAnswer {
            changes: Some(changes),
        }
    }
}

/// One layer of the controller chain.
pub trait LinearGraphController {
    /// The fully reconciled filtered graph this layer exposes upward.
    fn compiled_graph(&self) -> Rc<dyn LinearGraph>;

    /// Handle a user gesture expressed in this layer's index space,
    /// cascading to the delegate when this layer declines it.
    fn perform_action(&mut self, action: &GraphAction) -> GraphAnswer;

    /// React to a change of the underlying graph. The notification travels to
    /// the innermost layer first; each layer then reconciles against its
    /// delegate's fresh compiled graph on the way back up.
    fn delegate_graph_changed(&mut self, answer: GraphAnswer) -> GraphAnswer;

    /// Translate an element of this layer's compiled graph into the immediate
    /// delegate's index space, or `None` when the element is purely synthetic.
    fn convert_to_delegate(&self, element: &GraphElement) -> Option<GraphElement>;
}

/// Innermost layer: exposes the permanent graph unchanged and terminates the
/// cascade.
#[derive(Debug)]
pub struct BaseController {
    permanent: Rc<PermanentGraphInfo>,
}

impl BaseController {
    pub fn new(permanent: Rc<PermanentGraphInfo>) -> Self {
        BaseController { permanent }
    }
}

impl LinearGraphController for BaseController {
    fn compiled_graph(&self) -> Rc<dyn LinearGraph> {
        self.permanent.linear_graph()
    }

    fn perform_action(&mut self, _action: &GraphAction) -> GraphAnswer {
        GraphAnswer::unchanged()
    }

    fn delegate_graph_changed(&mut self, answer: GraphAnswer) -> GraphAnswer {
        answer
    }

    fn convert_to_delegate(&self, element: &GraphElement) -> Option<GraphElement> {
        Some(*element)
    }
}

/// The shared cascade protocol of the controllers that wrap a delegate.
///
/// Implementors provide the layer-specific pieces; the provided methods are
/// the protocol itself and back the [`LinearGraphController`] impls.
pub(crate) trait CascadeLayer {
    fn delegate_mut(&mut self) -> &mut dyn LinearGraphController;

    /// Layer-specific action handling; `None` declines the action.
    fn try_perform(&mut self, action: &GraphAction) -> Option<GraphAnswer>;

    /// Rebuild this layer against the delegate's current compiled graph and
    /// return the answer to propagate upward.
    fn reconcile(&mut self, delegate_answer: GraphAnswer) -> GraphAnswer;

    fn convert_element(&self, element: &GraphElement) -> Option<GraphElement>;

    fn cascade_perform(&mut self, action: &GraphAction) -> GraphAnswer {
        if let Some(answer) = self.try_perform(action) {
            return answer;
        }
        let delegate_action = GraphAction {
            affected: action
                .affected
                .as_ref()
                .and_then(|element| self.convert_element(element)),
            kind: action.kind,
        };
        let delegate_answer = self.delegate_mut().perform_action(&delegate_action);
        self.reconcile(delegate_answer)
    }

    fn cascade_graph_changed(&mut self, answer: GraphAnswer) -> GraphAnswer {
        let delegate_answer = self.delegate_mut().delegate_graph_changed(answer);
        self.reconcile(delegate_answer)
    }
}
