//! The commit-graph collapsing and filtering engine.
//!
//! The permanent graph is immutable; everything the user sees is a stack of
//! controllers, each filtering its delegate's compiled graph. See
//! [`controller::LinearGraphController`] for the chain protocol.

pub mod actions;
pub mod bitset;
pub mod branch_filter;
pub mod collapsed;
pub mod collapsed_controller;
pub mod controller;
pub mod linear;
pub mod permanent;
pub mod reachable;
pub mod walk;

pub use actions::{collapse_linear_branches, expand_all, expand_nodes};
pub use bitset::NodeBitSet;
pub use branch_filter::BranchFilterController;
pub use collapsed::{CollapsedGraph, CompiledGraph};
pub use collapsed_controller::CollapsedController;
pub use controller::{
    BaseController, EdgeChange, GraphAction, GraphActionKind, GraphAnswer, GraphChanges,
    LinearGraphController, NodeChange,
};
pub use linear::{
    EdgeFilter, EdgeKind, GraphEdge, GraphElement, GraphNode, LinearGraph, NodeId, NodeIndex,
};
pub use permanent::{PermanentGraphBuilder, PermanentGraphInfo};
pub use reachable::reachable_nodes;
pub use walk::{SortedNodeQueue, WalkDirection};
