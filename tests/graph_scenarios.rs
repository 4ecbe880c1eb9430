//! End-to-end scenarios for the collapsing/filtering engine on synthetic
//! graphs, plus property-based checks over randomly generated DAGs.

use std::collections::HashSet;
use std::rc::Rc;

use proptest::prelude::*;
use test_case::test_case;

use gitk_graph::graph::{
    collapse_linear_branches, expand_nodes, reachable_nodes, BaseController,
    BranchFilterController, CollapsedController, CollapsedGraph, EdgeFilter, EdgeKind, GraphEdge,
    LinearGraph, LinearGraphController, NodeBitSet, NodeId, PermanentGraphBuilder,
    PermanentGraphInfo,
};
use gitk_graph::state::GraphView;

/// Build a permanent graph from per-node parent lists; node keys are the
/// positions, so the rows are children-first by construction.
fn build_graph(parents: &[Vec<u32>]) -> Rc<PermanentGraphInfo> {
    let mut builder = PermanentGraphBuilder::new();
    for (key, node_parents) in parents.iter().enumerate() {
        let mut node_parents = node_parents.clone();
        node_parents.sort_unstable();
        node_parents.dedup();
        builder.add_commit(key as u32, &node_parents);
    }
    Rc::new(builder.build())
}

fn chain(len: usize) -> Rc<PermanentGraphInfo> {
    let parents: Vec<Vec<u32>> = (0..len)
        .map(|key| {
            if key + 1 < len {
                vec![key as u32 + 1]
            } else {
                vec![]
            }
        })
        .collect();
    build_graph(&parents)
}

/// Structural snapshot of a compiled graph, for equality checks.
fn snapshot(graph: &dyn LinearGraph) -> Vec<(NodeId, Vec<GraphEdge>)> {
    (0..graph.node_count())
        .map(|index| (graph.node_id(index), graph.adjacent_edges(index, EdgeFilter::All)))
        .collect()
}

#[test]
fn linear_chain_collapse_scenario() {
    // Nodes 0..=4 chained; 1, 2, 3 hidden behind the collapsed edge (0, 4).
    let permanent = chain(5);
    let mut graph = CollapsedGraph::new_instance(
        permanent.linear_graph(),
        [0usize, 4].into_iter().collect::<NodeBitSet>(),
    );
    graph.add_collapsed_edge(0, 4);

    let compiled = graph.compiled_graph();
    assert_eq!(compiled.node_count(), 2);
    assert_eq!(compiled.to_delegate_index(0), 0);
    assert_eq!(compiled.to_delegate_index(1), 4);

    // Exactly one edge between the two rows: the synthetic one, not 0 -> 1.
    let edges = compiled.adjacent_edges(0, EdgeFilter::All);
    assert_eq!(edges, vec![GraphEdge::dotted(0, 1)]);
    let edges = compiled.adjacent_edges(1, EdgeFilter::All);
    assert_eq!(edges, vec![GraphEdge::dotted(0, 1)]);
}

#[test]
fn expand_after_collapse_scenario() {
    let permanent = chain(5);
    let mut graph = CollapsedGraph::new_instance(
        permanent.linear_graph(),
        [0usize, 4].into_iter().collect::<NodeBitSet>(),
    );
    graph.add_collapsed_edge(0, 4);

    expand_nodes(&mut graph, [2]);

    let compiled = graph.compiled_graph();
    assert!(graph.is_visible(2));
    assert_eq!(compiled.to_compiled_index(2), Some(1));
    // The old edge no longer masks the path through 2.
    assert!(!graph.is_collapsed_edge(0, 4));
    let down_of_top: Vec<_> = compiled.adjacent_edges(0, EdgeFilter::Down);
    assert_eq!(down_of_top, vec![GraphEdge::dotted(0, 1)]);
}

#[test]
fn branch_filter_with_empty_set_yields_zero_nodes() {
    let permanent = chain(4);
    let base = BaseController::new(permanent.clone());
    let collapsing = CollapsedController::new(permanent.clone(), Box::new(base), None);
    let filter = BranchFilterController::new(
        permanent.clone(),
        Box::new(collapsing),
        Some(HashSet::new()),
    );
    assert_eq!(filter.compiled_graph().node_count(), 0);
}

#[test_case(3 => 2; "three nodes leave the endpoints")]
#[test_case(5 => 2; "five nodes leave the endpoints")]
#[test_case(2 => 2; "two nodes have no interior")]
#[test_case(1 => 1; "a single node is untouched")]
fn collapsing_a_chain_keeps_the_endpoints(len: usize) -> usize {
    let mut view = GraphView::new(chain(len), None);
    view.collapse_linear_branches();
    view.row_count()
}

#[test]
fn merge_points_survive_collapse_all() {
    // 0 -> 1 -> 3, 0 -> 2 -> 3 -> 4 -> 5: the fork 0, the join 3 and the
    // single-child runs in between.
    let permanent = build_graph(&[vec![1, 2], vec![3], vec![3], vec![4], vec![5], vec![]]);
    let mut view = GraphView::new(permanent.clone(), None);
    view.collapse_linear_branches();

    let graph = permanent.linear_graph();
    let rows = view.visible_rows();
    let visible_ids: Vec<NodeId> = rows.iter().map(|row| row.id).collect();
    // Fork and join stay; the 3 -> 4 -> 5 run folds.
    assert!(visible_ids.contains(&graph.node_id(0)));
    assert!(visible_ids.contains(&graph.node_id(3)));
    assert!(visible_ids.contains(&graph.node_id(5)));
    assert!(!visible_ids.contains(&graph.node_id(4)));
}

fn dag_strategy() -> impl Strategy<Value = Vec<Vec<u32>>> {
    (2u32..20).prop_flat_map(|len| {
        (0..len)
            .map(|node| {
                if node + 1 < len {
                    proptest::collection::vec(node + 1..len, 0..3).boxed()
                } else {
                    Just(Vec::new()).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn reachability_is_closed_and_grounded(parents in dag_strategy()) {
        let permanent = build_graph(&parents);
        let graph = permanent.linear_graph();

        // Roots: every node without children, by id.
        let roots: HashSet<NodeId> = (0..graph.node_count())
            .filter(|&index| graph.up_nodes(index).is_empty())
            .map(|index| graph.node_id(index))
            .collect();
        let reachable = reachable_nodes(graph.as_ref(), Some(&roots));

        for index in 0..graph.node_count() {
            if reachable.get(index) {
                // Grounded: a member is a root or has a member above it.
                let is_root = roots.contains(&graph.node_id(index));
                let has_member_above =
                    graph.up_nodes(index).iter().any(|&up| reachable.get(up));
                prop_assert!(is_root || has_member_above);
                // Closed: everything below a member is a member.
                for down in graph.down_nodes(index) {
                    prop_assert!(reachable.get(down));
                }
            }
        }
        // Heads have no parents, so every node is below some head.
        prop_assert_eq!(reachable.count_set(), graph.node_count());
    }

    #[test]
    fn no_roots_means_identity_visibility(parents in dag_strategy()) {
        let permanent = build_graph(&parents);
        let graph = permanent.linear_graph();
        let reachable = reachable_nodes(graph.as_ref(), None);
        prop_assert_eq!(reachable.count_set(), graph.node_count());
    }

    #[test]
    fn compiled_view_matches_the_visibility_bitset(
        parents in dag_strategy(),
        seed in any::<u64>(),
    ) {
        let permanent = build_graph(&parents);
        let graph = permanent.linear_graph();
        let visibility: NodeBitSet = (0..graph.node_count())
            .filter(|&index| seed >> (index % 64) & 1 == 1)
            .collect();

        let collapsed = CollapsedGraph::new_instance(graph.clone(), visibility.clone());
        let compiled = collapsed.compiled_graph();

        prop_assert_eq!(compiled.node_count(), visibility.count_set());
        for (compiled_index, delegate_index) in visibility.iter_set().enumerate() {
            // Same relative order, and translation round-trips.
            prop_assert_eq!(compiled.node_id(compiled_index), graph.node_id(delegate_index));
            prop_assert_eq!(compiled.to_delegate_index(compiled_index), delegate_index);
            prop_assert_eq!(compiled.to_compiled_index(delegate_index), Some(compiled_index));
        }
    }

    #[test]
    fn expanding_twice_equals_expanding_once(parents in dag_strategy()) {
        let permanent = build_graph(&parents);
        let graph = permanent.linear_graph();
        let mut collapsed =
            CollapsedGraph::new_instance(graph.clone(), NodeBitSet::full(graph.node_count()));
        collapse_linear_branches(&mut collapsed);

        let hidden: Vec<usize> = (0..graph.node_count())
            .filter(|&index| !collapsed.is_visible(index))
            .collect();

        expand_nodes(&mut collapsed, hidden.iter().copied());
        let once = snapshot(&*collapsed.compiled_graph());
        expand_nodes(&mut collapsed, hidden.iter().copied());
        let twice = snapshot(&*collapsed.compiled_graph());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn collapse_then_expand_all_restores_the_full_view(parents in dag_strategy()) {
        let permanent = build_graph(&parents);
        let mut view = GraphView::new(permanent.clone(), None);
        let before: Vec<NodeId> = view.visible_rows().iter().map(|row| row.id).collect();

        view.collapse_linear_branches();
        view.expand_all();

        let after: Vec<NodeId> = view.visible_rows().iter().map(|row| row.id).collect();
        prop_assert_eq!(before, after);
        let has_dotted = view
            .visible_rows()
            .iter()
            .any(|row| row.down_edges.iter().any(|edge| edge.kind == EdgeKind::Dotted));
        prop_assert!(!has_dotted);
    }
}
