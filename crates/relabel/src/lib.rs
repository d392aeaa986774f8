//! Node relabeling: in-place rewriting (a disjoint-label fast path and a
//! cycle-checked reverse-topological rewrite for overlapping labels) and
//! copy-mode relabeling, plus integer-label conversion.

mod mapping;
mod topo;

use core::cmp::Reverse;
use core::fmt;
use core::hash::Hash;

use attrgraph_core::{AttrMap, AttrValue, GraphError, Result};
use attrgraph_graph::RelabelSupport;
use indexmap::IndexSet;
use fxhash::FxBuildHasher;
#[cfg(feature = "tracing")]
use tracing::trace;

pub use mapping::Mapping;

/// Node ordering strategies for [`convert_node_labels_to_integers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// The graph's own node insertion order.
    Default,
    /// Sorted by the node label's `Ord` implementation.
    Sorted,
    IncreasingDegree,
    DecreasingDegree,
}

/// The graph-level attribute [`convert_node_labels_to_integers`] stashes the
/// original labels under when `discard_old` is `false`.
pub const OLD_LABELS_ATTR: &str = "attrgraph_old_labels";

fn rewrite_endpoint<N: Clone + PartialEq>(n: &N, old: &N, new: &N) -> N {
    if n == old {
        new.clone()
    } else {
        n.clone()
    }
}

/// Rewrites a single node's label in place: adds `new` with `old`'s
/// attributes, re-adds every edge incident to `old` with endpoints
/// substituted, then removes `old`. A no-op (besides an existence check)
/// when `old == new`.
fn rewrite_node_in_place<N, G>(graph: &mut G, old: &N, new: &N) -> Result<()>
where
    N: Clone + Eq + Hash + Ord,
    G: RelabelSupport<N>,
{
    if old == new {
        return if graph.relabel_has_node(old) {
            Ok(())
        } else {
            Err(error_stack::Report::new(GraphError::node_not_found(old)))
        };
    }
    let attr = graph
        .relabel_node_attr(old)
        .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(old)))?;
    graph.relabel_add_node(new.clone(), attr);
    let incident = graph.relabel_incident_edges(old);
    graph.relabel_remove_node(old)?;
    for edge in incident {
        let source = rewrite_endpoint(&edge.source, old, new);
        let target = rewrite_endpoint(&edge.target, old, new);
        graph.relabel_add_edge_raw(source, target, edge.key, edge.attr);
    }
    Ok(())
}

/// Builds an independent copy: every edge of `graph` with endpoints
/// rewritten via `mapping` (identity for nodes `mapping` doesn't name),
/// then every node (so isolated nodes survive too). The result's name is
/// the original name wrapped in parentheses.
fn relabel_nodes_copy<N, G>(graph: &G, mapping: &Mapping<N>) -> G
where
    N: Clone + Eq + Hash + Ord,
    G: RelabelSupport<N>,
{
    let translate = |n: &N| mapping.get(n).cloned().unwrap_or_else(|| n.clone());
    let mut result = G::relabel_new_empty(graph.relabel_graph_attr());
    for edge in graph.relabel_all_edges() {
        let source = translate(&edge.source);
        let target = translate(&edge.target);
        result.relabel_add_edge_raw(source, target, edge.key, edge.attr);
    }
    for n in graph.relabel_nodes_vec() {
        let new_label = translate(&n);
        let attr = graph.relabel_node_attr(&n).unwrap_or_default();
        result.relabel_add_node(new_label, attr);
    }
    let wrapped = format!("({})", graph.relabel_name().unwrap_or_default());
    result.relabel_set_name(Some(wrapped));
    result
}

/// In-place relabeling. If old and new labels are disjoint, each node is
/// rewritten independently in the mapping's own order. Otherwise the
/// mapping's induced digraph (`old -> new` edges, identity pairs excluded)
/// must be acyclic; nodes are then rewritten in reverse topological order,
/// so a target label is never still in use by a not-yet-rewritten node.
fn relabel_nodes_in_place<N, G>(graph: &mut G, mapping: &Mapping<N>) -> Result<()>
where
    N: Clone + Eq + Hash + Ord,
    G: RelabelSupport<N>,
{
    let old_set: IndexSet<N, FxBuildHasher> = mapping.keys().cloned().collect();
    let disjoint = mapping
        .iter()
        .all(|(old, new)| old == new || !old_set.contains(new));

    if disjoint {
        for old in mapping.keys() {
            let new = mapping.get(old).expect("iterating mapping's own keys");
            rewrite_node_in_place(graph, old, new)?;
        }
        return Ok(());
    }

    let mut vertices: IndexSet<N, FxBuildHasher> = IndexSet::default();
    let mut edges = Vec::new();
    for (old, new) in mapping.iter() {
        if old == new {
            continue;
        }
        vertices.insert(old.clone());
        vertices.insert(new.clone());
        edges.push((old.clone(), new.clone()));
    }

    let order = topo::topological_sort(&vertices, &edges).ok_or_else(|| {
        error_stack::Report::new(GraphError::infeasible(
            "relabel mapping induces a cycle among overlapping labels",
        ))
    })?;

    for node in order.into_iter().rev() {
        if let Some(new) = mapping.get(&node) {
            rewrite_node_in_place(graph, &node, new)?;
        }
    }
    Ok(())
}

/// Relabels `graph`'s nodes per `mapping`. `copy = true` (the default per
/// `spec.md` §5) returns a new graph and leaves `graph` untouched;
/// `copy = false` rewrites `graph` in place and returns `None`.
pub fn relabel_nodes<N, G>(graph: &mut G, mapping: Mapping<N>, copy: bool) -> Result<Option<G>>
where
    N: Clone + Eq + Hash + Ord,
    G: RelabelSupport<N>,
{
    #[cfg(feature = "tracing")]
    trace!(mapping_len = mapping.len(), copy, "relabel_nodes");

    if copy {
        Ok(Some(relabel_nodes_copy(graph, &mapping)))
    } else {
        relabel_nodes_in_place(graph, &mapping)?;
        Ok(None)
    }
}

/// Relabels every node of `graph` to a dense integer range starting at
/// `first`, ordered per `ordering`. When `discard_old` is `false`, the
/// original labels are attached to the result's graph-level attributes
/// under [`OLD_LABELS_ATTR`], keyed by the new label's string form.
///
/// Always invokes copy-mode relabeling. The bound `N: From<i64>` lets the
/// new integer labels live in the same node-label type as the original
/// graph, so this reuses the same generic rewrite machinery as
/// [`relabel_nodes`] instead of needing a separate cross-type conversion
/// path.
pub fn convert_node_labels_to_integers<N, G>(
    graph: &G,
    first: i64,
    ordering: Ordering,
    discard_old: bool,
) -> G
where
    N: Clone + Eq + Hash + Ord + fmt::Debug + From<i64>,
    G: RelabelSupport<N>,
{
    let mut nodes = graph.relabel_nodes_vec();
    match ordering {
        Ordering::Default => {}
        Ordering::Sorted => nodes.sort(),
        Ordering::IncreasingDegree => nodes.sort_by_key(|n| graph.relabel_degree(n)),
        Ordering::DecreasingDegree => nodes.sort_by_key(|n| Reverse(graph.relabel_degree(n))),
    }

    let mut old_labels = AttrMap::new();
    let pairs: Vec<(N, N)> = nodes
        .into_iter()
        .enumerate()
        .map(|(i, old)| {
            let new_label = N::from(first + i as i64);
            if !discard_old {
                old_labels.insert(format!("{}", first + i as i64), format!("{old:?}"));
            }
            (old, new_label)
        })
        .collect();
    let mapping = Mapping::from_pairs(pairs);

    let mut result = relabel_nodes_copy(graph, &mapping);
    if !discard_old {
        result
            .relabel_graph_attr_mut()
            .insert(OLD_LABELS_ATTR, AttrValue::Map(old_labels));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrgraph_graph::{DiGraph, Graph, MultiGraph};

    #[test]
    fn copy_mode_relabel_renames_nodes_and_preserves_edges() {
        let mut g: Graph<&str> = Graph::new();
        g.add_edge("A", "B", None);
        let mapping = Mapping::from_pairs([("A", "Z")]);
        let relabeled = relabel_nodes(&mut g, mapping, true).unwrap().unwrap();
        assert!(relabeled.has_edge(&"Z", &"B"));
        assert!(g.has_edge(&"A", &"B"), "copy mode must not mutate the original");
    }

    #[test]
    fn in_place_disjoint_relabel_mutates_directly() {
        let mut g: Graph<&str> = Graph::new();
        g.add_edge("A", "B", None);
        let mapping = Mapping::from_pairs([("A", "Z")]);
        let result = relabel_nodes(&mut g, mapping, false).unwrap();
        assert!(result.is_none());
        assert!(g.has_edge(&"Z", &"B"));
        assert!(!g.has_node(&"A"));
    }

    #[test]
    fn in_place_overlapping_swap_cycle_is_infeasible() {
        let mut g: Graph<&str> = Graph::new();
        g.add_node("A", None);
        g.add_node("B", None);
        let mapping = Mapping::from_pairs([("A", "B"), ("B", "A")]);
        let err = relabel_nodes(&mut g, mapping, false).unwrap_err();
        assert!(matches!(err.current_context(), GraphError::Infeasible(_)));
    }

    #[test]
    fn in_place_overlapping_chain_rewrites_in_reverse_topological_order() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "X", None);
        g.add_edge("B", "Y", None);
        let mapping = Mapping::from_pairs([("A", "B"), ("B", "C")]);
        relabel_nodes(&mut g, mapping, false).unwrap();
        assert!(g.has_node(&"C"));
        assert!(g.has_node(&"B"));
        assert!(!g.has_node(&"A"));
        assert!(g.has_edge(&"B", &"X"));
        assert!(g.has_edge(&"C", &"Y"));
    }

    #[test]
    fn identity_relabel_is_a_no_op() {
        let mut g: Graph<&str> = Graph::new();
        g.add_edge("A", "B", None);
        let mapping = Mapping::from_pairs([("A", "A"), ("B", "B")]);
        relabel_nodes(&mut g, mapping, false).unwrap();
        assert!(g.has_edge(&"A", &"B"));
        assert_eq!(g.order(), 2);
    }

    #[test]
    fn relabel_unknown_node_is_a_lookup_error() {
        let mut g: Graph<&str> = Graph::new();
        g.add_node("A", None);
        let mapping = Mapping::from_pairs([("ghost", "Z")]);
        let err = relabel_nodes(&mut g, mapping, false).unwrap_err();
        assert_eq!(*err.current_context(), GraphError::node_not_found(&"ghost"));
    }

    #[test]
    fn convert_to_integers_default_ordering_starts_at_first() {
        let mut g: Graph<i64> = Graph::new();
        g.add_edge(10, 20, None);
        g.add_edge(20, 30, None);
        let converted = convert_node_labels_to_integers(&g, 0, Ordering::Default, true);
        assert_eq!(converted.order(), 3);
        assert!(converted.has_node(&0));
        assert!(converted.has_node(&1));
        assert!(converted.has_node(&2));
    }

    #[test]
    fn convert_to_integers_keeps_old_labels_unless_discarded() {
        let mut g: Graph<i64> = Graph::new();
        g.add_node(42, None);
        let converted = convert_node_labels_to_integers(&g, 0, Ordering::Default, false);
        assert!(converted.graph_attr().contains_key(OLD_LABELS_ATTR));

        let discarded = convert_node_labels_to_integers(&g, 0, Ordering::Default, true);
        assert!(!discarded.graph_attr().contains_key(OLD_LABELS_ATTR));
    }

    #[test]
    fn convert_to_integers_decreasing_degree_orders_hubs_first() {
        let mut g: Graph<i64> = Graph::new();
        g.add_edge(1, 2, None);
        g.add_edge(1, 3, None);
        g.add_edge(1, 4, None);
        g.add_node(5, None);
        let converted = convert_node_labels_to_integers(&g, 0, Ordering::DecreasingDegree, true);
        assert_eq!(converted.degree(&0).unwrap(), 3, "node 1 (degree 3) should land first");
    }

    #[test]
    fn multigraph_relabel_preserves_parallel_edge_keys() {
        let mut g: MultiGraph<&str> = MultiGraph::new();
        let k0 = g.add_edge("A", "B", None, None);
        let k1 = g.add_edge("A", "B", None, None);
        let mapping = Mapping::from_pairs([("A", "Z")]);
        let relabeled = relabel_nodes(&mut g, mapping, true).unwrap().unwrap();
        assert!(relabeled.has_edge(&"Z", &"B", Some(&k0)));
        assert!(relabeled.has_edge(&"Z", &"B", Some(&k1)));
    }
}
