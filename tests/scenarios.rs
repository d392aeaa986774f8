//! The literal scenarios from the design doc's "testable properties"
//! section, exercised end to end through the public API.

use attrgraph::{
    convert_node_labels_to_integers, relabel_nodes, DiGraph, Graph, Mapping, MultiGraph, Ordering,
};

#[test]
fn basic_adjacency() {
    let mut g: Graph<&str> = Graph::new();
    g.add_edges_from(
        [
            ("A", "B").into(),
            ("A", "C").into(),
            ("B", "C").into(),
            ("C", "D").into(),
        ],
        None,
    );

    let mut nodes = g.nodes();
    nodes.sort_unstable();
    assert_eq!(nodes, vec!["A", "B", "C", "D"]);
    assert!(g.has_edge(&"A", &"B"));
    assert!(!g.has_edge(&"A", &"D"));
    assert_eq!(g.degree(&"A").unwrap(), 2);
    assert_eq!(g.size(), 4);
}

#[test]
fn relabel_copy_renames_and_preserves_edges() {
    let mut g: Graph<&str> = Graph::new();
    g.add_edges_from(
        [
            ("A", "B").into(),
            ("A", "C").into(),
            ("B", "C").into(),
            ("C", "D").into(),
        ],
        None,
    );

    let mapping = Mapping::from_pairs([
        ("A", "aardvark"),
        ("B", "bear"),
        ("C", "cat"),
        ("D", "dog"),
    ]);
    let relabeled = relabel_nodes(&mut g, mapping, true).unwrap().unwrap();

    let mut nodes = relabeled.nodes();
    nodes.sort_unstable();
    assert_eq!(nodes, vec!["aardvark", "bear", "cat", "dog"]);
    assert!(relabeled.has_edge(&"aardvark", &"bear"));
    assert!(relabeled.has_edge(&"aardvark", &"cat"));
    assert!(relabeled.has_edge(&"bear", &"cat"));
    assert!(relabeled.has_edge(&"cat", &"dog"));

    // the original graph is untouched by copy-mode relabeling.
    assert!(g.has_edge(&"A", &"B"));
}

#[test]
fn relabel_by_function_maps_through_a_shared_type() {
    // The scenario relabels letters to their character codes; since a
    // `Mapping<N>` translates within one node-label type, the equivalent
    // here relabels small integers through a same-typed function (just as
    // `convert_node_labels_to_integers` itself does via `N: From<i64>`).
    let mut g: Graph<i64> = Graph::new();
    g.add_edges_from(
        [(0, 1).into(), (0, 2).into(), (1, 2).into(), (2, 3).into()],
        None,
    );

    let mapping = Mapping::from_fn(g.nodes(), |n| 65 + n);
    let relabeled = relabel_nodes(&mut g, mapping, true).unwrap().unwrap();

    let mut nodes = relabeled.nodes();
    nodes.sort_unstable();
    assert_eq!(nodes, vec![65, 66, 67, 68]);
}

#[test]
fn relabel_multi_preserves_parallel_edges_in_place() {
    let mut g: MultiGraph<&str> = MultiGraph::new();
    g.add_edge("a", "b", None, None);
    g.add_edge("a", "b", None, None);

    let mapping = Mapping::from_pairs([("a", "aardvark"), ("b", "bear")]);
    relabel_nodes(&mut g, mapping, false).unwrap();

    let mut nodes = g.nodes();
    nodes.sort_unstable();
    assert_eq!(nodes, vec!["aardvark", "bear"]);
    assert_eq!(g.number_of_edges(Some(&"aardvark"), Some(&"bear")), 2);
}

#[test]
fn relabel_of_a_missing_node_is_a_lookup_error() {
    let mut g: Graph<i64> = Graph::new();
    g.add_edges_from(
        [(0, 1).into(), (0, 2).into(), (1, 2).into(), (2, 3).into()],
        None,
    );

    let mapping = Mapping::from_pairs([(999, 42)]);
    let err = relabel_nodes(&mut g, mapping, false).unwrap_err();
    assert_eq!(
        *err.current_context(),
        attrgraph::GraphError::node_not_found(&999)
    );
}

#[test]
fn integer_labeling_by_increasing_degree_orders_the_paw_graph() {
    // Same "paw" shape as the basic-adjacency scenario (A-B, A-C, B-C, C-D),
    // with nodes already integers so `convert_node_labels_to_integers`'s
    // `N: From<i64>` bound is satisfiable.
    let mut g: Graph<i64> = Graph::new();
    g.add_edges_from(
        [(0, 1).into(), (0, 2).into(), (1, 2).into(), (2, 3).into()],
        None,
    );

    let converted = convert_node_labels_to_integers(&g, 0, Ordering::IncreasingDegree, true);
    assert_eq!(converted.degree(&0).unwrap(), 1);
    assert_eq!(converted.degree(&1).unwrap(), 2);
    assert_eq!(converted.degree(&2).unwrap(), 2);
    assert_eq!(converted.degree(&3).unwrap(), 3);
}

#[test]
fn directed_variant_degree_splits_in_and_out() {
    let mut g: DiGraph<&str> = DiGraph::new();
    g.add_edge("A", "B", None);
    g.add_edge("A", "C", None);
    g.add_edge("B", "C", None);

    assert_eq!(g.out_degree(&"A").unwrap(), 2);
    assert_eq!(g.in_degree(&"C").unwrap(), 2);
    assert_eq!(g.degree(&"A").unwrap(), 2);
}
