//! Round-trip and idempotence properties, exercised through the public API
//! of the root crate.

use attrgraph::{
    convert_node_labels_to_integers, relabel_nodes, DiGraph, Graph, Mapping, MultiGraph, Ordering,
};

#[test]
fn clone_deep_is_independent_of_the_original() {
    let mut g: Graph<&str> = Graph::new();
    g.add_edge("A", "B", None);
    g.add_edge("B", "C", None);

    let cloned = g.clone_deep();
    g.add_edge("C", "D", None);

    assert_eq!(cloned.order(), 3);
    assert!(!cloned.has_edge(&"C", &"D"));
    assert!(g.has_edge(&"C", &"D"));
}

#[test]
fn to_directed_then_to_undirected_preserves_the_undirected_edge_set() {
    let mut g: Graph<&str> = Graph::new();
    g.add_edge("A", "B", None);
    g.add_edge("B", "C", None);
    g.add_edge("A", "A", None);

    let round_tripped = g.to_directed().to_undirected();

    let normalize = |edges: Vec<(&str, &str, _)>| {
        let mut pairs: Vec<(&str, &str)> = edges
            .into_iter()
            .map(|(u, v, _)| if u <= v { (u, v) } else { (v, u) })
            .collect();
        pairs.sort_unstable();
        pairs
    };

    assert_eq!(normalize(g.edges()), normalize(round_tripped.edges()));
}

#[test]
fn reverse_reverse_restores_the_original_direction() {
    let mut g: DiGraph<&str> = DiGraph::new();
    g.add_edge("A", "B", None);
    g.add_edge("B", "C", None);

    let twice = g.reverse(true).reverse(true);
    assert!(twice.has_edge(&"A", &"B"));
    assert!(twice.has_edge(&"B", &"C"));
    assert!(!twice.has_edge(&"B", &"A"));
}

#[test]
fn identity_relabel_is_a_no_op_on_nodes_and_edges() {
    let mut g: Graph<&str> = Graph::new();
    g.add_edge("A", "B", None);
    g.add_edge("B", "C", None);

    let mapping = Mapping::from_fn(g.nodes(), |n| *n);
    relabel_nodes(&mut g, mapping, false).unwrap();

    assert_eq!(g.order(), 3);
    assert!(g.has_edge(&"A", &"B"));
    assert!(g.has_edge(&"B", &"C"));
}

#[test]
fn relabeling_by_a_bijection_then_its_inverse_restores_the_original() {
    let mut g: Graph<i64> = Graph::new();
    g.add_edge(1, 2, None);
    g.add_edge(2, 3, None);

    let forward = Mapping::from_fn(g.nodes(), |n| n + 100);
    let shifted = relabel_nodes(&mut g, forward, true).unwrap().unwrap();

    let backward = Mapping::from_fn(shifted.nodes(), |n| n - 100);
    let mut restored = shifted;
    relabel_nodes(&mut restored, backward, false).unwrap();

    let mut original_nodes = g.nodes();
    let mut restored_nodes = restored.nodes();
    original_nodes.sort_unstable();
    restored_nodes.sort_unstable();
    assert_eq!(original_nodes, restored_nodes);
    assert!(restored.has_edge(&1, &2));
    assert!(restored.has_edge(&2, &3));
}

#[test]
fn add_then_remove_edge_restores_the_pre_insertion_state() {
    let mut g: Graph<&str> = Graph::new();
    g.add_node("A", None);
    g.add_node("B", None);
    assert!(!g.has_edge(&"A", &"B"));

    g.add_edge("A", "B", None);
    g.remove_edge(&"A", &"B").unwrap();

    assert!(!g.has_edge(&"A", &"B"));
    assert_eq!(g.size(), 0);
    assert_eq!(g.order(), 2);
}

#[test]
fn convert_node_labels_to_integers_yields_exactly_the_dense_range() {
    let mut g: MultiGraph<i64> = MultiGraph::new();
    g.add_edge(100, 200, None, None);
    g.add_node(300, None);

    let converted = convert_node_labels_to_integers(&g, 10, Ordering::Sorted, true);
    let mut nodes = converted.nodes();
    nodes.sort_unstable();
    assert_eq!(nodes, vec![10, 11, 12]);
}
