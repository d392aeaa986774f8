//! Property-based tests over random mutation sequences, covering the
//! universal invariants through the public API (degree-sum identities,
//! adjacency symmetry) rather than reaching into internal storage.

use attrgraph::{relabel_nodes, DiGraph, Graph, Mapping, MultiGraph};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    AddEdge(i64, i64),
    RemoveEdge(i64, i64),
    RemoveNode(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let domain = 0i64..6;
    prop_oneof![
        (domain.clone(), domain.clone()).prop_map(|(u, v)| Op::AddEdge(u, v)),
        (domain.clone(), domain.clone()).prop_map(|(u, v)| Op::RemoveEdge(u, v)),
        domain.prop_map(Op::RemoveNode),
    ]
}

proptest! {
    /// After any sequence of mutations, the undirected adjacency invariant
    /// holds: `v` is a neighbor of `u` iff `u` is a neighbor of `v`, and the
    /// sum of degrees is twice the edge count.
    #[test]
    fn undirected_adjacency_stays_symmetric(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut g: Graph<i64> = Graph::new();
        for op in ops {
            match op {
                Op::AddEdge(u, v) => g.add_edge(u, v, None),
                Op::RemoveEdge(u, v) => { let _ = g.remove_edge(&u, &v); }
                Op::RemoveNode(n) => { let _ = g.remove_node(&n); }
            }
        }

        for u in g.nodes() {
            let neighbors = g.neighbors(&u).unwrap();
            for v in &neighbors {
                let back = g.neighbors(v).unwrap();
                prop_assert!(back.contains(&u));
            }
        }

        let degree_sum: usize = g.nodes().iter().map(|n| g.degree(n).unwrap()).sum();
        prop_assert_eq!(degree_sum, 2 * g.size());
    }

    /// Directed adjacency: out-degree sum and in-degree sum both equal the
    /// edge count, and `v` a successor of `u` iff `u` a predecessor of `v`.
    #[test]
    fn directed_adjacency_mirrors_between_succ_and_pred(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut g: DiGraph<i64> = DiGraph::new();
        for op in ops {
            match op {
                Op::AddEdge(u, v) => g.add_edge(u, v, None),
                Op::RemoveEdge(u, v) => { let _ = g.remove_edge(&u, &v); }
                Op::RemoveNode(n) => { let _ = g.remove_node(&n); }
            }
        }

        for u in g.nodes() {
            for v in g.successors(&u).unwrap() {
                prop_assert!(g.predecessors(&v).unwrap().contains(&u));
            }
        }

        let out_sum: usize = g.nodes().iter().map(|n| g.out_degree(n).unwrap()).sum();
        let in_sum: usize = g.nodes().iter().map(|n| g.in_degree(n).unwrap()).sum();
        prop_assert_eq!(out_sum, g.number_of_edges());
        prop_assert_eq!(in_sum, g.number_of_edges());
    }

    /// A multigraph's every `(u, v)` key-map is non-empty: `edge_keys`
    /// returns something for every pair `has_edge` reports, and vice versa.
    #[test]
    fn multigraph_key_maps_are_never_left_empty(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut g: MultiGraph<i64> = MultiGraph::new();
        for op in ops {
            match op {
                Op::AddEdge(u, v) => { g.add_edge(u, v, None, None); }
                Op::RemoveEdge(u, v) => { let _ = g.remove_edge(&u, &v, None); }
                Op::RemoveNode(n) => { let _ = g.remove_node(&n); }
            }
        }

        for u in g.nodes() {
            for v in g.neighbors(&u).unwrap() {
                prop_assert!(!g.edge_keys(&u, &v).is_empty());
                prop_assert!(g.has_edge(&u, &v, None));
            }
        }
    }

    /// `relabel_nodes` with the identity mapping never changes the node or
    /// edge set, for any graph reachable from a random mutation sequence.
    #[test]
    fn identity_relabel_is_always_a_no_op(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut g: Graph<i64> = Graph::new();
        for op in ops {
            match op {
                Op::AddEdge(u, v) => g.add_edge(u, v, None),
                Op::RemoveEdge(u, v) => { let _ = g.remove_edge(&u, &v); }
                Op::RemoveNode(n) => { let _ = g.remove_node(&n); }
            }
        }

        let mut before_nodes = g.nodes();
        before_nodes.sort_unstable();
        let before_size = g.size();

        let mapping = Mapping::from_fn(g.nodes(), |n| *n);
        relabel_nodes(&mut g, mapping, false).unwrap();

        let mut after_nodes = g.nodes();
        after_nodes.sort_unstable();
        prop_assert_eq!(before_nodes, after_nodes);
        prop_assert_eq!(before_size, g.size());
    }
}
