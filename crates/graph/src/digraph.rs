use core::hash::Hash;
use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use attrgraph_core::{AttrMap, GraphError, KeyedMap};
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::graph::{EdgeSpec, Graph};

type EdgeRecord = Rc<RefCell<AttrMap>>;
type Adjacency<N> = KeyedMap<N, KeyedMap<N, EdgeRecord>>;

/// A directed graph. Every edge has a successor side (`succ[u][v]`) and a
/// predecessor side (`pred[v][u]`) sharing one attribute record.
pub struct DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    pub(crate) name: Option<String>,
    pub(crate) graph_attr: AttrMap,
    pub(crate) node_attr: KeyedMap<N, Rc<RefCell<AttrMap>>>,
    pub(crate) succ: Adjacency<N>,
    pub(crate) pred: Adjacency<N>,
    pub(crate) edge_count: usize,
    pub(crate) selfloop_count: usize,
}

impl<N> Default for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            graph_attr: AttrMap::new(),
            node_attr: KeyedMap::new(),
            succ: KeyedMap::new(),
            pred: KeyedMap::new(),
            edge_count: 0,
            selfloop_count: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<Option<String>>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn graph_attr(&self) -> &AttrMap {
        &self.graph_attr
    }

    pub fn graph_attr_mut(&mut self) -> &mut AttrMap {
        &mut self.graph_attr
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.node_attr.len()
    }

    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn has_node(&self, n: &N) -> bool {
        self.node_attr.contains_key(n)
    }

    #[must_use]
    pub fn has_edge(&self, u: &N, v: &N) -> bool {
        self.succ.with(u, |inner| inner.contains_key(v)).unwrap_or(false)
    }

    pub fn add_node(&mut self, n: N, attr: Option<AttrMap>) {
        let attr = attr.unwrap_or_default();
        self.node_attr.upsert_with(
            n.clone(),
            || Rc::new(RefCell::new(attr.clone())),
            |existing| existing.borrow_mut().merge_from(&attr),
        );
        self.succ.upsert_with(n.clone(), KeyedMap::new, |_| {});
        self.pred.upsert_with(n, KeyedMap::new, |_| {});
    }

    pub fn add_nodes_from(&mut self, nodes: impl IntoIterator<Item = N>, attr: Option<AttrMap>) {
        for n in nodes {
            self.add_node(n, attr.clone());
        }
    }

    /// Adds a directed edge `u -> v`, merging `attr` into the existing
    /// record if the edge already exists.
    pub fn add_edge(&mut self, u: N, v: N, attr: Option<AttrMap>) {
        let attr = attr.unwrap_or_default();
        self.add_node(u.clone(), None);
        self.add_node(v.clone(), None);

        let self_loop = u == v;
        let existing = self.succ.with(&u, |inner| inner.get(&v)).flatten();
        if let Some(record) = existing {
            record.borrow_mut().merge_from(&attr);
            return;
        }

        let record: EdgeRecord = Rc::new(RefCell::new(attr));
        let succ_inner = self.succ.get(&u).expect("add_node guarantees presence");
        succ_inner.set(v.clone(), Rc::clone(&record));
        let pred_inner = self.pred.get(&v).expect("add_node guarantees presence");
        pred_inner.set(u, record);
        self.edge_count += 1;
        if self_loop {
            self.selfloop_count += 1;
        }
    }

    /// Each element is `(u, v)` or `(u, v, d)`; `attr` is the base, `d`
    /// overrides. Mirrors `Graph::add_edges_from`.
    pub fn add_edges_from(
        &mut self,
        edges: impl IntoIterator<Item = EdgeSpec<N>>,
        attr: Option<AttrMap>,
    ) {
        for spec in edges {
            match spec {
                EdgeSpec::Pair(u, v) => self.add_edge(u, v, attr.clone()),
                EdgeSpec::Triple(u, v, d) => {
                    let mut merged = attr.clone().unwrap_or_default();
                    merged.merge_from(&d);
                    self.add_edge(u, v, Some(merged));
                }
            }
        }
    }

    pub fn add_path(&mut self, nodes: impl IntoIterator<Item = N>, attr: Option<AttrMap>) {
        let nodes: Vec<N> = nodes.into_iter().collect();
        for pair in nodes.windows(2) {
            self.add_edge(pair[0].clone(), pair[1].clone(), attr.clone());
        }
    }

    pub fn add_cycle(&mut self, nodes: impl IntoIterator<Item = N>, attr: Option<AttrMap>) {
        let nodes: Vec<N> = nodes.into_iter().collect();
        self.add_path(nodes.clone(), attr.clone());
        if nodes.len() > 1 {
            self.add_edge(nodes[nodes.len() - 1].clone(), nodes[0].clone(), attr);
        }
    }

    pub fn remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        if !self.node_attr.contains_key(n) {
            return Err(error_stack::Report::new(GraphError::node_not_found(n)));
        }
        #[cfg(feature = "tracing")]
        trace!("removing node");

        let out_neighbors = self.succ.get(n).map(|inner| inner.keys_vec()).unwrap_or_default();
        let had_self_loop = out_neighbors.iter().any(|w| w == n);
        if had_self_loop {
            self.selfloop_count -= 1;
            self.edge_count -= 1;
        }
        for w in &out_neighbors {
            if w == n {
                continue;
            }
            if let Some(w_pred) = self.pred.get(w) {
                w_pred.remove(n);
            }
            self.edge_count -= 1;
        }

        let in_neighbors = self.pred.get(n).map(|inner| inner.keys_vec()).unwrap_or_default();
        for w in &in_neighbors {
            if w == n {
                continue;
            }
            if let Some(w_succ) = self.succ.get(w) {
                w_succ.remove(n);
            }
            self.edge_count -= 1;
        }

        self.succ.remove(n);
        self.pred.remove(n);
        self.node_attr.remove(n);
        Ok(())
    }

    pub fn remove_nodes_from(&mut self, nodes: impl IntoIterator<Item = N>) {
        for n in nodes {
            let _ = self.remove_node(&n);
        }
    }

    pub fn remove_edge(&mut self, u: &N, v: &N) -> attrgraph_core::Result<()> {
        let removed = self.succ.with(u, |inner| inner.remove(v)).flatten().is_some();
        if !removed {
            return Err(error_stack::Report::new(GraphError::edge_not_found(u, v)));
        }
        self.pred.with(v, |inner| inner.remove(u));
        if u == v {
            self.selfloop_count -= 1;
        }
        self.edge_count -= 1;
        Ok(())
    }

    pub fn remove_edges_from(&mut self, edges: impl IntoIterator<Item = (N, N)>) {
        for (u, v) in edges {
            let _ = self.remove_edge(&u, &v);
        }
    }

    #[must_use]
    pub fn nodes(&self) -> Vec<N> {
        self.node_attr.keys_vec()
    }

    /// Lazy counterpart to [`Self::nodes`].
    pub fn nodes_iter(&self) -> impl Iterator<Item = attrgraph_core::Result<N>> {
        self.node_attr.keys()
    }

    #[must_use]
    pub fn node_attr(&self, n: &N) -> Option<AttrMap> {
        self.node_attr.with(n, |rc| rc.borrow().clone())
    }

    pub fn successors(&self, n: &N) -> attrgraph_core::Result<Vec<N>> {
        self.succ
            .get(n)
            .map(|inner| inner.keys_vec())
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))
    }

    /// Lazy counterpart to [`Self::successors`].
    pub fn successors_iter(
        &self,
        n: &N,
    ) -> attrgraph_core::Result<impl Iterator<Item = attrgraph_core::Result<N>>> {
        let inner = self
            .succ
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        Ok(inner.keys())
    }

    pub fn predecessors(&self, n: &N) -> attrgraph_core::Result<Vec<N>> {
        self.pred
            .get(n)
            .map(|inner| inner.keys_vec())
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))
    }

    /// Lazy counterpart to [`Self::predecessors`].
    pub fn predecessors_iter(
        &self,
        n: &N,
    ) -> attrgraph_core::Result<impl Iterator<Item = attrgraph_core::Result<N>>> {
        let inner = self
            .pred
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        Ok(inner.keys())
    }

    pub fn get_edge_data(&self, u: &N, v: &N, default: Option<AttrMap>) -> Option<AttrMap> {
        self.succ
            .with(u, |inner| inner.get(v).map(|rc| rc.borrow().clone()))
            .flatten()
            .or(default)
    }

    pub fn in_degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        self.pred
            .get(n)
            .map(|inner| inner.len())
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))
    }

    pub fn out_degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        self.succ
            .get(n)
            .map(|inner| inner.len())
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))
    }

    /// Self-loops contribute once to in-degree and once to out-degree, so
    /// `degree` (their sum) counts a self-loop twice.
    pub fn degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        Ok(self.in_degree(n)? + self.out_degree(n)?)
    }

    /// `(node, in_degree)` for every node, per `spec.md` §4.3.
    pub fn in_degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.in_degree(&n).unwrap_or(0)))
    }

    /// `(node, out_degree)` for every node, per `spec.md` §4.3.
    pub fn out_degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.out_degree(&n).unwrap_or(0)))
    }

    /// `(node, in_degree + out_degree)` for every node, per `spec.md` §4.3.
    pub fn degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.degree(&n).unwrap_or(0)))
    }

    #[must_use]
    pub fn out_edges(&self) -> Vec<(N, N, AttrMap)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for u in self.node_attr.keys_vec() {
            let Some(inner) = self.succ.get(&u) else { continue };
            for (v, record) in inner.entries_vec() {
                out.push((u.clone(), v, record.borrow().clone()));
            }
        }
        out
    }

    #[must_use]
    pub fn in_edges(&self) -> Vec<(N, N, AttrMap)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for v in self.node_attr.keys_vec() {
            let Some(inner) = self.pred.get(&v) else { continue };
            for (u, record) in inner.entries_vec() {
                out.push((u, v.clone(), record.borrow().clone()));
            }
        }
        out
    }

    /// Lazy counterpart to [`Self::out_edges`].
    pub fn out_edges_iter(&self) -> impl Iterator<Item = (N, N, AttrMap)> {
        self.out_edges().into_iter()
    }

    /// Lazy counterpart to [`Self::in_edges`].
    pub fn in_edges_iter(&self) -> impl Iterator<Item = (N, N, AttrMap)> {
        self.in_edges().into_iter()
    }

    /// Alias for [`Self::out_edges`], the directed analogue of `Graph::edges`.
    #[must_use]
    pub fn edges(&self) -> Vec<(N, N, AttrMap)> {
        self.out_edges()
    }

    /// Alias for [`Self::out_edges_iter`].
    pub fn edges_iter(&self) -> impl Iterator<Item = (N, N, AttrMap)> {
        self.out_edges_iter()
    }

    #[must_use]
    pub fn nodes_with_selfloops(&self) -> Vec<N> {
        self.out_edges()
            .into_iter()
            .filter(|(u, v, _)| u == v)
            .map(|(u, _, _)| u)
            .collect()
    }

    #[must_use]
    pub fn subgraph(&self, bunch: impl IntoIterator<Item = N>) -> Self {
        let keep: HashSet<N> = bunch.into_iter().filter(|n| self.has_node(n)).collect();
        let mut result = Self::new();
        result.graph_attr = self.graph_attr.clone();
        for n in &keep {
            if let Some(rc) = self.node_attr.get(n) {
                result.node_attr.set(n.clone(), rc);
            }
            result.succ.set(n.clone(), KeyedMap::new());
            result.pred.set(n.clone(), KeyedMap::new());
        }
        for n in &keep {
            if let Some(inner) = self.succ.get(n) {
                let result_inner = result.succ.get(n).expect("just inserted");
                for (v, record) in inner.entries_vec() {
                    if keep.contains(&v) {
                        result_inner.set(v, record);
                    }
                }
            }
            if let Some(inner) = self.pred.get(n) {
                let result_inner = result.pred.get(n).expect("just inserted");
                for (u, record) in inner.entries_vec() {
                    if keep.contains(&u) {
                        result_inner.set(u, record);
                    }
                }
            }
        }
        result.edge_count = result.out_edges().len();
        result.selfloop_count = result.nodes_with_selfloops().len();
        result
    }

    #[must_use]
    pub fn clone_deep(&self) -> Self {
        let mut result = Self::new();
        result.name = self.name.clone();
        result.graph_attr = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, attr) in self.out_edges() {
            result.add_edge(u, v, Some(attr));
        }
        result
    }

    /// Empties the graph: every node, every edge, and the graph-attribute
    /// record.
    pub fn clear(&mut self) {
        self.node_attr.clear();
        self.succ.clear();
        self.pred.clear();
        self.graph_attr = AttrMap::new();
        self.edge_count = 0;
        self.selfloop_count = 0;
    }

    /// `spec.md` §4.2's `clone` operation: an independent deep copy.
    #[must_use]
    pub fn clone(&self) -> Self {
        self.clone_deep()
    }

    /// Alias of [`Self::clone`].
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone_deep()
    }

    /// `copy = true` builds an independent graph with every edge reversed;
    /// `copy = false` reverses in place by swapping the successor and
    /// predecessor maps — an O(1) field swap, since both sides already
    /// share their edge records with the opposite map.
    #[must_use]
    pub fn reverse(&self, copy: bool) -> Self {
        if !copy {
            let mut result = self.clone_shallow();
            mem::swap(&mut result.succ, &mut result.pred);
            return result;
        }
        let mut result = Self::new();
        result.name = self.name.clone();
        result.graph_attr = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, attr) in self.out_edges() {
            result.add_edge(v, u, Some(attr));
        }
        result
    }

    /// A shallow structural clone: new `KeyedMap` handles pointing at the
    /// same underlying storage, used internally by in-place `reverse`.
    fn clone_shallow(&self) -> Self {
        Self {
            name: self.name.clone(),
            graph_attr: self.graph_attr.clone(),
            node_attr: self.node_attr.clone(),
            succ: self.succ.clone(),
            pred: self.pred.clone(),
            edge_count: self.edge_count,
            selfloop_count: self.selfloop_count,
        }
    }

    /// `reciprocal = true` keeps only node pairs with edges in both
    /// directions; `reciprocal = false` keeps an undirected edge for every
    /// directed edge, merging attributes when both directions are present
    /// (later-encountered attributes win, per `add_edge`'s merge rule).
    #[must_use]
    pub fn to_undirected(&self, reciprocal: bool) -> Graph<N> {
        let mut result = Graph::new();
        result.set_name(self.name.clone());
        *result.graph_attr_mut() = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, attr) in self.out_edges() {
            if reciprocal && !self.has_edge(&v, &u) {
                continue;
            }
            result.add_edge(u, v, Some(attr));
        }
        result
    }
}

/// Construction from an edge list (`spec.md` §6).
impl<N> From<Vec<(N, N)>> for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N)>) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(edges.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> From<Vec<(N, N, AttrMap)>> for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N, AttrMap)>) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(edges.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> FromIterator<(N, N)> for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N)>>(iter: T) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(iter.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> FromIterator<(N, N, AttrMap)> for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N, AttrMap)>>(iter: T) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(iter.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successors_and_predecessors_are_distinct() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        assert_eq!(g.successors(&"A").unwrap(), vec!["B"]);
        assert_eq!(g.predecessors(&"B").unwrap(), vec!["A"]);
        assert!(g.successors(&"B").unwrap().is_empty());
    }

    #[test]
    fn self_loop_contributes_to_both_in_and_out_degree() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "A", None);
        assert_eq!(g.in_degree(&"A").unwrap(), 1);
        assert_eq!(g.out_degree(&"A").unwrap(), 1);
        assert_eq!(g.degree(&"A").unwrap(), 2);
    }

    #[test]
    fn reverse_copy_swaps_direction() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        let reversed = g.reverse(true);
        assert!(reversed.has_edge(&"B", &"A"));
        assert!(!reversed.has_edge(&"A", &"B"));
    }

    #[test]
    fn reverse_in_place_shares_edge_records() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", Some({
            let mut a = AttrMap::new();
            a.insert("weight", 1_i64);
            a
        }));
        let original_record = g.succ.get(&"A").unwrap().get(&"B").unwrap();
        let reversed = g.reverse(false);
        assert!(reversed.has_edge(&"B", &"A"));
        let new_record = reversed.succ.get(&"B").unwrap().get(&"A").unwrap();
        assert!(Rc::ptr_eq(&original_record, &new_record));
    }

    #[test]
    fn to_undirected_reciprocal_keeps_only_mutual_edges() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        g.add_edge("B", "A", None);
        g.add_edge("B", "C", None);
        let und = g.to_undirected(true);
        assert!(und.has_edge(&"A", &"B"));
        assert!(!und.has_edge(&"B", &"C"));
    }

    #[test]
    fn remove_node_cleans_up_both_sides() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        g.add_edge("B", "A", None);
        g.remove_node(&"A").unwrap();
        assert!(!g.has_node(&"A"));
        assert_eq!(g.successors(&"B").unwrap(), Vec::<&str>::new());
        assert_eq!(g.size(), 0);
    }

    #[test]
    fn degree_iter_family_sums_to_degree_iter() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        g.add_edge("B", "C", None);

        let in_degrees: std::collections::BTreeMap<_, _> = g.in_degree_iter().collect();
        let out_degrees: std::collections::BTreeMap<_, _> = g.out_degree_iter().collect();
        for (node, total) in g.degree_iter() {
            assert_eq!(
                total,
                in_degrees.get(&node).copied().unwrap_or(0) + out_degrees.get(&node).copied().unwrap_or(0)
            );
        }
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", None);
        g.clear();
        assert_eq!(g.order(), 0);
        assert_eq!(g.size(), 0);
    }

    #[test]
    fn clone_and_copy_are_independent_deep_copies() {
        let mut g: DiGraph<&str> = DiGraph::new();
        g.add_edge("A", "B", Some({
            let mut a = AttrMap::new();
            a.insert("weight", 1_i64);
            a
        }));
        let cloned = g.clone();
        let copied = g.copy();
        g.succ
            .get(&"A")
            .unwrap()
            .get(&"B")
            .unwrap()
            .borrow_mut()
            .insert("weight", 2_i64);
        for other in [&cloned, &copied] {
            assert_eq!(
                other.get_edge_data(&"A", &"B", None).unwrap().get("weight"),
                Some(&attrgraph_core::AttrValue::Int(1))
            );
        }
    }

    #[test]
    fn from_edge_vec_builds_directed_edges() {
        let g: DiGraph<&str> = vec![("A", "B"), ("B", "C")].into();
        assert_eq!(g.order(), 3);
        assert!(g.has_edge(&"A", &"B"));
        assert!(!g.has_edge(&"B", &"A"));
    }
}
