use core::hash::Hash;
use std::cell::RefCell;
use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use attrgraph_core::{AttrMap, EdgeKey, GraphError, KeyedMap};
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::multigraph::{MultiEdgeView, MultiGraph};

type KeyMap = KeyedMap<EdgeKey, AttrMap>;
type Adjacency<N> = KeyedMap<N, KeyedMap<N, KeyMap>>;

/// A directed multigraph: successor and predecessor adjacency, each
/// neighbor pair holding a key-map of parallel edges shared between the
/// two sides.
pub struct MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    pub(crate) name: Option<String>,
    pub(crate) graph_attr: AttrMap,
    pub(crate) node_attr: KeyedMap<N, Rc<RefCell<AttrMap>>>,
    pub(crate) succ: Adjacency<N>,
    pub(crate) pred: Adjacency<N>,
    pub(crate) edge_count: usize,
}

impl<N> Default for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> MultiDiGraph<N>
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
    pub fn number_of_edges(&self, u: Option<&N>, v: Option<&N>) -> usize {
        match (u, v) {
            (Some(u), Some(v)) => self
                .succ
                .with(u, |inner| inner.with(v, KeyedMap::len))
                .flatten()
                .unwrap_or(0),
            _ => self.edge_count,
        }
    }

    #[must_use]
    pub fn has_node(&self, n: &N) -> bool {
        self.node_attr.contains_key(n)
    }

    #[must_use]
    pub fn has_edge(&self, u: &N, v: &N, key: Option<&EdgeKey>) -> bool {
        let Some(km) = self.succ.with(u, |inner| inner.get(v)).flatten() else {
            return false;
        };
        match key {
            Some(k) => km.contains_key(k),
            None => !km.is_empty(),
        }
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

    pub fn add_edge(&mut self, u: N, v: N, key: Option<EdgeKey>, attr: Option<AttrMap>) -> EdgeKey {
        let attr = attr.unwrap_or_default();
        self.add_node(u.clone(), None);
        self.add_node(v.clone(), None);

        let km = match self.succ.with(&u, |inner| inner.get(&v)).flatten() {
            Some(km) => km,
            None => {
                let km: KeyMap = KeyedMap::new();
                let succ_inner = self.succ.get(&u).expect("add_node guarantees presence");
                succ_inner.set(v.clone(), km.clone());
                let pred_inner = self.pred.get(&v).expect("add_node guarantees presence");
                pred_inner.set(u, km.clone());
                km
            }
        };

        let assigned = key.unwrap_or_else(|| EdgeKey::next_default(km.keys_vec().iter()));
        if km.contains_key(&assigned) {
            km.with_mut(&assigned, |existing| existing.merge_from(&attr));
        } else {
            km.set(assigned.clone(), attr);
            self.edge_count += 1;
        }
        assigned
    }

    pub fn remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        if !self.node_attr.contains_key(n) {
            return Err(error_stack::Report::new(GraphError::node_not_found(n)));
        }
        #[cfg(feature = "tracing")]
        trace!("removing node");

        let out_neighbors = self.succ.get(n).map(|inner| inner.keys_vec()).unwrap_or_default();
        if let Some(km) = self.succ.with(n, |inner| inner.get(n)).flatten() {
            self.edge_count -= km.len();
        }
        for w in &out_neighbors {
            if w == n {
                continue;
            }
            if let Some(count) = self.pred.with(w, |inner| inner.get(n)).flatten().map(|km| km.len()) {
                self.edge_count -= count;
            }
            self.pred.with(w, |inner| inner.remove(n));
        }

        let in_neighbors = self.pred.get(n).map(|inner| inner.keys_vec()).unwrap_or_default();
        for w in &in_neighbors {
            if w == n {
                continue;
            }
            if let Some(count) = self.succ.with(w, |inner| inner.get(n)).flatten().map(|km| km.len()) {
                self.edge_count -= count;
            }
            self.succ.with(w, |inner| inner.remove(n));
        }

        self.succ.remove(n);
        self.pred.remove(n);
        self.node_attr.remove(n);
        Ok(())
    }

    pub fn remove_edge(&mut self, u: &N, v: &N, key: Option<&EdgeKey>) -> attrgraph_core::Result<EdgeKey> {
        let Some(km) = self.succ.with(u, |inner| inner.get(v)).flatten() else {
            return Err(error_stack::Report::new(GraphError::edge_not_found(u, v)));
        };
        let chosen = match key {
            Some(k) => {
                if !km.contains_key(k) {
                    return Err(error_stack::Report::new(GraphError::edge_key_not_found(u, v, k)));
                }
                k.clone()
            }
            None => km
                .keys_vec()
                .into_iter()
                .next()
                .ok_or_else(|| error_stack::Report::new(GraphError::edge_not_found(u, v)))?,
        };
        km.remove(&chosen);
        self.edge_count -= 1;
        if km.is_empty() {
            self.succ.with(u, |inner| inner.remove(v));
            self.pred.with(v, |inner| inner.remove(u));
        }
        Ok(chosen)
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

    /// All parallel-edge keys for the directed pair `u -> v`.
    #[must_use]
    pub fn edge_keys_succ(&self, u: &N, v: &N) -> Vec<EdgeKey> {
        self.succ
            .with(u, |inner| inner.with(v, KeyedMap::keys_vec))
            .flatten()
            .unwrap_or_default()
    }

    pub fn get_edge_data(
        &self,
        u: &N,
        v: &N,
        key: Option<&EdgeKey>,
        default: Option<AttrMap>,
    ) -> Option<AttrMap> {
        let km = self.succ.with(u, |inner| inner.get(v)).flatten()?;
        match key {
            Some(k) => km.get(k),
            None => km.values_vec().into_iter().next(),
        }
        .or(default)
    }

    pub fn in_degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        let inner = self
            .pred
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        Ok(inner.entries_vec().iter().map(|(_, km)| km.len()).sum())
    }

    pub fn out_degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        let inner = self
            .succ
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        Ok(inner.entries_vec().iter().map(|(_, km)| km.len()).sum())
    }

    pub fn degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        Ok(self.in_degree(n)? + self.out_degree(n)?)
    }

    /// `(node, in_degree)` for every node.
    pub fn in_degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.in_degree(&n).unwrap_or(0)))
    }

    /// `(node, out_degree)` for every node.
    pub fn out_degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.out_degree(&n).unwrap_or(0)))
    }

    /// `(node, in_degree + out_degree)` for every node.
    pub fn degree_iter(&self) -> impl Iterator<Item = (N, usize)> + '_ {
        self.node_attr
            .keys_vec()
            .into_iter()
            .map(move |n| (n.clone(), self.degree(&n).unwrap_or(0)))
    }

    #[must_use]
    pub(crate) fn out_edges_full(&self) -> Vec<(N, N, EdgeKey, AttrMap)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for u in self.node_attr.keys_vec() {
            let Some(inner) = self.succ.get(&u) else { continue };
            for (v, km) in inner.entries_vec() {
                for (key, attr) in km.entries_vec() {
                    out.push((u.clone(), v.clone(), key, attr));
                }
            }
        }
        out
    }

    #[must_use]
    pub(crate) fn in_edges_full(&self) -> Vec<(N, N, EdgeKey, AttrMap)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for v in self.node_attr.keys_vec() {
            let Some(inner) = self.pred.get(&v) else { continue };
            for (u, km) in inner.entries_vec() {
                for (key, attr) in km.entries_vec() {
                    out.push((u.clone(), v.clone(), key, attr));
                }
            }
        }
        out
    }

    /// `data`/`keys` independently control the yielded tuple shape
    /// (`spec.md` §4.4, composed onto the directed variant per §4.5).
    #[must_use]
    pub fn out_edges(&self, data: bool, keys: bool) -> Vec<MultiEdgeView<N>> {
        self.out_edges_full()
            .into_iter()
            .map(|(u, v, key, attr)| MultiEdgeView::build(u, v, key, attr, data, keys))
            .collect()
    }

    /// Lazy counterpart to [`Self::out_edges`].
    pub fn out_edges_iter(&self, data: bool, keys: bool) -> impl Iterator<Item = MultiEdgeView<N>> {
        self.out_edges(data, keys).into_iter()
    }

    #[must_use]
    pub fn in_edges(&self, data: bool, keys: bool) -> Vec<MultiEdgeView<N>> {
        self.in_edges_full()
            .into_iter()
            .map(|(u, v, key, attr)| MultiEdgeView::build(u, v, key, attr, data, keys))
            .collect()
    }

    /// Lazy counterpart to [`Self::in_edges`].
    pub fn in_edges_iter(&self, data: bool, keys: bool) -> impl Iterator<Item = MultiEdgeView<N>> {
        self.in_edges(data, keys).into_iter()
    }

    /// Alias for [`Self::out_edges`].
    #[must_use]
    pub fn edges(&self, data: bool, keys: bool) -> Vec<MultiEdgeView<N>> {
        self.out_edges(data, keys)
    }

    /// Alias for [`Self::out_edges_iter`].
    pub fn edges_iter(&self, data: bool, keys: bool) -> impl Iterator<Item = MultiEdgeView<N>> {
        self.out_edges_iter(data, keys)
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
                for (v, km) in inner.entries_vec() {
                    if keep.contains(&v) {
                        result_inner.set(v, km);
                    }
                }
            }
            if let Some(inner) = self.pred.get(n) {
                let result_inner = result.pred.get(n).expect("just inserted");
                for (u, km) in inner.entries_vec() {
                    if keep.contains(&u) {
                        result_inner.set(u, km);
                    }
                }
            }
        }
        result.edge_count = result.out_edges_full().len();
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
        for (u, v, key, attr) in self.out_edges_full() {
            result.add_edge(u, v, Some(key), Some(attr));
        }
        result
    }

    /// `copy = true` builds an independent graph with every edge reversed
    /// (same keys preserved); `copy = false` swaps `succ`/`pred` in place.
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
        for (u, v, key, attr) in self.out_edges_full() {
            result.add_edge(v, u, Some(key), Some(attr));
        }
        result
    }

    fn clone_shallow(&self) -> Self {
        Self {
            name: self.name.clone(),
            graph_attr: self.graph_attr.clone(),
            node_attr: self.node_attr.clone(),
            succ: self.succ.clone(),
            pred: self.pred.clone(),
            edge_count: self.edge_count,
        }
    }

    /// `reciprocal = true` keeps a key only when the same key exists in
    /// both directions between a pair; `reciprocal = false` merges every
    /// directed key-map into one undirected key-map per pair.
    #[must_use]
    pub fn to_undirected(&self, reciprocal: bool) -> MultiGraph<N> {
        let mut result = MultiGraph::new();
        result.set_name(self.name.clone());
        *result.graph_attr_mut() = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, key, attr) in self.out_edges_full() {
            if reciprocal && !self.has_edge(&v, &u, Some(&key)) {
                continue;
            }
            result.add_edge(u, v, Some(key), Some(attr));
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
}

/// Construction from an edge list: each pair becomes a new auto-keyed
/// directed edge (`spec.md` §6).
impl<N> From<Vec<(N, N)>> for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N)>) -> Self {
        let mut graph = Self::new();
        for (u, v) in edges {
            graph.add_edge(u, v, None, None);
        }
        graph
    }
}

impl<N> From<Vec<(N, N, AttrMap)>> for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N, AttrMap)>) -> Self {
        let mut graph = Self::new();
        for (u, v, attr) in edges {
            graph.add_edge(u, v, None, Some(attr));
        }
        graph
    }
}

impl<N> FromIterator<(N, N)> for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (u, v) in iter {
            graph.add_edge(u, v, None, None);
        }
        graph
    }
}

impl<N> FromIterator<(N, N, AttrMap)> for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N, AttrMap)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (u, v, attr) in iter {
            graph.add_edge(u, v, None, Some(attr));
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_directed_edges_keep_distinct_keys() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        let k0 = g.add_edge("A", "B", None, None);
        let k1 = g.add_edge("A", "B", None, None);
        assert_ne!(k0, k1);
        assert_eq!(g.number_of_edges(Some(&"A"), Some(&"B")), 2);
        assert_eq!(g.out_degree(&"A").unwrap(), 2);
        assert_eq!(g.in_degree(&"B").unwrap(), 2);
    }

    #[test]
    fn reverse_in_place_preserves_keys() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        let k = g.add_edge("A", "B", Some(EdgeKey::Str("x".into())), None);
        let reversed = g.reverse(false);
        assert!(reversed.has_edge(&"B", &"A", Some(&k)));
    }

    #[test]
    fn to_undirected_reciprocal_requires_matching_key_both_ways() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        let k = EdgeKey::Str("x".into());
        g.add_edge("A", "B", Some(k.clone()), None);
        let und = g.to_undirected(true);
        assert!(!und.has_edge(&"A", &"B", None));

        g.add_edge("B", "A", Some(k.clone()), None);
        let und2 = g.to_undirected(true);
        assert!(und2.has_edge(&"A", &"B", Some(&k)));
    }

    #[test]
    fn out_edges_and_in_edges_data_keys_booleans() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        let key = g.add_edge("A", "B", None, None);

        assert_eq!(g.out_edges(false, false), vec![MultiEdgeView::Pair("A", "B")]);
        assert_eq!(
            g.in_edges(false, true),
            vec![MultiEdgeView::Keyed("A", "B", key.clone())]
        );
        assert_eq!(g.edges(false, false), g.out_edges(false, false));
    }

    #[test]
    fn degree_iter_family_sums_to_degree_iter() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        g.add_edge("A", "B", None, None);
        g.add_edge("A", "B", None, None);

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
    fn clear_empties_everything() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        g.add_edge("A", "B", None, None);
        g.clear();
        assert_eq!(g.order(), 0);
        assert_eq!(g.out_edges(false, false).len(), 0);
    }

    #[test]
    fn clone_and_copy_are_independent() {
        let mut g: MultiDiGraph<&str> = MultiDiGraph::new();
        let key = g.add_edge("A", "B", None, None);
        let cloned = g.clone();
        let copied = g.copy();
        g.remove_edge(&"A", &"B", Some(&key)).unwrap();
        assert!(!g.has_edge(&"A", &"B", None));
        assert!(cloned.has_edge(&"A", &"B", None));
        assert!(copied.has_edge(&"A", &"B", None));
    }

    #[test]
    fn from_edge_vec_assigns_fresh_keys() {
        let g: MultiDiGraph<&str> = vec![("A", "B"), ("A", "B")].into();
        assert_eq!(g.number_of_edges(Some(&"A"), Some(&"B")), 2);
        assert!(!g.has_edge(&"B", &"A", None));
    }
}
