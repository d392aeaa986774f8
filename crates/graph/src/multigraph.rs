use core::hash::Hash;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use attrgraph_core::{AttrMap, EdgeKey, GraphError, KeyedMap};
#[cfg(feature = "tracing")]
use tracing::trace;

type KeyMap = KeyedMap<EdgeKey, AttrMap>;
type Adjacency<N> = KeyedMap<N, KeyedMap<N, KeyMap>>;

/// An undirected multigraph: like [`crate::Graph`], but each neighbor pair
/// holds a key-map of parallel edges instead of one attribute record.
///
/// `KeyedMap` clones are already shared, reference-counted handles, so
/// mirroring `adj[u][v]` and `adj[v][u]` onto the same key-map is just
/// storing two clones of it — no extra `Rc<RefCell<_>>` wrapper needed.
pub struct MultiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    pub(crate) name: Option<String>,
    pub(crate) graph_attr: AttrMap,
    pub(crate) node_attr: KeyedMap<N, Rc<RefCell<AttrMap>>>,
    pub(crate) adj: Adjacency<N>,
    pub(crate) edge_count: usize,
}

impl<N> Default for MultiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> MultiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            graph_attr: AttrMap::new(),
            node_attr: KeyedMap::new(),
            adj: KeyedMap::new(),
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
                .adj
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
        let Some(km) = self.adj.with(u, |inner| inner.get(v)).flatten() else {
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
        self.adj.upsert_with(n, KeyedMap::new, |_| {});
    }

    /// Adds an edge between `u` and `v` under `key` (auto-assigned if
    /// `None`), returning the key actually used. Merges `attr` into the
    /// existing record if `key` already names an edge for this pair.
    pub fn add_edge(&mut self, u: N, v: N, key: Option<EdgeKey>, attr: Option<AttrMap>) -> EdgeKey {
        let attr = attr.unwrap_or_default();
        self.add_node(u.clone(), None);
        self.add_node(v.clone(), None);
        let self_loop = u == v;

        let km = match self.adj.with(&u, |inner| inner.get(&v)).flatten() {
            Some(km) => km,
            None => {
                let km: KeyMap = KeyedMap::new();
                let u_inner = self.adj.get(&u).expect("add_node guarantees presence");
                u_inner.set(v.clone(), km.clone());
                if !self_loop {
                    let v_inner = self.adj.get(&v).expect("add_node guarantees presence");
                    v_inner.set(u, km.clone());
                }
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
        let neighbors = self.adj.get(n).map(|inner| inner.keys_vec()).unwrap_or_default();
        for w in neighbors {
            let count = self
                .adj
                .with(&w, |inner| inner.get(n))
                .flatten()
                .map(|km| km.len())
                .unwrap_or(0);
            self.edge_count -= count;
            if &w != n {
                self.adj.with(&w, |inner| inner.remove(n));
            }
        }
        self.adj.remove(n);
        self.node_attr.remove(n);
        Ok(())
    }

    /// Removes one edge between `u` and `v`: the named `key` if given, else
    /// an unspecified single parallel edge. Drops the pair's key-map
    /// entirely (on both mirrored sides) once it becomes empty.
    pub fn remove_edge(&mut self, u: &N, v: &N, key: Option<&EdgeKey>) -> attrgraph_core::Result<EdgeKey> {
        let Some(km) = self.adj.with(u, |inner| inner.get(v)).flatten() else {
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
            self.adj.with(u, |inner| inner.remove(v));
            if u != v {
                self.adj.with(v, |inner| inner.remove(u));
            }
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

    pub fn neighbors(&self, n: &N) -> attrgraph_core::Result<Vec<N>> {
        self.adj
            .get(n)
            .map(|inner| inner.keys_vec())
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))
    }

    /// Lazy counterpart to [`Self::neighbors`].
    pub fn neighbors_iter(
        &self,
        n: &N,
    ) -> attrgraph_core::Result<impl Iterator<Item = attrgraph_core::Result<N>>> {
        let inner = self
            .adj
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        Ok(inner.keys())
    }

    /// All parallel-edge keys between `u` and `v` (empty if no edge exists).
    #[must_use]
    pub fn edge_keys(&self, u: &N, v: &N) -> Vec<EdgeKey> {
        self.adj
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
        let km = self.adj.with(u, |inner| inner.get(v)).flatten()?;
        match key {
            Some(k) => km.get(k),
            None => km.values_vec().into_iter().next(),
        }
        .or(default)
    }

    pub fn degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        let inner = self
            .adj
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        let mut total = 0;
        for (nb, km) in inner.entries_vec() {
            let count = km.len();
            total += count;
            if nb == *n {
                total += count;
            }
        }
        Ok(total)
    }

    /// Every `(u, v, key, attr)` triple, each parallel edge listed once, via
    /// the same "seen node" sweep `Graph::edges` uses.
    #[must_use]
    pub(crate) fn edges_full(&self) -> Vec<(N, N, EdgeKey, AttrMap)> {
        let mut seen: HashSet<N> = HashSet::new();
        let mut out = Vec::with_capacity(self.edge_count);
        for n in self.node_attr.keys_vec() {
            if let Some(inner) = self.adj.get(&n) {
                for (nb, km) in inner.entries_vec() {
                    if seen.contains(&nb) {
                        continue;
                    }
                    for (key, attr) in km.entries_vec() {
                        out.push((n.clone(), nb.clone(), key, attr));
                    }
                }
            }
            seen.insert(n);
        }
        out
    }

    /// `data`/`keys` independently control whether each yielded tuple
    /// carries the edge's attribute record and/or its key (`spec.md` §4.4).
    #[must_use]
    pub fn edges(&self, data: bool, keys: bool) -> Vec<MultiEdgeView<N>> {
        self.edges_full()
            .into_iter()
            .map(|(u, v, key, attr)| MultiEdgeView::build(u, v, key, attr, data, keys))
            .collect()
    }

    /// Lazy counterpart to [`Self::edges`].
    pub fn edges_iter(&self, data: bool, keys: bool) -> impl Iterator<Item = MultiEdgeView<N>> {
        self.edges(data, keys).into_iter()
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
            result.adj.set(n.clone(), KeyedMap::new());
        }
        for n in &keep {
            let Some(inner) = self.adj.get(n) else { continue };
            let result_inner = result.adj.get(n).expect("just inserted");
            for (nb, km) in inner.entries_vec() {
                if keep.contains(&nb) {
                    result_inner.set(nb, km);
                }
            }
        }
        result.edge_count = result.edges_full().len();
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
        for (u, v, key, attr) in self.edges_full() {
            result.add_edge(u, v, Some(key), Some(attr));
        }
        result
    }

    /// Empties the graph: every node, every edge, and the graph-attribute
    /// record.
    pub fn clear(&mut self) {
        self.node_attr.clear();
        self.adj.clear();
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

/// One edge as yielded by [`MultiGraph::edges`]/[`MultiGraph::edges_iter`]
/// (and their `MultiDiGraph` equivalents), shaped by the caller's `data`/
/// `keys` booleans into a 2-, 3-, or 4-tuple view (`spec.md` §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum MultiEdgeView<N> {
    Pair(N, N),
    Keyed(N, N, EdgeKey),
    Dataed(N, N, AttrMap),
    Full(N, N, EdgeKey, AttrMap),
}

impl<N> MultiEdgeView<N> {
    pub(crate) fn build(u: N, v: N, key: EdgeKey, attr: AttrMap, data: bool, keys: bool) -> Self {
        match (data, keys) {
            (false, false) => Self::Pair(u, v),
            (false, true) => Self::Keyed(u, v, key),
            (true, false) => Self::Dataed(u, v, attr),
            (true, true) => Self::Full(u, v, key, attr),
        }
    }
}

/// Construction from an edge list: each pair becomes a new auto-keyed edge
/// (`spec.md` §6).
impl<N> From<Vec<(N, N)>> for MultiGraph<N>
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

impl<N> From<Vec<(N, N, AttrMap)>> for MultiGraph<N>
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

impl<N> FromIterator<(N, N)> for MultiGraph<N>
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

impl<N> FromIterator<(N, N, AttrMap)> for MultiGraph<N>
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
