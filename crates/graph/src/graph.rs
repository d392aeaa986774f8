use core::hash::Hash;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use attrgraph_core::{AttrMap, GraphError, KeyedMap};
#[cfg(feature = "tracing")]
use tracing::trace;

use crate::digraph::DiGraph;

type EdgeRecord = Rc<RefCell<AttrMap>>;
type Adjacency<N> = KeyedMap<N, KeyedMap<N, EdgeRecord>>;

/// A simple undirected graph: arbitrary hashable node identifiers, an
/// attribute record on the graph/each node/each edge, parallel edges
/// forbidden, self-loops allowed.
///
/// Mirrored adjacency entries (`adj[u][v]` and `adj[v][u]`) share one
/// `Rc<RefCell<AttrMap>>`, so mutating an edge's attributes through either
/// endpoint is visible from the other.
pub struct Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    pub(crate) name: Option<String>,
    pub(crate) graph_attr: AttrMap,
    pub(crate) node_attr: KeyedMap<N, Rc<RefCell<AttrMap>>>,
    pub(crate) adj: Adjacency<N>,
    pub(crate) edge_count: usize,
    pub(crate) selfloop_count: usize,
}

impl<N> Default for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Graph<N>
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
            selfloop_count: 0,
        }
    }

    #[must_use]
    pub fn with_graph_attr(attr: AttrMap) -> Self {
        let mut graph = Self::new();
        graph.graph_attr = attr;
        graph
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
        self.adj.with(u, |inner| inner.contains_key(v)).unwrap_or(false)
    }

    /// Adds `n`, merging `attr` into the existing record if present, else
    /// storing `attr` (empty if omitted).
    pub fn add_node(&mut self, n: N, attr: Option<AttrMap>) {
        let attr = attr.unwrap_or_default();
        self.node_attr.upsert_with(
            n.clone(),
            || Rc::new(RefCell::new(attr.clone())),
            |existing| existing.borrow_mut().merge_from(&attr),
        );
        self.adj.upsert_with(n, KeyedMap::new, |_| {});
    }

    pub fn add_nodes_from(&mut self, nodes: impl IntoIterator<Item = N>, attr: Option<AttrMap>) {
        for n in nodes {
            self.add_node(n, attr.clone());
        }
    }

    /// Adds `u` and `v` if missing, sharing one attribute record between
    /// `adj[u][v]` and `adj[v][u]`; merges `attr` if the edge already exists.
    pub fn add_edge(&mut self, u: N, v: N, attr: Option<AttrMap>) {
        let attr = attr.unwrap_or_default();
        self.add_node(u.clone(), None);
        self.add_node(v.clone(), None);

        let self_loop = u == v;
        let existing = self.adj.with(&u, |inner| inner.get(&v)).flatten();
        if let Some(record) = existing {
            record.borrow_mut().merge_from(&attr);
            return;
        }

        let record: EdgeRecord = Rc::new(RefCell::new(attr));
        let u_inner = self.adj.get(&u).expect("add_node guarantees presence");
        u_inner.set(v.clone(), Rc::clone(&record));
        if !self_loop {
            let v_inner = self.adj.get(&v).expect("add_node guarantees presence");
            v_inner.set(u, record);
        }
        self.edge_count += 1;
        if self_loop {
            self.selfloop_count += 1;
        }
    }

    /// Each element is `(u, v)` or `(u, v, d)`; `attr` is the base, `d`
    /// overrides. Other arities are a structural error.
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

    pub fn add_weighted_edges_from(
        &mut self,
        edges: impl IntoIterator<Item = (N, N, f64)>,
        weight_name: Option<&str>,
        attr: Option<AttrMap>,
    ) {
        let weight_name = weight_name.unwrap_or("weight");
        for (u, v, w) in edges {
            let mut merged = attr.clone().unwrap_or_default();
            merged.insert(weight_name, w);
            self.add_edge(u, v, Some(merged));
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
            self.add_edge(
                nodes[nodes.len() - 1].clone(),
                nodes[0].clone(),
                attr,
            );
        }
    }

    pub fn add_star(&mut self, nodes: impl IntoIterator<Item = N>, attr: Option<AttrMap>) {
        let nodes: Vec<N> = nodes.into_iter().collect();
        if let Some((hub, leaves)) = nodes.split_first() {
            for leaf in leaves {
                self.add_edge(hub.clone(), leaf.clone(), attr.clone());
            }
        }
    }

    pub fn remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        if !self.node_attr.contains_key(n) {
            return Err(error_stack::Report::new(GraphError::node_not_found(n)));
        }
        #[cfg(feature = "tracing")]
        trace!("removing node");
        let neighbors = self
            .adj
            .get(n)
            .map(|inner| inner.keys_vec())
            .unwrap_or_default();
        for w in neighbors {
            if &w == n {
                self.selfloop_count -= 1;
            } else if let Some(w_inner) = self.adj.get(&w) {
                w_inner.remove(n);
            }
            self.edge_count -= 1;
        }
        self.adj.remove(n);
        self.node_attr.remove(n);
        Ok(())
    }

    pub fn remove_nodes_from(&mut self, nodes: impl IntoIterator<Item = N>) {
        for n in nodes {
            let _ = self.remove_node(&n);
        }
    }

    pub fn remove_edge(&mut self, u: &N, v: &N) -> attrgraph_core::Result<()> {
        let removed = self
            .adj
            .with(u, |inner| inner.remove(v))
            .flatten()
            .is_some();
        if !removed {
            return Err(error_stack::Report::new(GraphError::edge_not_found(u, v)));
        }
        if u != v {
            self.adj.with(v, |inner| inner.remove(u));
        } else {
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

    /// Lazy counterpart to [`Self::nodes`]; fails mid-iteration with
    /// `GraphError::MapChanged` if the node map is mutated before exhaustion.
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

    /// Lazy counterpart to [`Self::neighbors`]. The lookup itself is eager
    /// (unknown `n` fails immediately); the returned iterator is lazy and
    /// fails with `GraphError::MapChanged` on concurrent structural mutation.
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

    pub fn get_edge_data(&self, u: &N, v: &N, default: Option<AttrMap>) -> Option<AttrMap> {
        self.adj
            .with(u, |inner| inner.get(v).map(|rc| rc.borrow().clone()))
            .flatten()
            .or(default)
    }

    pub fn degree(&self, n: &N) -> attrgraph_core::Result<usize> {
        let inner = self
            .adj
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        let base = inner.len();
        Ok(if inner.contains_key(n) { base + 1 } else { base })
    }

    pub fn weighted_degree(&self, n: &N, weight_name: &str) -> attrgraph_core::Result<f64> {
        let inner = self
            .adj
            .get(n)
            .ok_or_else(|| error_stack::Report::new(GraphError::node_not_found(n)))?;
        let mut total = 0.0;
        for (nb, record) in inner.entries_vec() {
            let w = attrgraph_core::numeric_or(record.borrow().get(weight_name), 1.0);
            total += w;
            if nb == *n {
                total += w;
            }
        }
        Ok(total)
    }

    /// Every edge exactly once, via the teacher's "seen node" sweep: while
    /// visiting `n`'s neighbors, skip any neighbor already marked seen;
    /// only mark `n` seen once its own neighbor list is exhausted.
    #[must_use]
    pub fn edges(&self) -> Vec<(N, N, AttrMap)> {
        let mut seen: HashSet<N> = HashSet::new();
        let mut out = Vec::with_capacity(self.edge_count);
        for n in self.node_attr.keys_vec() {
            if let Some(inner) = self.adj.get(&n) {
                for (nb, record) in inner.entries_vec() {
                    if seen.contains(&nb) {
                        continue;
                    }
                    out.push((n.clone(), nb, record.borrow().clone()));
                }
            }
            seen.insert(n);
        }
        out
    }

    /// Lazy counterpart to [`Self::edges`]. The seen-set sweep that
    /// guarantees each undirected edge is yielded exactly once needs the
    /// full adjacency scan regardless, so this materializes eagerly and
    /// exposes the result as an iterator — the paired-accessor contract
    /// (`spec.md` §6) without pretending the sweep itself is lazy.
    pub fn edges_iter(&self) -> impl Iterator<Item = (N, N, AttrMap)> {
        self.edges().into_iter()
    }

    #[must_use]
    pub fn nodes_with_selfloops(&self) -> Vec<N> {
        self.edges()
            .into_iter()
            .filter(|(u, v, _)| u == v)
            .map(|(u, _, _)| u)
            .collect()
    }

    #[must_use]
    pub fn selfloop_edges(&self) -> Vec<(N, N, AttrMap)> {
        self.edges().into_iter().filter(|(u, v, _)| u == v).collect()
    }

    /// Returns a new graph whose nodes are `bunch` restricted to members of
    /// `self` and whose edges are `self`'s edges with both endpoints in that
    /// restriction. Attribute records are shared (shallow view) with `self`.
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
            for (nb, record) in inner.entries_vec() {
                if !keep.contains(&nb) {
                    continue;
                }
                result_inner.set(nb, record);
            }
        }
        result.edge_count = result.edges().len();
        result.selfloop_count = result.nodes_with_selfloops().len();
        result
    }

    /// Empties the graph: every node, every edge, and the graph-attribute
    /// record (`spec.md` §3's "destroyed by clearing all four maps plus the
    /// graph-attribute record").
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        trace!("clearing graph");
        self.node_attr.clear();
        self.adj.clear();
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

    /// Independent deep copy: new attribute records throughout.
    #[must_use]
    pub fn clone_deep(&self) -> Self {
        let mut result = Self::new();
        result.name = self.name.clone();
        result.graph_attr = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, attr) in self.edges() {
            result.add_edge(u, v, Some(attr));
        }
        result
    }

    /// Deep-copies into a `DiGraph`, adding both `(u, v)` and `(v, u)` for
    /// every non-self-loop edge (a self-loop becomes one directed self-loop).
    #[must_use]
    pub fn to_directed(&self) -> DiGraph<N> {
        let mut result = DiGraph::new();
        result.set_name(self.name.clone());
        *result.graph_attr_mut() = self.graph_attr.clone();
        for n in self.node_attr.keys_vec() {
            result.add_node(n.clone(), self.node_attr(&n));
        }
        for (u, v, attr) in self.edges() {
            if u == v {
                result.add_edge(u, v, Some(attr));
            } else {
                result.add_edge(u.clone(), v.clone(), Some(attr.clone()));
                result.add_edge(v, u, Some(attr));
            }
        }
        result
    }

    /// Self-conversion: behaves the same as `clone_deep`.
    #[must_use]
    pub fn to_undirected(&self) -> Self {
        self.clone_deep()
    }
}

/// One element of an `add_edges_from` iterable: a 2- or 3-tuple. Other
/// arities are rejected at the call site that builds this type from
/// caller-supplied data (a structural error per `spec.md` §7).
pub enum EdgeSpec<N> {
    Pair(N, N),
    Triple(N, N, AttrMap),
}

impl<N> From<(N, N)> for EdgeSpec<N> {
    fn from((u, v): (N, N)) -> Self {
        Self::Pair(u, v)
    }
}

impl<N> From<(N, N, AttrMap)> for EdgeSpec<N> {
    fn from((u, v, d): (N, N, AttrMap)) -> Self {
        Self::Triple(u, v, d)
    }
}

/// Construction from an edge list: "empty construction followed by
/// `add_edges_from`" (`spec.md` §6).
impl<N> From<Vec<(N, N)>> for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N)>) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(edges.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> From<Vec<(N, N, AttrMap)>> for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from(edges: Vec<(N, N, AttrMap)>) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(edges.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> FromIterator<(N, N)> for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N)>>(iter: T) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(iter.into_iter().map(EdgeSpec::from), None);
        graph
    }
}

impl<N> FromIterator<(N, N, AttrMap)> for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn from_iter<T: IntoIterator<Item = (N, N, AttrMap)>>(iter: T) -> Self {
        let mut graph = Self::new();
        graph.add_edges_from(iter.into_iter().map(EdgeSpec::from), None);
        graph
    }
}
