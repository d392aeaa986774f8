use core::hash::Hash;

use attrgraph_core::{AttrMap, EdgeKey};

use crate::digraph::DiGraph;
use crate::graph::Graph;
use crate::multidigraph::MultiDiGraph;
use crate::multigraph::MultiGraph;

/// One edge incident to the node a relabel is rewriting, already oriented
/// the way it should be re-added once the node's new label is known.
pub struct IncidentEdge<N> {
    pub source: N,
    pub target: N,
    pub key: Option<EdgeKey>,
    pub attr: AttrMap,
}

/// The minimal surface `attrgraph-relabel` needs from a graph variant to
/// implement `relabel_nodes` and `convert_node_labels_to_integers` without
/// duplicating the rewrite algorithm four times.
pub trait RelabelSupport<N>: Sized
where
    N: Clone + Eq + Hash + Ord,
{
    fn relabel_new_empty(graph_attr: AttrMap) -> Self;
    fn relabel_graph_attr(&self) -> AttrMap;
    fn relabel_graph_attr_mut(&mut self) -> &mut AttrMap;
    fn relabel_name(&self) -> Option<String>;
    fn relabel_set_name(&mut self, name: Option<String>);
    fn relabel_nodes_vec(&self) -> Vec<N>;
    fn relabel_has_node(&self, n: &N) -> bool;
    fn relabel_node_attr(&self, n: &N) -> Option<AttrMap>;
    fn relabel_add_node(&mut self, n: N, attr: AttrMap);
    fn relabel_remove_node(&mut self, n: &N) -> attrgraph_core::Result<()>;
    /// Edges touching `n`, snapshotted before `n` is removed. For directed
    /// variants this includes both out-edges and in-edges, with the
    /// self-loop (present on both sides) counted once.
    fn relabel_incident_edges(&self, n: &N) -> Vec<IncidentEdge<N>>;
    fn relabel_add_edge_raw(&mut self, source: N, target: N, key: Option<EdgeKey>, attr: AttrMap);
    /// Every edge exactly once, for copy-mode relabeling's edge-first pass.
    fn relabel_all_edges(&self) -> Vec<IncidentEdge<N>>;
    fn relabel_degree(&self, n: &N) -> usize;
}

impl<N> RelabelSupport<N> for Graph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn relabel_new_empty(graph_attr: AttrMap) -> Self {
        Self::with_graph_attr(graph_attr)
    }

    fn relabel_graph_attr(&self) -> AttrMap {
        self.graph_attr().clone()
    }

    fn relabel_graph_attr_mut(&mut self) -> &mut AttrMap {
        self.graph_attr_mut()
    }

    fn relabel_name(&self) -> Option<String> {
        self.name().map(str::to_owned)
    }

    fn relabel_set_name(&mut self, name: Option<String>) {
        self.set_name(name);
    }

    fn relabel_nodes_vec(&self) -> Vec<N> {
        self.nodes()
    }

    fn relabel_has_node(&self, n: &N) -> bool {
        self.has_node(n)
    }

    fn relabel_node_attr(&self, n: &N) -> Option<AttrMap> {
        self.node_attr(n)
    }

    fn relabel_add_node(&mut self, n: N, attr: AttrMap) {
        self.add_node(n, Some(attr));
    }

    fn relabel_remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        self.remove_node(n)
    }

    fn relabel_incident_edges(&self, n: &N) -> Vec<IncidentEdge<N>> {
        self.neighbors(n)
            .map(|neighbors| {
                neighbors
                    .into_iter()
                    .map(|w| IncidentEdge {
                        source: n.clone(),
                        target: w.clone(),
                        key: None,
                        attr: self.get_edge_data(n, &w, None).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn relabel_add_edge_raw(&mut self, source: N, target: N, _key: Option<EdgeKey>, attr: AttrMap) {
        self.add_edge(source, target, Some(attr));
    }

    fn relabel_all_edges(&self) -> Vec<IncidentEdge<N>> {
        self.edges()
            .into_iter()
            .map(|(u, v, attr)| IncidentEdge {
                source: u,
                target: v,
                key: None,
                attr,
            })
            .collect()
    }

    fn relabel_degree(&self, n: &N) -> usize {
        self.degree(n).unwrap_or(0)
    }
}

impl<N> RelabelSupport<N> for DiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn relabel_new_empty(graph_attr: AttrMap) -> Self {
        let mut g = Self::new();
        *g.graph_attr_mut() = graph_attr;
        g
    }

    fn relabel_graph_attr(&self) -> AttrMap {
        self.graph_attr().clone()
    }

    fn relabel_graph_attr_mut(&mut self) -> &mut AttrMap {
        self.graph_attr_mut()
    }

    fn relabel_name(&self) -> Option<String> {
        self.name().map(str::to_owned)
    }

    fn relabel_set_name(&mut self, name: Option<String>) {
        self.set_name(name);
    }

    fn relabel_nodes_vec(&self) -> Vec<N> {
        self.nodes()
    }

    fn relabel_has_node(&self, n: &N) -> bool {
        self.has_node(n)
    }

    fn relabel_node_attr(&self, n: &N) -> Option<AttrMap> {
        self.node_attr(n)
    }

    fn relabel_add_node(&mut self, n: N, attr: AttrMap) {
        self.add_node(n, Some(attr));
    }

    fn relabel_remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        self.remove_node(n)
    }

    fn relabel_incident_edges(&self, n: &N) -> Vec<IncidentEdge<N>> {
        let mut out = Vec::new();
        if let Ok(succs) = self.successors(n) {
            for w in succs {
                out.push(IncidentEdge {
                    source: n.clone(),
                    target: w.clone(),
                    key: None,
                    attr: self.get_edge_data(n, &w, None).unwrap_or_default(),
                });
            }
        }
        if let Ok(preds) = self.predecessors(n) {
            for w in preds {
                if &w == n {
                    continue;
                }
                out.push(IncidentEdge {
                    source: w.clone(),
                    target: n.clone(),
                    key: None,
                    attr: self.get_edge_data(&w, n, None).unwrap_or_default(),
                });
            }
        }
        out
    }

    fn relabel_add_edge_raw(&mut self, source: N, target: N, _key: Option<EdgeKey>, attr: AttrMap) {
        self.add_edge(source, target, Some(attr));
    }

    fn relabel_all_edges(&self) -> Vec<IncidentEdge<N>> {
        self.out_edges()
            .into_iter()
            .map(|(u, v, attr)| IncidentEdge {
                source: u,
                target: v,
                key: None,
                attr,
            })
            .collect()
    }

    fn relabel_degree(&self, n: &N) -> usize {
        self.degree(n).unwrap_or(0)
    }
}

impl<N> RelabelSupport<N> for MultiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn relabel_new_empty(graph_attr: AttrMap) -> Self {
        let mut g = Self::new();
        *g.graph_attr_mut() = graph_attr;
        g
    }

    fn relabel_graph_attr(&self) -> AttrMap {
        self.graph_attr().clone()
    }

    fn relabel_graph_attr_mut(&mut self) -> &mut AttrMap {
        self.graph_attr_mut()
    }

    fn relabel_name(&self) -> Option<String> {
        self.name().map(str::to_owned)
    }

    fn relabel_set_name(&mut self, name: Option<String>) {
        self.set_name(name);
    }

    fn relabel_nodes_vec(&self) -> Vec<N> {
        self.nodes()
    }

    fn relabel_has_node(&self, n: &N) -> bool {
        self.has_node(n)
    }

    fn relabel_node_attr(&self, n: &N) -> Option<AttrMap> {
        self.node_attr(n)
    }

    fn relabel_add_node(&mut self, n: N, attr: AttrMap) {
        self.add_node(n, Some(attr));
    }

    fn relabel_remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        self.remove_node(n)
    }

    fn relabel_incident_edges(&self, n: &N) -> Vec<IncidentEdge<N>> {
        self.neighbors(n)
            .map(|neighbors| {
                let mut out = Vec::new();
                for w in neighbors {
                    for key in self.edge_keys(n, &w) {
                        out.push(IncidentEdge {
                            source: n.clone(),
                            target: w.clone(),
                            attr: self.get_edge_data(n, &w, Some(&key), None).unwrap_or_default(),
                            key: Some(key),
                        });
                    }
                }
                out
            })
            .unwrap_or_default()
    }

    fn relabel_add_edge_raw(&mut self, source: N, target: N, key: Option<EdgeKey>, attr: AttrMap) {
        self.add_edge(source, target, key, Some(attr));
    }

    fn relabel_all_edges(&self) -> Vec<IncidentEdge<N>> {
        self.edges_full()
            .into_iter()
            .map(|(u, v, key, attr)| IncidentEdge {
                source: u,
                target: v,
                key: Some(key),
                attr,
            })
            .collect()
    }

    fn relabel_degree(&self, n: &N) -> usize {
        self.degree(n).unwrap_or(0)
    }
}

impl<N> RelabelSupport<N> for MultiDiGraph<N>
where
    N: Clone + Eq + Hash + Ord,
{
    fn relabel_new_empty(graph_attr: AttrMap) -> Self {
        let mut g = Self::new();
        *g.graph_attr_mut() = graph_attr;
        g
    }

    fn relabel_graph_attr(&self) -> AttrMap {
        self.graph_attr().clone()
    }

    fn relabel_graph_attr_mut(&mut self) -> &mut AttrMap {
        self.graph_attr_mut()
    }

    fn relabel_name(&self) -> Option<String> {
        self.name().map(str::to_owned)
    }

    fn relabel_set_name(&mut self, name: Option<String>) {
        self.set_name(name);
    }

    fn relabel_nodes_vec(&self) -> Vec<N> {
        self.nodes()
    }

    fn relabel_has_node(&self, n: &N) -> bool {
        self.has_node(n)
    }

    fn relabel_node_attr(&self, n: &N) -> Option<AttrMap> {
        self.node_attr(n)
    }

    fn relabel_add_node(&mut self, n: N, attr: AttrMap) {
        self.add_node(n, Some(attr));
    }

    fn relabel_remove_node(&mut self, n: &N) -> attrgraph_core::Result<()> {
        self.remove_node(n)
    }

    fn relabel_incident_edges(&self, n: &N) -> Vec<IncidentEdge<N>> {
        let mut out = Vec::new();
        if let Ok(succs) = self.successors(n) {
            for w in succs {
                for key in self.edge_keys_succ(n, &w) {
                    out.push(IncidentEdge {
                        source: n.clone(),
                        target: w.clone(),
                        attr: self.get_edge_data(n, &w, Some(&key), None).unwrap_or_default(),
                        key: Some(key),
                    });
                }
            }
        }
        if let Ok(preds) = self.predecessors(n) {
            for w in preds {
                if &w == n {
                    continue;
                }
                for key in self.edge_keys_succ(&w, n) {
                    out.push(IncidentEdge {
                        source: w.clone(),
                        target: n.clone(),
                        attr: self.get_edge_data(&w, n, Some(&key), None).unwrap_or_default(),
                        key: Some(key),
                    });
                }
            }
        }
        out
    }

    fn relabel_add_edge_raw(&mut self, source: N, target: N, key: Option<EdgeKey>, attr: AttrMap) {
        self.add_edge(source, target, key, Some(attr));
    }

    fn relabel_all_edges(&self) -> Vec<IncidentEdge<N>> {
        self.out_edges_full()
            .into_iter()
            .map(|(u, v, key, attr)| IncidentEdge {
                source: u,
                target: v,
                key: Some(key),
                attr,
            })
            .collect()
    }

    fn relabel_degree(&self, n: &N) -> usize {
        self.degree(n).unwrap_or(0)
    }
}
