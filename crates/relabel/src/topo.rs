use core::hash::Hash;
use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use fxhash::FxBuildHasher;

/// Kahn's algorithm over the auxiliary digraph induced by an overlapping
/// relabel mapping (`old -> new` edges, self-loops already excluded by the
/// caller). Returns a topological order, or `None` if a cycle remains.
pub fn topological_sort<N>(nodes: &IndexSet<N, FxBuildHasher>, edges: &[(N, N)]) -> Option<Vec<N>>
where
    N: Clone + Eq + Hash,
{
    let mut out_adj: IndexMap<N, Vec<N>, FxBuildHasher> = IndexMap::default();
    let mut in_degree: IndexMap<N, usize, FxBuildHasher> =
        nodes.iter().map(|n| (n.clone(), 0)).collect();

    for (a, b) in edges {
        out_adj.entry(a.clone()).or_default().push(b.clone());
        *in_degree.entry(b.clone()).or_insert(0) += 1;
    }

    let mut queue: VecDeque<N> = nodes
        .iter()
        .filter(|n| in_degree.get(*n).copied().unwrap_or(0) == 0)
        .cloned()
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(n) = queue.pop_front() {
        order.push(n.clone());
        if let Some(outs) = out_adj.get(&n) {
            for m in outs {
                if let Some(d) = in_degree.get_mut(m) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(m.clone());
                    }
                }
            }
        }
    }

    if order.len() == nodes.len() {
        Some(order)
    } else {
        None
    }
}
