//! The four graph variants: [`Graph`] (simple undirected), [`DiGraph`]
//! (simple directed), [`MultiGraph`] (undirected, parallel edges), and
//! [`MultiDiGraph`] (directed, parallel edges).

mod digraph;
mod graph;
mod multidigraph;
mod multigraph;
mod relabel_support;

pub use attrgraph_core::{AttrMap, AttrValue, Direction, EdgeKey, GraphError};
pub use digraph::DiGraph;
pub use graph::{EdgeSpec, Graph};
pub use multidigraph::MultiDiGraph;
pub use multigraph::{MultiEdgeView, MultiGraph};
pub use relabel_support::{IncidentEdge, RelabelSupport};
