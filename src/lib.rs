//! `attrgraph`: in-memory attributed graph data structures.
//!
//! Four graph variants — [`Graph`] (simple undirected), [`DiGraph`] (simple
//! directed), [`MultiGraph`] (undirected, parallel edges), and
//! [`MultiDiGraph`] (directed, parallel edges) — over arbitrary hashable,
//! orderable node labels, each carrying an attribute record on the graph
//! itself and on every node and edge. [`relabel_nodes`] and
//! [`convert_node_labels_to_integers`] rewrite node labels, in place or via
//! an independent copy.
//!
//! This crate simply re-exports `attrgraph-core`, `attrgraph-graph`, and
//! `attrgraph-relabel`; each can also be depended on directly.
//!
//! The mirrored-identity design (`Rc<RefCell<_>>`-backed attribute records
//! and key-maps) means this crate always depends on `std`/`alloc` for `Rc`
//! regardless of the `std` feature; that feature instead gates whether the
//! dependency crates (`error-stack`, `indexmap`) build their own `std`
//! integrations.

pub use attrgraph_core::{numeric_or, AttrMap, AttrValue, Direction, EdgeKey, GraphError, Result};
pub use attrgraph_graph::{
    DiGraph, EdgeSpec, Graph, IncidentEdge, MultiDiGraph, MultiEdgeView, MultiGraph, RelabelSupport,
};
pub use attrgraph_relabel::{convert_node_labels_to_integers, relabel_nodes, Mapping, Ordering, OLD_LABELS_ATTR};
