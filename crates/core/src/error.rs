use core::fmt;

use error_stack::Context;

/// The error kinds raised by `attrgraph` graph operations.
///
/// Lookup, structural, and infeasibility failures are distinct variants so
/// callers can discriminate on them with a `match`; `MapChanged` is the
/// iterator-invalidation failure described for [`crate::KeyedMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A referenced node does not exist.
    NodeNotFound { node: String },
    /// A referenced edge does not exist.
    EdgeNotFound { source: String, target: String },
    /// A referenced edge key does not exist within an existing `(u, v)` key-map.
    EdgeKeyNotFound {
        source: String,
        target: String,
        key: String,
    },
    /// Malformed input: wrong tuple arity, missing weight, unknown ordering name, etc.
    Structural(String),
    /// An in-place relabel cannot complete because the mapping's induced
    /// digraph has a non-self-loop cycle.
    Infeasible(String),
    /// A lazy [`crate::KeyedMap`] iterator observed a structural mutation
    /// since it was created.
    MapChanged,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node } => write!(f, "node `{node}` is not in the graph"),
            Self::EdgeNotFound { source, target } => {
                write!(f, "edge `{source}` -> `{target}` is not in the graph")
            }
            Self::EdgeKeyNotFound { source, target, key } => write!(
                f,
                "edge `{source}` -> `{target}` has no entry for key `{key}`"
            ),
            Self::Structural(reason) => write!(f, "structural error: {reason}"),
            Self::Infeasible(reason) => write!(f, "relabel is infeasible in place: {reason}"),
            Self::MapChanged => write!(f, "map changed during iteration"),
        }
    }
}

impl Context for GraphError {}

impl GraphError {
    pub fn node_not_found(node: impl fmt::Debug) -> Self {
        Self::NodeNotFound {
            node: format!("{node:?}"),
        }
    }

    pub fn edge_not_found(source: impl fmt::Debug, target: impl fmt::Debug) -> Self {
        Self::EdgeNotFound {
            source: format!("{source:?}"),
            target: format!("{target:?}"),
        }
    }

    pub fn edge_key_not_found(
        source: impl fmt::Debug,
        target: impl fmt::Debug,
        key: impl fmt::Debug,
    ) -> Self {
        Self::EdgeKeyNotFound {
            source: format!("{source:?}"),
            target: format!("{target:?}"),
            key: format!("{key:?}"),
        }
    }

    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural(reason.into())
    }

    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible(reason.into())
    }
}

/// `attrgraph`'s fallible result type: an `error-stack` report carrying a [`GraphError`].
pub type Result<T> = error_stack::Result<T, GraphError>;
