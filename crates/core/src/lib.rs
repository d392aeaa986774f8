//! Shared primitives for the `attrgraph` graph crates: the keyed-map
//! container graphs are built from, attribute values, edge keys, and the
//! unified error type.

mod attr;
mod edge;
mod error;
mod keyed_map;

pub use attr::{numeric_or, AttrMap, AttrValue};
pub use edge::{Direction, EdgeKey};
pub use error::{GraphError, Result};
pub use keyed_map::{KeyedIter, KeyedMap};
