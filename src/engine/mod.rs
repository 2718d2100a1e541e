//! Engine Module - placeholder expansion and dependency ordering
//!
//! - `registry`: closed-world map of parsed variables
//! - `expand`: memoized, cycle-safe expansion with transitive deps
//! - `order`: SCC-grouped topological order for emission
//!
//! The engine performs no I/O and has no error paths.

mod expand;
mod order;
mod registry;

pub use expand::{DependencyMap, DependencySet, Expander, ExpansionRecord, ExpansionState, Resolved};
pub use order::{order, order_units};
pub use registry::{Registry, Variable};
