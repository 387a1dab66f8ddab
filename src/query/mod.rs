//! Query subsystem
//!
//! `find` is a full scan: every keyed document is read, scored against the
//! filter, kept if it reaches the filter's field count, and the survivors
//! are optionally sorted. No index is consulted and nothing is planned.
//!
//! # Execution Flow
//!
//! 1. Read every keyed document in insertion order
//! 2. Keep documents whose score equals the filter's field count
//! 3. Apply sort (if specified)

mod filter;
mod sorter;

pub use filter::{Clause, Filter, Operator, OR_KEY};
pub use sorter::{ResultSorter, SortSpec};
