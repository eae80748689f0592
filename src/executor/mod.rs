//! Query execution boundary
//!
//! The translation engine hands finished queries to an [`Executor`] and
//! materializes what comes back. [`MemoryExecutor`] implements the boundary
//! over in-memory collections with server matching semantics.
//!
//! # Execution Flow (MemoryExecutor)
//!
//! 1. Filter documents by the query document
//! 2. Apply sort (if specified)
//! 3. Apply skip and limit
//! 4. Apply the inclusion projection
//! 5. Return documents as a stream

mod boundary;
mod errors;
mod filters;
mod memory;
mod result;
mod sorter;

pub use boundary::{DocumentStream, ExecutionRequest, Executor, RawDocument};
pub use errors::{ExecutorError, ExecutorResult};
pub use filters::DocumentMatcher;
pub use memory::MemoryExecutor;
pub use result::QueryResult;
pub use sorter::ResultSorter;
