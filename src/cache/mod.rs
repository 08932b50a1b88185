//! In-process query cache.
//!
//! This module provides the caching layer the schedule and invoice
//! adapters register their fetch functions against: an in-memory store
//! keyed by ordered [`QueryKey`]s, with per-query staleness windows,
//! bounded retry, in-flight request coalescing, refetch-on-activation
//! and invalidation.
//!
//! The store owns every cached value's lifetime; consumers only ever
//! read snapshot clones.

pub mod key;
pub mod store;

pub use key::{KeySegment, QueryKey};
pub use store::{QueryCache, QueryOptions, QuerySnapshot, QueryStatus};
