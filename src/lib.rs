//! Core client library for the Lessonwise tutoring platform.
//!
//! Lessonwise manages tutoring schedules and invoices; this crate is
//! the data layer its frontends sit on:
//!
//! - [`api`]: authenticated REST client for the platform's endpoints
//! - [`cache`]: in-process query cache - ordered cache keys, staleness
//!   windows, bounded retry, request coalescing, invalidation
//! - [`schedule`]: the parent-view and student-view schedule adapters,
//!   including the derived projections the student screen renders
//! - [`invoices`]: tutor-side and parent-side invoice adapters under
//!   one import path
//! - [`models`]: the records exchanged with the API and the frontend
//! - [`config`]: on-disk application configuration
//!
//! Adapters register fetch functions against the cache and hand out
//! immutable snapshots; no component besides the cache owns shared
//! state.

pub mod api;
pub mod cache;
pub mod config;
pub mod invoices;
pub mod models;
pub mod schedule;

pub use api::{ApiClient, ApiError};
pub use cache::{QueryCache, QueryKey, QueryOptions, QuerySnapshot, QueryStatus};
pub use config::Config;
pub use schedule::{ParentScheduleQueries, ScheduleApi, StudentScheduleQueries};
