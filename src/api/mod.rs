//! REST API client module for the Lessonwise platform.
//!
//! This module provides the `ApiClient` for communicating with the
//! Lessonwise API to fetch schedule and invoice data.
//!
//! The API uses bearer token authentication; the token is supplied by
//! the embedding application and attached to every request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
