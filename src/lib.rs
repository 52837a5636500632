//! Read-only content query engine over a relational content schema.
//!
//! Callers decode filter, order and pagination input, and [`QueryContext`]
//! returns hydrated articles, external items and topics, loading every
//! relation kind in bulk and optionally caching results in Redis.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod media;
pub mod model;
pub mod order;
pub mod probe;
pub mod published;
pub mod query;

pub use error::{QueryError, QueryResult};
pub use query::QueryContext;
