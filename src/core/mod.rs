//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod log;
pub mod resource;
pub mod upstream;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use resource::{CachePolicy, FailureKind, Fallback, Resource, ResourceRequest};
pub use upstream::{FetchError, Upstream, UpstreamRequest};
