pub mod backend;
pub mod caching;

pub use backend::BackendClient;
pub use caching::CachingUpstream;
