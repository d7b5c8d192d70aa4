use crate::core::cache::Cache;
use crate::core::upstream::{FetchError, Upstream, UpstreamRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Serves revalidating requests from memory until their TTL elapses.
/// No-store requests and failures always pass straight through.
pub struct CachingUpstream<T: Upstream> {
    inner: T,
    cache: Arc<dyn Cache<UpstreamRequest, String>>,
}

impl<T: Upstream> CachingUpstream<T> {
    pub fn new(inner: T, cache: Arc<dyn Cache<UpstreamRequest, String>>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<T: Upstream> Upstream for CachingUpstream<T> {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<String, FetchError> {
        let Some(ttl) = request.cache_policy.ttl() else {
            return self.inner.fetch(request).await;
        };

        if let Some(body) = self.cache.get(request).await {
            return Ok(body);
        }

        let result = self.inner.fetch(request).await;
        match &result {
            Ok(body) => self.cache.put(request.clone(), body.clone(), Some(ttl)).await,
            Err(e) => debug!("Not caching failed fetch for {}: {}", request, e),
        }
        result
    }
}
