//! The proxy contract: one backend call per request, backend JSON verbatim on
//! success, the resource's fallback payload on failure.

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::core::resource::{CachePolicy, ResourceRequest};
use crate::core::upstream::{Upstream, UpstreamRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: String,
    pub cache_control: String,
    /// Set when `body` is a fallback rather than backend data.
    pub fallback: bool,
}

impl ProxyResponse {
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

#[instrument(
    name = "Proxy",
    skip(upstream, request),
    fields(resource = %request.resource)
)]
pub async fn proxy<U>(upstream: &U, request: &ResourceRequest) -> ProxyResponse
where
    U: Upstream + ?Sized,
{
    let resource = request.resource;
    let upstream_request = UpstreamRequest::from_resource(request);

    match upstream.fetch(&upstream_request).await {
        Ok(body) => {
            debug!(upstream = %upstream_request, "Forwarding backend response");
            ProxyResponse {
                status: 200,
                body,
                cache_control: resource.cache_policy().header_value(),
                fallback: false,
            }
        }
        Err(e) => {
            let fallback = resource.fallback(e.kind(), request.ticker.as_deref());
            if resource.is_expected_failure(e.kind()) {
                info!(
                    upstream = %upstream_request,
                    reason = %e,
                    "Resource not available right now, serving placeholder"
                );
            } else {
                error!(
                    upstream = %upstream_request,
                    error = %e,
                    status = fallback.status,
                    "Backend fetch failed, serving fallback"
                );
            }
            ProxyResponse {
                status: fallback.status,
                body: fallback.body.to_string(),
                // Placeholders must never outlive the outage in a client cache.
                cache_control: CachePolicy::NoStore.header_value(),
                fallback: true,
            }
        }
    }
}
