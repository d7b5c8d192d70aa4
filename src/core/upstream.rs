//! Upstream backend abstractions

use async_trait::async_trait;
use std::fmt::Display;
use thiserror::Error;
use url::{Url, form_urlencoded};

use super::resource::{CachePolicy, FailureKind, ResourceRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Status(_) => FailureKind::UpstreamStatus,
            FetchError::Transport(_) | FetchError::Decode(_) => FailureKind::FetchFailed,
        }
    }
}

/// A fully resolved backend call: raw path segments, forwarded query and the
/// caching directive that applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamRequest {
    pub path_segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub cache_policy: CachePolicy,
}

impl UpstreamRequest {
    pub fn from_resource(request: &ResourceRequest) -> Self {
        let resource = request.resource;
        Self {
            path_segments: resource.upstream_segments(request.ticker.as_deref()),
            query: resource.forwarded_query(&request.query),
            cache_policy: resource.cache_policy(),
        }
    }

    /// Joins this request onto `base`. Path segments are percent-encoded,
    /// including any `/` inside a ticker.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&self.path_segments);
        }
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

impl Display for UpstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.path_segments.join("/"))?;
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Source of backend JSON. Implementations return the raw body of a
/// successful response.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::Resource;

    #[test]
    fn test_url_with_ticker_and_query() {
        let base = Url::parse("https://backend.example.com").unwrap();
        let request = ResourceRequest::new(Resource::AiSummary)
            .with_ticker("TSLA")
            .with_query("lang", "en");
        let url = UpstreamRequest::from_resource(&request).url(&base);
        assert_eq!(
            url.as_str(),
            "https://backend.example.com/api/us/ai-summary/TSLA?lang=en"
        );
    }

    #[test]
    fn test_url_encodes_ticker_segment() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let request = ResourceRequest::new(Resource::Chart).with_ticker("BRK/B");
        let url = UpstreamRequest::from_resource(&request).url(&base);
        assert_eq!(url.path(), "/api/us/stock-chart/BRK%2FB");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let base = Url::parse("http://localhost:5000/backend/").unwrap();
        let request = ResourceRequest::new(Resource::ClosingBell);
        let url = UpstreamRequest::from_resource(&request).url(&base);
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/backend/api/us/stocks/closing-bell-recommendations?test=false"
        );
    }

    #[test]
    fn test_display() {
        let request = ResourceRequest::new(Resource::MacroAnalysis).with_query("model", "gpt");
        assert_eq!(
            UpstreamRequest::from_resource(&request).to_string(),
            "/api/us/macro-analysis?lang=ko&model=gpt"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FetchError::Status(404).kind(), FailureKind::UpstreamStatus);
        assert_eq!(
            FetchError::Transport("connection refused".into()).kind(),
            FailureKind::FetchFailed
        );
        assert_eq!(
            FetchError::Decode("expected value".into()).kind(),
            FailureKind::FetchFailed
        );
    }
}
