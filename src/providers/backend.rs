use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::IgnoredAny;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use crate::core::config::UpstreamConfig;
use crate::core::upstream::{FetchError, Upstream, UpstreamRequest};

/// HTTP client for the analytics backend.
pub struct BackendClient {
    base_url: Url,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid upstream base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!(
                "Upstream base URL cannot carry a path: {}",
                config.base_url
            ));
        }

        if config.timeout_secs == 0 {
            return Err(anyhow!("Upstream timeout must be at least one second"));
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Upstream for BackendClient {
    #[instrument(
        name = "BackendFetch",
        skip(self),
        fields(request = %request)
    )]
    async fn fetch(&self, request: &UpstreamRequest) -> Result<String, FetchError> {
        let url = request.url(&self.base_url);
        debug!("Requesting backend data from {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(%status, "Received backend response");
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if let Err(e) = serde_json::from_str::<IgnoredAny>(&text) {
            error!(
                error = ?e,
                length = text.len(),
                response = %body_preview(&text),
                "Failed to parse backend response"
            );
            return Err(FetchError::Decode(e.to_string()));
        }

        Ok(text)
    }
}

const PREVIEW_CHARS: usize = 200;

/// Leading slice of a response body for log lines.
fn body_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::{Resource, ResourceRequest};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        let config = UpstreamConfig {
            base_url: server.uri(),
            ..UpstreamConfig::default()
        };
        BackendClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_body() {
        let mock_server = MockServer::start().await;
        let body = r#"{"top_picks": [{"ticker": "NVDA", "final_score": 91.5}]}"#;

        Mock::given(method("GET"))
            .and(path("/api/us/smart-money"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = UpstreamRequest::from_resource(&ResourceRequest::new(Resource::SmartMoney));

        let result = client.fetch(&request).await.unwrap();
        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_fetch_forwards_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/us/macro-analysis"))
            .and(query_param("lang", "en"))
            .and(query_param("model", "gemini"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = UpstreamRequest::from_resource(
            &ResourceRequest::new(Resource::MacroAnalysis).with_query("lang", "en"),
        );

        assert_eq!(client.fetch(&request).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = UpstreamRequest::from_resource(&ResourceRequest::new(Resource::EtfFlows));

        assert_eq!(client.fetch(&request).await, Err(FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>502 Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let request = UpstreamRequest::from_resource(&ResourceRequest::new(Resource::Portfolio));

        let err = client.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        // Bind then drop a listener so the port refuses connections.
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let config = UpstreamConfig {
            base_url: uri,
            timeout_secs: 2,
            ..UpstreamConfig::default()
        };
        let client = BackendClient::new(&config).unwrap();
        let request = UpstreamRequest::from_resource(&ResourceRequest::new(Resource::Performance));

        let err = client.fetch(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = UpstreamConfig {
            base_url: "not a url".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(BackendClient::new(&config).is_err());

        let config = UpstreamConfig {
            base_url: "mailto:ops@example.com".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(BackendClient::new(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = UpstreamConfig {
            timeout_secs: 0,
            ..UpstreamConfig::default()
        };
        let err = BackendClient::new(&config).err().unwrap();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_body_preview_truncates_long_bodies() {
        assert_eq!(body_preview("<html></html>"), "<html></html>");

        let page = "é".repeat(1000);
        let preview = body_preview(&page);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
