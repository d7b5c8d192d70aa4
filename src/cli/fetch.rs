use super::ui;
use crate::core::resource::{Resource, ResourceRequest};
use crate::core::upstream::Upstream;
use crate::proxy::{ProxyResponse, proxy};
use anyhow::{Result, bail};
use chrono::Local;
use tracing::{debug, warn};

/// One-shot (or polling) proxy invocation from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub resource: Resource,
    pub ticker: Option<String>,
    pub lang: Option<String>,
    pub model: Option<String>,
    pub test: bool,
    pub watch: bool,
}

impl FetchOptions {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            ticker: None,
            lang: None,
            model: None,
            test: false,
            watch: false,
        }
    }

    pub fn to_request(&self) -> Result<ResourceRequest> {
        let mut request = ResourceRequest::new(self.resource);

        match (&self.ticker, self.resource.takes_ticker()) {
            (Some(ticker), true) => {
                let ticker = ticker.trim().to_uppercase();
                if ticker.is_empty() {
                    bail!("--ticker must not be empty for {}", self.resource);
                }
                request = request.with_ticker(ticker);
            }
            (None, true) => bail!("{} requires --ticker", self.resource),
            (Some(_), false) => warn!("{} ignores --ticker", self.resource),
            (None, false) => {}
        }

        if let Some(lang) = &self.lang {
            request = request.with_query("lang", lang);
        }
        if let Some(model) = &self.model {
            request = request.with_query("model", model);
        }
        if self.test {
            request = request.with_query("test", "true");
        }
        Ok(request)
    }
}

/// Formats a proxy response for the terminal: a status line followed by
/// pretty-printed JSON.
pub fn render_response(resource: Resource, response: &ProxyResponse) -> String {
    let status = format!("HTTP {}", response.status);
    let status = if response.status >= 400 {
        ui::style_text(&status, ui::StyleType::Error)
    } else if response.fallback {
        ui::style_text(&status, ui::StyleType::Warning)
    } else {
        ui::style_text(&status, ui::StyleType::Success)
    };

    let mut output = format!(
        "{} {} {}",
        ui::style_text(resource.slug(), ui::StyleType::Title),
        status,
        ui::style_text(
            &format!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S")),
            ui::StyleType::Subtle
        ),
    );
    if response.fallback {
        output.push_str(&format!(
            " {}",
            ui::style_text("(fallback)", ui::StyleType::Subtle)
        ));
    }

    let body = response
        .json()
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| response.body.clone());
    output.push('\n');
    output.push_str(&body);
    output
}

pub async fn run(upstream: &dyn Upstream, options: &FetchOptions) -> Result<()> {
    let request = options.to_request()?;
    let resource = options.resource;

    let interval = match (options.watch, resource.refresh_interval()) {
        (true, Some(interval)) => Some(interval),
        (true, None) => {
            warn!("{} is not polled by the dashboard, fetching once", resource);
            None
        }
        (false, _) => None,
    };

    loop {
        let spinner = ui::new_spinner(&format!("Fetching {resource}"));
        let response = proxy(upstream, &request).await;
        spinner.finish_and_clear();

        println!("{}", render_response(resource, &response));

        let Some(interval) = interval else {
            break;
        };
        debug!("Next fetch of {} in {:?}", resource, interval);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_required() {
        let options = FetchOptions::new(Resource::Chart);
        let err = options.to_request().unwrap_err();
        assert!(err.to_string().contains("requires --ticker"));

        let options = FetchOptions {
            ticker: Some("  ".to_string()),
            ..FetchOptions::new(Resource::AiSummary)
        };
        assert!(options.to_request().is_err());
    }

    #[test]
    fn test_request_from_options() {
        let options = FetchOptions {
            ticker: Some("nvda".to_string()),
            lang: Some("en".to_string()),
            ..FetchOptions::new(Resource::AiSummary)
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.ticker.as_deref(), Some("NVDA"));
        assert_eq!(request.query.get("lang").map(String::as_str), Some("en"));

        let options = FetchOptions {
            test: true,
            ..FetchOptions::new(Resource::ClosingBell)
        };
        let request = options.to_request().unwrap();
        assert_eq!(request.query.get("test").map(String::as_str), Some("true"));
        assert!(request.ticker.is_none());
    }

    #[test]
    fn test_render_response_pretty_prints() {
        let response = ProxyResponse {
            status: 200,
            body: r#"{"top_picks":[]}"#.to_string(),
            cache_control: "no-store".to_string(),
            fallback: false,
        };
        let output = render_response(Resource::SmartMoney, &response);
        assert!(output.contains("HTTP 200"));
        assert!(output.contains("\"top_picks\": []"));
        assert!(!output.contains("(fallback)"));
    }

    #[test]
    fn test_render_response_marks_fallback() {
        let response = ProxyResponse {
            status: 500,
            body: "not json".to_string(),
            cache_control: "no-store".to_string(),
            fallback: true,
        };
        let output = render_response(Resource::Portfolio, &response);
        assert!(output.contains("HTTP 500"));
        assert!(output.contains("(fallback)"));
        assert!(output.ends_with("not json"));
    }
}
