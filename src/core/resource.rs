//! Resource catalog: routes, upstream templates, cache policies and fallbacks

use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// One logical data category exposed through exactly one proxy route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Resource {
    AiSummary,
    Chart,
    ClosingBell,
    EtfFlows,
    MacroAnalysis,
    NewsEvents,
    Performance,
    Portfolio,
    SmartMoney,
}

/// Caching directive applied to the upstream call and echoed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Always go to the backend.
    NoStore,
    /// Reuse a successful response for the given duration.
    Revalidate(Duration),
}

impl CachePolicy {
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            CachePolicy::NoStore => None,
            CachePolicy::Revalidate(ttl) => Some(*ttl),
        }
    }

    /// Value for the `Cache-Control` response header.
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::NoStore => "no-store".to_string(),
            CachePolicy::Revalidate(ttl) => {
                format!("public, max-age={}, must-revalidate", ttl.as_secs())
            }
        }
    }
}

impl Display for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachePolicy::NoStore => write!(f, "no-store"),
            CachePolicy::Revalidate(ttl) => write!(f, "revalidate {}s", ttl.as_secs()),
        }
    }
}

/// How an upstream call failed, as far as fallback selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend answered with a non-success status.
    UpstreamStatus,
    /// The call never produced a usable body: transport error or malformed JSON.
    FetchFailed,
}

/// A query parameter the backend understands, with the value sent when the
/// client omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    pub default: &'static str,
}

/// Placeholder payload served instead of backend data.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallback {
    pub status: u16,
    pub body: Value,
}

const LANG: QueryParam = QueryParam {
    name: "lang",
    default: "ko",
};
const MODEL: QueryParam = QueryParam {
    name: "model",
    default: "gemini",
};
const TEST: QueryParam = QueryParam {
    name: "test",
    default: "false",
};

const OK: u16 = 200;
const INTERNAL_ERROR: u16 = 500;

impl Resource {
    pub fn all() -> [Resource; 9] {
        [
            Resource::AiSummary,
            Resource::Chart,
            Resource::ClosingBell,
            Resource::EtfFlows,
            Resource::MacroAnalysis,
            Resource::NewsEvents,
            Resource::Performance,
            Resource::Portfolio,
            Resource::SmartMoney,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Resource::AiSummary => "ai-summary",
            Resource::Chart => "chart",
            Resource::ClosingBell => "closing-bell",
            Resource::EtfFlows => "etf-flows",
            Resource::MacroAnalysis => "macro-analysis",
            Resource::NewsEvents => "news-events",
            Resource::Performance => "performance",
            Resource::Portfolio => "portfolio",
            Resource::SmartMoney => "smart-money",
        }
    }

    /// Inbound route, in axum path syntax.
    pub fn route(&self) -> &'static str {
        match self {
            Resource::AiSummary => "/api/us/ai-summary/{ticker}",
            Resource::Chart => "/api/us/chart/{ticker}",
            Resource::ClosingBell => "/api/us/closing-bell",
            Resource::EtfFlows => "/api/us/etf-flows",
            Resource::MacroAnalysis => "/api/us/macro-analysis",
            Resource::NewsEvents => "/api/us/news-events",
            Resource::Performance => "/api/us/performance",
            Resource::Portfolio => "/api/us/portfolio",
            Resource::SmartMoney => "/api/us/smart-money",
        }
    }

    pub fn takes_ticker(&self) -> bool {
        matches!(self, Resource::AiSummary | Resource::Chart)
    }

    /// Fixed upstream path segments; the ticker, if any, is appended after them.
    fn upstream_prefix(&self) -> &'static [&'static str] {
        match self {
            Resource::AiSummary => &["api", "us", "ai-summary"],
            Resource::Chart => &["api", "us", "stock-chart"],
            Resource::ClosingBell => &["api", "us", "stocks", "closing-bell-recommendations"],
            Resource::EtfFlows => &["api", "us", "etf-flows"],
            Resource::MacroAnalysis => &["api", "us", "macro-analysis"],
            Resource::NewsEvents => &["api", "us", "corporate-events"],
            Resource::Performance => &["api", "us", "performance"],
            Resource::Portfolio => &["api", "us", "portfolio"],
            Resource::SmartMoney => &["api", "us", "smart-money"],
        }
    }

    /// Upstream path segments with the ticker substituted. Segments are raw;
    /// percent-encoding happens when the URL is assembled.
    pub fn upstream_segments(&self, ticker: Option<&str>) -> Vec<String> {
        let mut segments: Vec<String> = self
            .upstream_prefix()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if self.takes_ticker() {
            segments.push(ticker.unwrap_or_default().to_string());
        }
        segments
    }

    /// Human readable upstream template, e.g. `/api/us/stock-chart/{ticker}`.
    pub fn upstream_template(&self) -> String {
        let mut template = format!("/{}", self.upstream_prefix().join("/"));
        if self.takes_ticker() {
            template.push_str("/{ticker}");
        }
        template
    }

    pub fn query_params(&self) -> &'static [QueryParam] {
        match self {
            Resource::AiSummary => &[LANG],
            Resource::ClosingBell => &[TEST],
            Resource::MacroAnalysis => &[LANG, MODEL],
            _ => &[],
        }
    }

    /// Recognized query parameters in a stable order, defaults filled in for
    /// missing or empty values. Anything else the client sent is dropped.
    pub fn forwarded_query(&self, query: &HashMap<String, String>) -> Vec<(String, String)> {
        self.query_params()
            .iter()
            .map(|param| {
                let value = query
                    .get(param.name)
                    .filter(|v| !v.is_empty())
                    .map_or(param.default, |v| v.as_str());
                (param.name.to_string(), value.to_string())
            })
            .collect()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Resource::Chart | Resource::ClosingBell | Resource::Portfolio => {
                CachePolicy::Revalidate(Duration::from_secs(60))
            }
            Resource::EtfFlows | Resource::SmartMoney => {
                CachePolicy::Revalidate(Duration::from_secs(300))
            }
            Resource::AiSummary
            | Resource::MacroAnalysis
            | Resource::NewsEvents
            | Resource::Performance => CachePolicy::NoStore,
        }
    }

    /// How often the dashboard view polls this resource. `None` means the view
    /// fetches on load or on demand only.
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self {
            Resource::Chart | Resource::ClosingBell | Resource::Portfolio => {
                Some(Duration::from_secs(60))
            }
            Resource::EtfFlows | Resource::MacroAnalysis | Resource::SmartMoney => {
                Some(Duration::from_secs(300))
            }
            Resource::NewsEvents => Some(Duration::from_secs(600)),
            Resource::AiSummary | Resource::Performance => None,
        }
    }

    /// Whether a failure of this kind is a normal state of the resource rather
    /// than an outage. The closing bell backend refuses requests outside the
    /// trading window.
    pub fn is_expected_failure(&self, kind: FailureKind) -> bool {
        matches!(
            (self, kind),
            (Resource::ClosingBell, FailureKind::UpstreamStatus)
        )
    }

    /// Placeholder returned when the backend call fails. The body keeps the
    /// top-level keys the views read from a successful payload.
    pub fn fallback(&self, kind: FailureKind, ticker: Option<&str>) -> Fallback {
        let ticker = ticker.unwrap_or_default();
        match (self, kind) {
            (Resource::AiSummary, FailureKind::UpstreamStatus) => Fallback {
                status: OK,
                body: json!({
                    "ticker": ticker,
                    "summary": "",
                    "error": "AI analysis not available",
                }),
            },
            (Resource::AiSummary, FailureKind::FetchFailed) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "ticker": ticker,
                    "summary": "",
                    "error": "Failed to fetch AI analysis",
                }),
            },
            (Resource::Chart, _) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "ticker": ticker,
                    "candles": [],
                    "error": "Failed to fetch chart",
                }),
            },
            // Outside the trading window is an expected state, not an error.
            (Resource::ClosingBell, _) => Fallback {
                status: OK,
                body: json!({
                    "status": "not_time",
                    "message": "Closing Bell available 14:45-16:00 EST",
                    "count": 0,
                    "recommendations": [],
                    "error": "Failed to fetch closing bell data",
                }),
            },
            (Resource::EtfFlows, _) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "top_inflows": [],
                    "top_outflows": [],
                    "error": "Failed to fetch ETF flows",
                }),
            },
            (Resource::MacroAnalysis, FailureKind::UpstreamStatus) => Fallback {
                status: OK,
                body: json!({
                    "macro_indicators": {},
                    "ai_analysis": "",
                    "error": "Macro analysis not available",
                }),
            },
            (Resource::MacroAnalysis, FailureKind::FetchFailed) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "macro_indicators": {},
                    "ai_analysis": "",
                    "error": "Failed to fetch macro analysis",
                }),
            },
            (Resource::NewsEvents, FailureKind::UpstreamStatus) => Fallback {
                status: OK,
                body: json!({
                    "earnings": [],
                    "events": [],
                    "news": [],
                    "error": "News events not available",
                }),
            },
            (Resource::NewsEvents, FailureKind::FetchFailed) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "earnings": [],
                    "events": [],
                    "news": [],
                    "error": "Failed to fetch news events",
                }),
            },
            // Performance data may simply not exist yet.
            (Resource::Performance, FailureKind::UpstreamStatus) => Fallback {
                status: OK,
                body: json!({
                    "last_updated": null,
                    "smart_money": empty_performance_summary(),
                    "closing_bell": empty_performance_summary(),
                    "error": "Performance data not available",
                }),
            },
            (Resource::Performance, FailureKind::FetchFailed) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "error": "Failed to fetch performance data",
                    "last_updated": null,
                    "smart_money": { "total_recommendations": 0, "history": [] },
                    "closing_bell": { "total_recommendations": 0, "history": [] },
                }),
            },
            (Resource::Portfolio, _) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "market_indices": [],
                    "error": "Failed to fetch portfolio",
                }),
            },
            (Resource::SmartMoney, _) => Fallback {
                status: INTERNAL_ERROR,
                body: json!({
                    "top_picks": [],
                    "error": "Failed to fetch smart money",
                }),
            },
        }
    }
}

fn empty_performance_summary() -> Value {
    json!({
        "total_recommendations": 0,
        "active": 0,
        "successful": 0,
        "failed": 0,
        "hit_rate": 0,
        "avg_return": 0,
        "best_pick": { "ticker": "", "return_pct": 0 },
        "worst_pick": { "ticker": "", "return_pct": 0 },
        "history": [],
    })
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Resource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Resource::all()
            .into_iter()
            .find(|r| r.slug() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown resource: {}", s))
    }
}

/// An inbound request for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub resource: Resource,
    pub ticker: Option<String>,
    pub query: HashMap<String, String>,
}

impl ResourceRequest {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            ticker: None,
            query: HashMap::new(),
        }
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_query_map(mut self, query: HashMap<String, String>) -> Self {
        self.query.extend(query);
        self
    }
}
