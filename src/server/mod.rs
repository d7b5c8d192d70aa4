//! HTTP surface: one GET route per resource plus a health check.

mod handlers;

use anyhow::Context;
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    routing::get,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::config::AppConfig;
use crate::core::resource::Resource;
use crate::core::upstream::Upstream;

pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route("/healthz", get(handlers::health));

    for resource in Resource::all() {
        router = if resource.takes_ticker() {
            router.route(
                resource.route(),
                get(
                    move |state: State<Arc<AppState>>,
                          ticker: Result<Path<String>, PathRejection>,
                          query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                        let (Path(ticker), Query(query)) = match (ticker, query) {
                            (Ok(ticker), Ok(query)) => (ticker, query),
                            (Err(rejection), _) => {
                                return handlers::invalid_request(resource, rejection.body_text());
                            }
                            (_, Err(rejection)) => {
                                return handlers::invalid_request(resource, rejection.body_text());
                            }
                        };
                        handlers::proxy_resource(resource, state, Some(ticker), query).await
                    },
                ),
            )
        } else {
            router.route(
                resource.route(),
                get(
                    move |state: State<Arc<AppState>>,
                          query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                        match query {
                            Ok(Query(query)) => {
                                handlers::proxy_resource(resource, state, None, query).await
                            }
                            Err(rejection) => {
                                handlers::invalid_request(resource, rejection.body_text())
                            }
                        }
                    },
                ),
            )
        };
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &AppConfig, upstream: Arc<dyn Upstream>) -> anyhow::Result<()> {
    let app = build_router(AppState { upstream });

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(
        "Proxy listening on http://{} (backend: {})",
        listener.local_addr()?,
        config.upstream.base_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
