pub mod cli;
pub mod core;
pub mod providers;
pub mod proxy;
pub mod server;
pub mod store;

use crate::cli::fetch::FetchOptions;
use crate::core::config::{API_URL_ENV, AppConfig};
use crate::core::upstream::{Upstream, UpstreamRequest};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Serve { bind: Option<String> },
    Fetch(FetchOptions),
    Resources,
}

/// Builds the backend client, wrapped in the revalidation cache when enabled.
pub fn build_upstream(config: &AppConfig) -> Result<Arc<dyn Upstream>> {
    let backend = providers::BackendClient::new(&config.upstream)?;
    if !config.cache.enabled {
        debug!("Revalidation cache disabled");
        return Ok(Arc::new(backend));
    }
    let cache = Arc::new(store::MemoryCache::<UpstreamRequest, String>::new());
    Ok(Arc::new(providers::CachingUpstream::new(backend, cache)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = AppConfig::load_or_default(config_path)?
        .with_base_url_override(std::env::var(API_URL_ENV).ok());
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Resources => {
            println!("{}", cli::resources::display_catalog());
            Ok(())
        }
        AppCommand::Fetch(options) => {
            let upstream = build_upstream(&config)?;
            cli::fetch::run(upstream.as_ref(), &options).await
        }
        AppCommand::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            info!("usdash proxy starting...");
            let upstream = build_upstream(&config)?;
            server::serve(&config, upstream).await
        }
    }
}
