use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use usdash::cli::fetch::FetchOptions;
use usdash::core::Resource;
use usdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for usdash::AppCommand {
    fn from(cmd: Commands) -> usdash::AppCommand {
        match cmd {
            Commands::Serve { bind } => usdash::AppCommand::Serve { bind },
            Commands::Fetch {
                resource,
                ticker,
                lang,
                model,
                test,
                watch,
            } => usdash::AppCommand::Fetch(FetchOptions {
                resource,
                ticker,
                lang,
                model,
                test,
                watch,
            }),
            Commands::Resources => usdash::AppCommand::Resources,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the proxy server
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Fetch one resource through the proxy and print the result
    Fetch {
        /// Resource name, e.g. smart-money, chart, closing-bell
        resource: Resource,
        /// Ticker symbol for chart and ai-summary
        #[arg(short, long)]
        ticker: Option<String>,
        /// Response language for ai-summary and macro-analysis
        #[arg(short, long)]
        lang: Option<String>,
        /// Model used by macro-analysis
        #[arg(short, long)]
        model: Option<String>,
        /// Ask closing-bell for test data outside the trading window
        #[arg(long)]
        test: bool,
        /// Keep polling at the dashboard's refresh interval
        #[arg(short, long)]
        watch: bool,
    },
    /// List proxied resources and their cache policies
    Resources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => usdash::cli::setup::setup(),
        Some(cmd) => usdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
