//! Storefront CLI - Command line tool for product detail pages.
//!
//! Commands:
//! - `pdp inspect` - Check a rendered page against the controller's DOM contract
//! - `pdp simulate` - Replay a scripted shopper session against canned responses
//! - `pdp config` - Manage configuration

mod commands;
mod context;
mod output;
mod scenario;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, InspectArgs, SimulateArgs};

/// Storefront CLI - Inspect and simulate product detail pages
#[derive(Parser)]
#[command(name = "pdp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount the controller on a page and report what was wired
    Inspect(InspectArgs),

    /// Replay a scenario of shopper actions against a page
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Page controllers are single-threaded; run commands on a local set.
    let local = tokio::task::LocalSet::new();
    let result = local
        .run_until(async {
            match cli.command {
                Commands::Inspect(args) => commands::inspect::run(args, &ctx).await,
                Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
                Commands::Config(args) => commands::config::run(args, &ctx).await,
            }
        })
        .await;

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
