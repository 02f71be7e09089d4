//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod simulate;

use clap::{Args, Subcommand};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Rendered product page (HTML).
    pub page: String,

    /// Product id; detected from the page when omitted.
    #[arg(short, long)]
    pub product_id: Option<String>,
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Rendered product page (HTML).
    pub page: String,

    /// Scenario file (TOML) with canned responses and steps.
    pub scenario: String,

    /// Print the markup of these elements after the run, in addition to
    /// those the scenario lists.
    #[arg(short, long)]
    pub show: Vec<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Write a config file with every default spelled out.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
