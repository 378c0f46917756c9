#![warn(clippy::pedantic)]

//! # TeamTalk SDK bootstrapper (ttsdk)
//!
//! Downloads the TeamTalk 5 SDK build that matches this machine and installs
//! its native library and language binding into a fixed local layout.
//!
//! ## Subcommands
//!
//! - `install` - Download and install the SDK, replacing any previous install
//! - `ensure` - Install only when the layout is incomplete
//! - `versions` - List the versions published by the catalog
//! - `doctor` - Check installation health
//! - `version` - Display version information
//!
//! ## Examples
//!
//! Install the latest standard edition:
//! ```bash
//! ttsdk install
//! ```
//!
//! Install a specific professional build, retrying transient failures:
//! ```bash
//! ttsdk install --version 5.19a --edition pro --retries 5
//! ```

mod commands;
mod config;
mod retry;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{doctor, ensure, install, version, versions};
use tracing_subscriber::EnvFilter;

/// TeamTalk 5 SDK bootstrapper.
#[derive(Parser)]
#[command(
    name = "ttsdk",
    author,
    version,
    about = "Installs the TeamTalk 5 SDK for this machine",
    after_help = "\
CONFIGURATION:
    Settings are taken from, in order of priority:
    1. Command line flags
    2. Environment variables
    3. The config file (--config, TTSDK_CONFIG, or ./ttsdk.toml)
    4. Built-in defaults

ENVIRONMENT VARIABLES:
    TTSDK_VERSION           SDK version to install (default: latest)
    TTSDK_EDITION           SDK edition: standard or pro (default: standard)
    TTSDK_HOME              Install base directory (default: <data dir>/ttsdk)
    TTSDK_CATALOG_URL       Catalog URL (default: https://bearware.dk/teamtalksdk)
    TTSDK_CONFIG            Config file path
    RUST_LOG                Log filter (default: warn)"
)]
pub struct Cli {
    /// Enable debug logging.
    #[clap(long, short = 'v', global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// Path to a ttsdk.toml config file.
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the ttsdk CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install the TeamTalk SDK.
    ///
    /// Downloads the build for this platform and edition, extracts it and
    /// moves the native library and Python binding into place. Any previous
    /// installation is replaced.
    Install(install::InstallArgs),

    /// Install the TeamTalk SDK unless it is already installed.
    Ensure(install::InstallArgs),

    /// List SDK versions available from the catalog.
    Versions(versions::VersionsArgs),

    /// Check installation health.
    Doctor(doctor::DoctorArgs),

    /// Display version information.
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        std::process::exit(handle_error(&e));
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the error chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Install(args) => install::execute(&args, config).await,
        Commands::Ensure(args) => ensure::execute(&args, config).await,
        Commands::Versions(args) => versions::execute(&args, config).await,
        Commands::Doctor(args) => doctor::execute(&args),
        Commands::Version => version::execute(),
    }
}
