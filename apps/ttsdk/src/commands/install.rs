//! Install command for the ttsdk CLI.
//!
//! Downloads the SDK build for this platform and installs it, replacing any
//! previous installation.
//!
//! ## Usage
//!
//! ```bash
//! ttsdk install                               # Latest standard edition
//! ttsdk install --version 5.19a --edition pro # Specific professional build
//! ttsdk install --retries 5                   # Retry transient failures
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::retry::with_retries;

/// Arguments shared by the install and ensure commands.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// SDK version to install (e.g. "v5.20" or "5.20"). Defaults to the latest release.
    #[clap(long)]
    pub version: Option<String>,

    /// SDK edition: "standard" or "pro".
    #[clap(long)]
    pub edition: Option<String>,

    /// Install base directory.
    #[clap(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Catalog base URL.
    #[clap(long, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Keep the test fixtures bundled with the Python binding.
    #[clap(long)]
    pub keep_test_fixtures: bool,

    /// Retry transient network failures up to N times.
    #[clap(long, value_name = "N")]
    pub retries: Option<u32>,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the settings are invalid or any install stage fails.
pub async fn execute(args: &InstallArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(args, config)?;
    let installer = settings.installer()?;

    let installed = with_retries(settings.retry.as_ref(), || {
        installer.install(settings.version.as_deref(), settings.edition.as_deref())
    })
    .await?;

    tracing::debug!(
        version = %installed.version,
        platform = %installed.platform,
        aliases = installed.aliases.len(),
        "install finished"
    );
    Ok(())
}
