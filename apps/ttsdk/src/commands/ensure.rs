//! Ensure command for the ttsdk CLI.
//!
//! First-use bootstrap: installs the SDK only when the native library and
//! binding subtrees are not both present. Takes the same options as `install`.

use std::path::Path;

use anyhow::Result;

use crate::commands::install::InstallArgs;
use crate::config::Settings;
use crate::retry::with_retries;

/// Executes the ensure command.
///
/// # Errors
///
/// Returns an error if the settings are invalid, the platform is unsupported,
/// or an install was needed and failed.
pub async fn execute(args: &InstallArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(args, config)?;
    let installer = settings.installer()?;

    with_retries(settings.retry.as_ref(), || {
        installer.ensure(settings.version.as_deref(), settings.edition.as_deref())
    })
    .await?;
    Ok(())
}
