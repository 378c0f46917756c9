//! Versions command for the ttsdk CLI.
//!
//! Lists the SDK versions published by the catalog, newest first as the
//! catalog orders them.
//!
//! ## Usage
//!
//! ```bash
//! ttsdk versions         # Human-readable list
//! ttsdk versions --json  # JSON output
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Available TeamTalk SDK versions at https://bearware.dk/teamtalksdk/:
//!
//!   v5.20 (latest)
//!   v5.19a
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use ttsdk_installer::{CatalogClient, VersionToken};

use crate::config::{self, ConfigFile};

/// Arguments for the versions command.
#[derive(Args)]
pub struct VersionsArgs {
    /// Catalog base URL.
    #[clap(long, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Show versions in JSON format.
    #[clap(long, short = 'j')]
    pub json: bool,
}

/// Version information for JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct VersionInfo {
    version: String,
    latest: bool,
}

/// Executes the versions command.
///
/// # Errors
///
/// Returns an error if the config file is invalid or the listing cannot be fetched.
pub async fn execute(args: &VersionsArgs, config: Option<&Path>) -> Result<()> {
    let file = ConfigFile::load(config)?;
    let url = config::catalog_url(args.catalog_url.as_deref(), &file, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    });
    let catalog = CatalogClient::new(&url)?;
    let versions = catalog.list_versions().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&version_infos(&versions))?);
    } else {
        output_text(&catalog.listing_url(), &versions);
    }
    Ok(())
}

fn version_infos(versions: &[VersionToken]) -> Vec<VersionInfo> {
    versions
        .iter()
        .enumerate()
        .map(|(i, v)| VersionInfo {
            version: v.to_string(),
            latest: i == 0,
        })
        .collect()
}

fn output_text(listing_url: &str, versions: &[VersionToken]) {
    if versions.is_empty() {
        println!("No versions found at {listing_url}.");
        return;
    }

    println!("Available TeamTalk SDK versions at {listing_url}:");
    println!();
    for (i, version) in versions.iter().enumerate() {
        if i == 0 {
            println!("  {version} (latest)");
        } else {
            println!("  {version}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_listed_version_is_latest() {
        let versions = vec![
            VersionToken::normalize("5.20"),
            VersionToken::normalize("v5.19a"),
        ];

        let infos = version_infos(&versions);

        assert_eq!(
            infos,
            vec![
                VersionInfo {
                    version: "v5.20".to_string(),
                    latest: true,
                },
                VersionInfo {
                    version: "v5.19a".to_string(),
                    latest: false,
                },
            ]
        );
    }

    #[test]
    fn json_shape() {
        let infos = version_infos(&[VersionToken::normalize("5.20")]);
        let json = serde_json::to_string(&infos).unwrap();
        assert_eq!(json, r#"[{"version":"v5.20","latest":true}]"#);
    }
}
