//! Settings resolution for the install commands.
//!
//! Every setting is taken from the first source that provides it: command
//! line flag, environment variable, `ttsdk.toml`, built-in default.
//!
//! ```toml
//! [sdk]
//! version = "v5.20"
//! edition = "pro"
//! catalog_url = "https://bearware.dk/teamtalksdk"
//! keep_test_fixtures = false
//!
//! [retry]
//! base_ms = 1000
//! exponent = 2.0
//! max_ms = 60000
//! max_tries = 5
//! jitter = "half"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use ttsdk_backoff::{Backoff, BackoffConfig, Jitter};
use ttsdk_installer::{
    CatalogClient, DEFAULT_CATALOG_URL, InstallOptions, InstallRoot, Installer,
};

use crate::commands::install::InstallArgs;

pub const VERSION_ENV: &str = "TTSDK_VERSION";
pub const EDITION_ENV: &str = "TTSDK_EDITION";
pub const CATALOG_URL_ENV: &str = "TTSDK_CATALOG_URL";
pub const CONFIG_ENV: &str = "TTSDK_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ttsdk.toml";

/// Contents of `ttsdk.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub sdk: SdkSection,
    #[serde(default)]
    pub retry: RetrySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkSection {
    pub version: Option<String>,
    pub edition: Option<String>,
    pub catalog_url: Option<String>,
    pub keep_test_fixtures: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    pub base_ms: Option<u64>,
    pub exponent: Option<f64>,
    pub max_ms: Option<u64>,
    pub max_tries: Option<u32>,
    pub jitter: Option<String>,
}

impl ConfigFile {
    /// Parses config file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the config file.
    ///
    /// `explicit` wins over `TTSDK_CONFIG`. A missing file is an error when a
    /// path was given either way; the default `./ttsdk.toml` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file cannot be read or any file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let path = match named {
            Some(path) => path,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Fully resolved settings for `install` and `ensure`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub version: Option<String>,
    pub edition: Option<String>,
    pub catalog_url: String,
    pub root: Option<PathBuf>,
    pub keep_test_fixtures: bool,
    /// `None` runs a single attempt.
    pub retry: Option<BackoffConfig>,
}

impl Settings {
    /// Resolves settings from flags, the process environment and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or holds invalid
    /// retry settings.
    pub fn load(args: &InstallArgs, config: Option<&Path>) -> Result<Self> {
        let file = ConfigFile::load(config)?;
        Self::resolve(args, &file, |key| std::env::var(key).ok())
    }

    /// Resolves settings with `env` standing in for the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[retry]` section is invalid.
    pub fn resolve(
        args: &InstallArgs,
        file: &ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let version = args
            .version
            .clone()
            .or_else(|| env(VERSION_ENV))
            .or_else(|| file.sdk.version.clone());
        let edition = args
            .edition
            .clone()
            .or_else(|| env(EDITION_ENV))
            .or_else(|| file.sdk.edition.clone());

        Ok(Self {
            version,
            edition,
            catalog_url: catalog_url(args.catalog_url.as_deref(), file, env),
            root: args.root.clone(),
            keep_test_fixtures: args.keep_test_fixtures
                || file.sdk.keep_test_fixtures.unwrap_or(false),
            retry: retry_policy(args.retries, &file.retry)?,
        })
    }

    /// Builds the installer these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the install base cannot be determined or the HTTP
    /// client cannot be built.
    pub fn installer(&self) -> Result<Installer> {
        let root = match &self.root {
            Some(base) => InstallRoot::with_root(base),
            None => InstallRoot::new()?,
        };
        let catalog = CatalogClient::new(&self.catalog_url)?;

        Ok(Installer::new(root, catalog).with_options(InstallOptions {
            keep_test_fixtures: self.keep_test_fixtures,
            ..InstallOptions::default()
        }))
    }
}

/// Resolves the catalog URL: flag, environment, config file, default.
pub fn catalog_url(
    flag: Option<&str>,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    flag.map(str::to_string)
        .or_else(|| env(CATALOG_URL_ENV))
        .or_else(|| file.sdk.catalog_url.clone())
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
}

/// Builds the backoff policy, or `None` when retries are disabled.
///
/// `retries` overrides `[retry] max_tries`. Zero tries means no retries. The
/// section is validated even when retries are disabled.
fn retry_policy(retries: Option<u32>, section: &RetrySection) -> Result<Option<BackoffConfig>> {
    let defaults = BackoffConfig::default();
    let jitter = match &section.jitter {
        Some(name) => name
            .parse::<Jitter>()
            .context("Invalid [retry] jitter setting")?,
        None => defaults.jitter,
    };

    let tries = retries.or(section.max_tries).filter(|&n| n > 0);
    let config = BackoffConfig {
        base: section
            .base_ms
            .map_or(defaults.base, Duration::from_millis),
        exponent: section.exponent.unwrap_or(defaults.exponent),
        max_value: section
            .max_ms
            .map_or(defaults.max_value, Duration::from_millis),
        max_tries: tries,
        jitter,
    };
    Backoff::new(config.clone()).context("Invalid [retry] settings")?;

    Ok(tries.map(|_| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn file(content: &str) -> ConfigFile {
        ConfigFile::parse(content).unwrap()
    }

    #[test]
    fn defaults_without_any_source() {
        let settings = Settings::resolve(&InstallArgs::default(), &ConfigFile::default(), no_env)
            .unwrap();

        assert_eq!(settings.version, None);
        assert_eq!(settings.edition, None);
        assert_eq!(settings.catalog_url, DEFAULT_CATALOG_URL);
        assert!(!settings.keep_test_fixtures);
        assert_eq!(settings.retry, None);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let config = file(
            r#"
            [sdk]
            version = "v5.18"
            edition = "standard"
            catalog_url = "https://mirror.example/sdk"
            "#,
        );
        let env = |key: &str| match key {
            VERSION_ENV => Some("v5.19a".to_string()),
            EDITION_ENV => Some("pro".to_string()),
            _ => None,
        };
        let args = InstallArgs {
            version: Some("5.20".to_string()),
            ..InstallArgs::default()
        };

        let settings = Settings::resolve(&args, &config, env).unwrap();

        assert_eq!(settings.version.as_deref(), Some("5.20"));
        assert_eq!(settings.edition.as_deref(), Some("pro"));
        assert_eq!(settings.catalog_url, "https://mirror.example/sdk");
    }

    #[test]
    fn blank_env_falls_through_to_file() {
        let config = file("[sdk]\nedition = \"pro\"\n");
        let env = |key: &str| (key == EDITION_ENV).then(|| "  ".to_string());

        let settings = Settings::resolve(&InstallArgs::default(), &config, env).unwrap();
        assert_eq!(settings.edition.as_deref(), Some("pro"));
    }

    #[test]
    fn catalog_url_env_overrides_file() {
        let config = file("[sdk]\ncatalog_url = \"https://file.example\"\n");
        let env = |key: &str| (key == CATALOG_URL_ENV).then(|| "http://localhost:1".to_string());

        assert_eq!(catalog_url(None, &config, env), "http://localhost:1");
        assert_eq!(
            catalog_url(Some("http://flag.example"), &config, env),
            "http://flag.example"
        );
    }

    #[test]
    fn keep_test_fixtures_from_file() {
        let config = file("[sdk]\nkeep_test_fixtures = true\n");
        let settings = Settings::resolve(&InstallArgs::default(), &config, no_env).unwrap();
        assert!(settings.keep_test_fixtures);
    }

    #[test]
    fn retry_section_builds_policy() {
        let config = file(
            r#"
            [retry]
            base_ms = 250
            exponent = 3.0
            max_ms = 5000
            max_tries = 4
            jitter = "full"
            "#,
        );

        let settings = Settings::resolve(&InstallArgs::default(), &config, no_env).unwrap();

        assert_eq!(
            settings.retry,
            Some(BackoffConfig {
                base: Duration::from_millis(250),
                exponent: 3.0,
                max_value: Duration::from_secs(5),
                max_tries: Some(4),
                jitter: Jitter::Full,
            })
        );
    }

    #[test]
    fn retries_flag_overrides_max_tries_and_zero_disables() {
        let config = file("[retry]\nmax_tries = 4\n");

        let args = InstallArgs {
            retries: Some(2),
            ..InstallArgs::default()
        };
        let settings = Settings::resolve(&args, &config, no_env).unwrap();
        let retry = settings.retry.unwrap();
        assert_eq!(retry.max_tries, Some(2));
        assert_eq!(retry.base, BackoffConfig::default().base);

        let args = InstallArgs {
            retries: Some(0),
            ..InstallArgs::default()
        };
        assert_eq!(Settings::resolve(&args, &config, no_env).unwrap().retry, None);
    }

    #[test]
    fn unknown_jitter_is_rejected() {
        let config = file("[retry]\nmax_tries = 1\njitter = \"wobbly\"\n");
        let err = Settings::resolve(&InstallArgs::default(), &config, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("wobbly"));
    }

    #[test]
    fn invalid_retry_section_is_rejected_when_retries_are_off() {
        let config = file("[retry]\njitter = \"wobbly\"\n");
        let err = Settings::resolve(&InstallArgs::default(), &config, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("wobbly"));

        let config = file("[retry]\nexponent = -1.0\n");
        let err = Settings::resolve(&InstallArgs::default(), &config, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("exponent"));

        let args = InstallArgs {
            retries: Some(0),
            ..InstallArgs::default()
        };
        let config = file("[retry]\nmax_tries = 3\nexponent = 0.0\n");
        assert!(Settings::resolve(&args, &config, no_env).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("[sdk]\nedtion = \"pro\"\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(ConfigFile::load(Some(&missing)).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn config_env_names_the_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[sdk]\nversion = \"v5.19a\"\n").unwrap();

        let original = std::env::var_os(CONFIG_ENV);
        // SAFETY: This test is marked #[serial_test::serial] so no other test
        // touches the environment concurrently.
        unsafe {
            std::env::set_var(CONFIG_ENV, &path);
        }
        let loaded = ConfigFile::load(None);
        unsafe {
            match original {
                Some(value) => std::env::set_var(CONFIG_ENV, value),
                None => std::env::remove_var(CONFIG_ENV),
            }
        }

        assert_eq!(loaded.unwrap().sdk.version.as_deref(), Some("v5.19a"));
    }
}
