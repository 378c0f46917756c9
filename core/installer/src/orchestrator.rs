//! The install pipeline.
//!
//! [`Installer::install`] runs every stage in order and stops at the first
//! failure:
//!
//! 1. Resolve the edition and the host platform (no network before this passes)
//! 2. Fetch the catalog listing and resolve the version
//! 3. Download the artifact
//! 4. Extract it
//! 5. Relocate the subtrees, verify them, add professional aliases
//! 6. Clean up transient files (failures here are only reported)
//!
//! Nothing is retried here. Callers that want retries wrap the call in a
//! backoff loop and consult [`SdkError::is_retryable`].

use std::path::PathBuf;

use crate::archive::{self, ArchiveFormat};
use crate::catalog::{CatalogClient, VersionToken};
use crate::download::download_file;
use crate::edition::Edition;
use crate::error::SdkError;
use crate::paths::InstallRoot;
use crate::platform::{Host, PlatformTarget};
use crate::relocate;
use crate::report::{ConsoleReporter, Reporter};

/// Tunables for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Archive format requested from the catalog.
    pub format: ArchiveFormat,
    /// Leave the binding subtree's bundled test fixtures in place.
    pub keep_test_fixtures: bool,
}

/// Summary of a successful installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledSdk {
    pub version: VersionToken,
    pub edition: Edition,
    pub platform: PlatformTarget,
    /// Directory containing the two installed subtrees.
    pub layout_dir: PathBuf,
    /// Legacy-named copies created for the professional edition.
    pub aliases: Vec<PathBuf>,
}

/// Sequences the installation stages against one [`InstallRoot`].
pub struct Installer {
    root: InstallRoot,
    catalog: CatalogClient,
    host: Host,
    options: InstallOptions,
    reporter: Box<dyn Reporter>,
}

impl Installer {
    /// Creates an installer for the running host that reports to the console.
    #[must_use]
    pub fn new(root: InstallRoot, catalog: CatalogClient) -> Self {
        Self {
            root,
            catalog,
            host: Host::current(),
            options: InstallOptions::default(),
            reporter: Box::new(ConsoleReporter),
        }
    }

    /// Targets `host` instead of the running machine.
    #[must_use]
    pub fn with_host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    #[must_use]
    pub fn root(&self) -> &InstallRoot {
        &self.root
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Installs the requested SDK, replacing any previous installation.
    ///
    /// `version` of `None` selects the latest catalog release; `edition` of
    /// `None` selects the standard edition.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. Cleanup failures are reported as
    /// warnings and do not fail the install.
    pub async fn install(
        &self,
        version: Option<&str>,
        edition: Option<&str>,
    ) -> Result<InstalledSdk, SdkError> {
        let edition = Edition::resolve(edition)?;
        let platform = PlatformTarget::resolve_for(self.host)?;
        let format = self.options.format;

        self.reporter
            .stage(&format!("Installing TeamTalk SDK {edition} for {platform}"));
        self.root.ensure_base()?;

        self.reporter.stage(&format!(
            "Fetching version listing from {}...",
            self.catalog.listing_url()
        ));
        let version = self.catalog.resolve(version).await?;

        let url = self.catalog.artifact_url(&version, edition, platform, format);
        self.reporter
            .stage(&format!("Downloading {version} from {url}..."));
        let archive_path = self.root.archive_path(format);
        download_file(
            self.catalog.http(),
            &url,
            &archive_path,
            &self.root.partial_archive_path(format),
            self.reporter.as_ref(),
        )
        .await?;

        self.reporter.stage("Extracting...");
        let extraction = self.root.extraction_dir();
        archive::extract(&archive_path, &extraction)?;

        self.reporter.stage("Moving SDK components...");
        relocate::relocate(&extraction, &self.root)?;
        relocate::verify(&self.root)?;
        let aliases = relocate::alias(edition, &self.root)?;

        self.reporter.stage("Cleaning up...");
        if let Err(e) = relocate::clean(&self.root, format, self.options.keep_test_fixtures) {
            tracing::warn!(error = %e, "cleanup failed");
            self.reporter.warning(&format!("cleanup failed: {e}"));
        }

        let layout_dir = self.root.layout_dir();
        self.reporter.stage(&format!(
            "TeamTalk SDK {version} installed to {}",
            layout_dir.display()
        ));

        Ok(InstalledSdk {
            version,
            edition,
            platform,
            layout_dir,
            aliases,
        })
    }

    /// Installs only if the layout is not already complete.
    ///
    /// Returns `None` when an existing installation was kept.
    ///
    /// # Errors
    ///
    /// Configuration and platform errors are reported even when nothing needs
    /// installing; otherwise as for [`Installer::install`].
    pub async fn ensure(
        &self,
        version: Option<&str>,
        edition: Option<&str>,
    ) -> Result<Option<InstalledSdk>, SdkError> {
        Edition::resolve(edition)?;
        PlatformTarget::resolve_for(self.host)?;

        if self.root.is_installed() {
            tracing::debug!(root = %self.root.base().display(), "layout already complete");
            self.reporter.stage(&format!(
                "TeamTalk SDK already installed at {}",
                self.root.layout_dir().display()
            ));
            return Ok(None);
        }

        self.install(version, edition).await.map(Some)
    }
}
