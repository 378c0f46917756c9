#![warn(clippy::pedantic)]

//! TeamTalk 5 SDK acquisition and installation.
//!
//! This crate downloads the SDK build matching the host platform and the
//! requested edition from the remote catalog, and installs it into a fixed
//! layout under an [`InstallRoot`].
//!
//! ## Modules
//!
//! - [`platform`] - Host to catalog build target mapping
//! - [`edition`] - Standard/professional edition normalization
//! - [`catalog`] - Version listing fetch, parse and resolution
//! - [`download`] - Streaming artifact download
//! - [`archive`] - 7-Zip, ZIP and tar.gz extraction
//! - [`relocate`] - Layout relocation, verification, aliasing and cleanup
//! - [`orchestrator`] - The full install pipeline
//! - [`paths`] - Install root layout
//! - [`report`] - Progress reporting
//! - [`error`] - Error type

pub mod archive;
pub mod catalog;
pub mod download;
pub mod edition;
pub mod error;
pub mod orchestrator;
pub mod paths;
pub mod platform;
pub mod relocate;
pub mod report;

pub use archive::ArchiveFormat;
pub use catalog::{CatalogClient, DEFAULT_CATALOG_URL, VersionToken};
pub use edition::Edition;
pub use error::SdkError;
pub use orchestrator::{InstallOptions, InstalledSdk, Installer};
pub use paths::InstallRoot;
pub use platform::{Host, PlatformTarget};
pub use report::{ConsoleReporter, NullReporter, Reporter};
