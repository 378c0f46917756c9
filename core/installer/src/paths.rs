//! Filesystem locations used by the installer.
//!
//! All stages operate on an explicit [`InstallRoot`]. The default base directory
//! is `<data dir>/ttsdk`, which can be overridden by setting the `TTSDK_HOME`
//! environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! <base>/                     # InstallRoot base (or TTSDK_HOME)
//!   ttsdk.7z                  # Downloaded archive (removed after install)
//!   ttsdk.7z.part             # In-flight download
//!   ttsdk/                    # Extraction root (removed after install)
//!     tt5sdk_v5.19a_win64/    # Package root inside the archive
//!       Library/
//!         TeamTalk_DLL/
//!         TeamTalkPy/
//!   implementation/           # Installed layout
//!     TeamTalk_DLL/           # Native binaries
//!     TeamTalkPy/             # Language binding
//!       __init__.py           # Marker file
//! ```

use std::path::{Path, PathBuf};

use crate::archive::ArchiveFormat;
use crate::error::{IoContext, SdkError};
use crate::platform::PlatformTarget;

/// Environment variable to override the default base directory.
pub const HOME_ENV: &str = "TTSDK_HOME";

/// Native binaries subtree, both inside the package and in the installed layout.
pub const NATIVE_DIR: &str = "TeamTalk_DLL";

/// Language binding subtree, both inside the package and in the installed layout.
pub const BINDING_DIR: &str = "TeamTalkPy";

/// Directory inside the package root that holds both subtrees.
pub const PACKAGE_LIBRARY_DIR: &str = "Library";

/// Marker file rewritten into the binding subtree after relocation.
pub const BINDING_MARKER: &str = "__init__.py";

/// Test fixtures bundled inside the binding subtree.
pub const FIXTURES_DIR: &str = "test";

const LAYOUT_DIR: &str = "implementation";
const EXTRACT_DIR: &str = "ttsdk";
const ARCHIVE_STEM: &str = "ttsdk";

/// Location of the single installed SDK and its transient files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
    base: PathBuf,
}

impl InstallRoot {
    /// Creates a root from `TTSDK_HOME`, falling back to the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined for the user.
    pub fn new() -> Result<Self, SdkError> {
        if let Some(home) = std::env::var_os(HOME_ENV)
            && !home.is_empty()
        {
            return Ok(Self::with_root(PathBuf::from(home)));
        }

        let data = dirs::data_dir().ok_or_else(|| {
            SdkError::config(format!(
                "could not determine a data directory; set {HOME_ENV} to choose one"
            ))
        })?;
        Ok(Self::with_root(data.join("ttsdk")))
    }

    /// Creates a root at an explicit base directory.
    pub fn with_root(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Fixed path the artifact is downloaded to.
    #[must_use]
    pub fn archive_path(&self, format: ArchiveFormat) -> PathBuf {
        self.base.join(format!("{ARCHIVE_STEM}.{}", format.extension()))
    }

    /// Temporary path used while the download is in flight.
    #[must_use]
    pub fn partial_archive_path(&self, format: ArchiveFormat) -> PathBuf {
        self.base
            .join(format!("{ARCHIVE_STEM}.{}.part", format.extension()))
    }

    #[must_use]
    pub fn extraction_dir(&self) -> PathBuf {
        self.base.join(EXTRACT_DIR)
    }

    /// Directory holding the two installed subtrees.
    #[must_use]
    pub fn layout_dir(&self) -> PathBuf {
        self.base.join(LAYOUT_DIR)
    }

    #[must_use]
    pub fn native_dir(&self) -> PathBuf {
        self.layout_dir().join(NATIVE_DIR)
    }

    #[must_use]
    pub fn binding_dir(&self) -> PathBuf {
        self.layout_dir().join(BINDING_DIR)
    }

    #[must_use]
    pub fn fixtures_dir(&self) -> PathBuf {
        self.binding_dir().join(FIXTURES_DIR)
    }

    /// Path of the native library the runtime loads on `platform`.
    #[must_use]
    pub fn native_library(&self, platform: PlatformTarget) -> PathBuf {
        self.native_dir().join(platform.native_library())
    }

    /// Returns `true` when both installed subtrees exist and are non-empty.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        has_entries(&self.native_dir()) && has_entries(&self.binding_dir())
    }

    /// Creates the base directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_base(&self) -> Result<(), SdkError> {
        std::fs::create_dir_all(&self.base).io_context("Failed to create directory", &self.base)
    }
}

/// Returns `true` if `dir` is a directory with at least one entry.
pub(crate) fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
