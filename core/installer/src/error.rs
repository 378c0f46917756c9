//! Error type for the SDK installation pipeline.
//!
//! Every stage returns [`SdkError`]. The variants follow the failure classes the
//! bootstrap distinguishes: configuration, unsupported host, catalog, transport,
//! archive, and layout verification. Only network failures are worth retrying;
//! see [`SdkError::is_retryable`].

use std::path::Path;

use thiserror::Error;

/// Errors produced while resolving, downloading, or installing the SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Invalid user-supplied configuration (edition name, backoff parameters, config file).
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// The host OS/architecture has no SDK build.
    #[error(
        "unsupported platform: {os} on {arch} ({bits}-bit). \
         Supported platforms are: windows x86/x86_64, linux x86_64, linux armhf"
    )]
    UnsupportedPlatform {
        /// Operating system name.
        os: String,
        /// CPU architecture name.
        arch: String,
        /// Pointer width in bits.
        bits: u32,
    },

    /// The catalog listing contained no versions.
    #[error("no TeamTalk SDK versions found at {url}")]
    EmptyCatalog {
        /// The listing URL.
        url: String,
    },

    /// The requested version does not appear in the catalog listing.
    #[error("version '{requested}' not available. Found: {}", .available.join(", "))]
    VersionNotFound {
        /// The normalized requested version.
        requested: String,
        /// Every version in the listing, in catalog order.
        available: Vec<String>,
    },

    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {url}")]
    Http {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request could not be completed (connect failure, timeout, broken stream).
    #[error("failed to fetch {url}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Extraction failed or no extraction tool is available.
    #[error("archive error: {message}\n{hint}")]
    Archive {
        /// What went wrong.
        message: String,
        /// Platform-specific remediation.
        hint: String,
    },

    /// The extracted archive does not have the expected package structure.
    #[error("unexpected archive layout: {message}")]
    UnexpectedLayout {
        /// Description of the mismatch.
        message: String,
    },

    /// A subtree is missing or empty after relocation.
    #[error("failed to move {subtree}")]
    Layout {
        /// Name of the missing subtree.
        subtree: String,
    },

    /// Filesystem failure.
    #[error("I/O error: {message}")]
    Io {
        /// The operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SdkError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an archive error carrying the remediation hint for this platform.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
            hint: extraction_hint().to_string(),
        }
    }

    /// Creates an I/O error with a description of the failed operation.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns `true` for network failures, including any non-success status.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http { .. })
    }
}

/// Remediation shown when extraction fails.
#[must_use]
pub fn extraction_hint() -> &'static str {
    if cfg!(windows) {
        "Make sure 7-Zip is installed and its directory is on your PATH."
    } else if cfg!(target_os = "macos") {
        "Make sure a 7-Zip compatible tool is installed (e.g. 'brew install sevenzip')."
    } else {
        "Make sure a 7-Zip compatible tool is installed (e.g. 'sudo apt install p7zip-full')."
    }
}

/// Adds a path-bearing description to raw I/O results.
pub(crate) trait IoContext<T> {
    fn io_context(self, action: &str, path: &Path) -> Result<T, SdkError>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &str, path: &Path) -> Result<T, SdkError> {
        self.map_err(|e| SdkError::io(format!("{action}: {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_not_found_echoes_listing() {
        let err = SdkError::VersionNotFound {
            requested: "v9.99".to_string(),
            available: vec!["v5.20".to_string(), "v5.19a".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "version 'v9.99' not available. Found: v5.20, v5.19a"
        );
    }

    #[test]
    fn unsupported_platform_names_the_combination() {
        let err = SdkError::UnsupportedPlatform {
            os: "windows".to_string(),
            arch: "aarch64".to_string(),
            bits: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("windows on aarch64"));
        assert!(msg.contains("64-bit"));
    }

    #[test]
    fn archive_error_includes_hint() {
        let err = SdkError::archive("7z exited with status 2");
        let msg = err.to_string();
        assert!(msg.contains("7z exited with status 2"));
        assert!(msg.contains("7-Zip"));
    }

    #[test]
    fn layout_error_names_subtree() {
        let err = SdkError::Layout {
            subtree: "TeamTalkPy".to_string(),
        };
        assert_eq!(err.to_string(), "failed to move TeamTalkPy");
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(
            SdkError::Http {
                url: "u".to_string(),
                status: 503
            }
            .is_retryable()
        );
        assert!(
            SdkError::Http {
                url: "u".to_string(),
                status: 429
            }
            .is_retryable()
        );
        assert!(
            SdkError::Http {
                url: "u".to_string(),
                status: 404
            }
            .is_retryable()
        );
        assert!(!SdkError::config("bad").is_retryable());
        assert!(!SdkError::archive("bad").is_retryable());
        assert!(
            !SdkError::EmptyCatalog {
                url: "u".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn io_context_mentions_path() {
        let result: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = result
            .io_context("Failed to remove", Path::new("/tmp/x"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to remove: /tmp/x"));
    }
}
