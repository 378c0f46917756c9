//! SDK product editions.

use std::fmt;
use std::str::FromStr;

use crate::error::SdkError;

/// Product tier of the SDK. Decides the artifact file name and whether
/// edition-qualified binaries need legacy aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Edition {
    /// The freely available build.
    #[default]
    Standard,
    /// The professional build, which ships `*Pro` binaries.
    Professional,
}

impl Edition {
    /// Normalizes an optional user preference. Absent or blank input selects
    /// [`Edition::Standard`].
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] for names outside the accepted spellings.
    pub fn resolve(requested: Option<&str>) -> Result<Self, SdkError> {
        match requested.map(str::trim) {
            None | Some("") => Ok(Self::Standard),
            Some(name) => name.parse(),
        }
    }

    /// Prefix of the artifact file name in the catalog.
    #[must_use = "returns the prefix without side effects"]
    pub fn archive_prefix(self) -> &'static str {
        match self {
            Self::Standard => "tt5sdk",
            Self::Professional => "tt5prosdk",
        }
    }

    #[must_use = "returns the edition name without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Professional => "professional",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edition {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "std" | "community" => Ok(Self::Standard),
            "professional" | "pro" => Ok(Self::Professional),
            _ => Err(SdkError::config(format!(
                "edition must be 'standard' or 'pro', got '{s}'"
            ))),
        }
    }
}
