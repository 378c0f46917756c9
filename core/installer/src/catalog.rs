//! Remote SDK catalog.
//!
//! The catalog is a plain HTTP directory listing. Each release is a
//! sub-directory named after its version token (`v5.19a/`), listed newest first:
//!
//! ```html
//! <ul>
//!   <li><a href="v5.20/">v5.20/</a></li>
//!   <li><a href="v5.19a/">v5.19a/</a></li>
//! </ul>
//! ```
//!
//! Artifacts live at
//! `<base>/<version>/<edition prefix>_<version>_<platform suffix>.<ext>`.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::archive::ArchiveFormat;
use crate::edition::Edition;
use crate::error::SdkError;
use crate::platform::PlatformTarget;

/// Default catalog location.
pub const DEFAULT_CATALOG_URL: &str = "https://bearware.dk/teamtalksdk";

/// Timeout for the listing request. Artifact downloads are not bounded.
const LISTING_TIMEOUT_SECS: u64 = 10;

/// Timeout for establishing any connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User-Agent header for HTTP requests. The catalog host rejects unknown agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

static LISTING_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<li[^>]*>\s*<a\s[^>]*?href\s*=\s*["']([^"']*)["']"#)
        .expect("listing anchor pattern is valid")
});

/// A catalog release identifier such as `v5.19a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Prefix shared by every catalog version.
    pub const PREFIX: char = 'v';

    /// Brings user input into catalog form by adding the `v` prefix if missing.
    #[must_use]
    pub fn normalize(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with(Self::PREFIX) {
            Self(trimmed.to_string())
        } else {
            Self(format!("{}{trimmed}", Self::PREFIX))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_listing(href: &str) -> Option<Self> {
        let name = href.trim().trim_end_matches('/');
        let valid = name.len() > 1 && name.starts_with(Self::PREFIX) && !name.contains('/');
        valid.then(|| Self(name.to_string()))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts version tokens from a catalog listing page.
///
/// Keeps the first occurrence of each token, in page order.
#[must_use]
pub fn parse_listing(html: &str) -> Vec<VersionToken> {
    let mut seen = HashSet::new();
    LISTING_ANCHOR
        .captures_iter(html)
        .filter_map(|caps| VersionToken::from_listing(&caps[1]))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Picks the version to install from a listing.
///
/// With no request the first (latest) entry is chosen. A request is normalized
/// and must match a listed token exactly.
///
/// # Errors
///
/// Returns [`SdkError::EmptyCatalog`] for an empty listing and
/// [`SdkError::VersionNotFound`] when the request is not listed.
pub fn resolve_version(
    requested: Option<&str>,
    available: &[VersionToken],
    listing_url: &str,
) -> Result<VersionToken, SdkError> {
    let Some(latest) = available.first() else {
        return Err(SdkError::EmptyCatalog {
            url: listing_url.to_string(),
        });
    };

    let requested = match requested.map(str::trim) {
        None | Some("") => return Ok(latest.clone()),
        Some(r) => VersionToken::normalize(r),
    };

    if available.contains(&requested) {
        Ok(requested)
    } else {
        Err(SdkError::VersionNotFound {
            requested: requested.0,
            available: available.iter().map(ToString::to_string).collect(),
        })
    }
}

/// HTTP client for the catalog and its artifacts.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl CatalogClient {
    /// Creates a client for the catalog at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SdkError::Transport {
                url: base_url.to_string(),
                source: e,
            })?;
        Ok(Self::with_client(base_url, http))
    }

    /// Creates a client that reuses an existing HTTP client.
    #[must_use]
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Catalog base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the listing page.
    #[must_use]
    pub fn listing_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetches and parses the version listing.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Transport`] if the request fails or times out and
    /// [`SdkError::Http`] for a non-success status.
    pub async fn list_versions(&self) -> Result<Vec<VersionToken>, SdkError> {
        let url = self.listing_url();
        tracing::debug!(%url, "fetching catalog listing");

        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(LISTING_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| SdkError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| SdkError::Transport {
            url: url.clone(),
            source: e,
        })?;

        let versions = parse_listing(&body);
        tracing::debug!(count = versions.len(), "parsed catalog listing");
        Ok(versions)
    }

    /// Fetches the listing and resolves `requested` against it.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`CatalogClient::list_versions`] and [`resolve_version`].
    pub async fn resolve(&self, requested: Option<&str>) -> Result<VersionToken, SdkError> {
        let available = self.list_versions().await?;
        resolve_version(requested, &available, &self.listing_url())
    }

    /// URL of the artifact for the given release coordinates.
    #[must_use]
    pub fn artifact_url(
        &self,
        version: &VersionToken,
        edition: Edition,
        platform: PlatformTarget,
        format: ArchiveFormat,
    ) -> String {
        format!(
            "{base}/{version}/{prefix}_{version}_{suffix}.{ext}",
            base = self.base_url,
            prefix = edition.archive_prefix(),
            suffix = platform.as_str(),
            ext = format.extension(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn tokens(names: &[&str]) -> Vec<VersionToken> {
        names.iter().map(|n| VersionToken((*n).to_string())).collect()
    }

    const LISTING: &str = r#"
        <html><body><h1>Index of /teamtalksdk</h1>
        <ul>
          <li><a href="/"> Parent Directory</a></li>
          <li><a href="v5.20/"> v5.20/</a></li>
          <li><a href="v5.19a/"> v5.19a/</a></li>
          <li><a href="v5.19a/"> v5.19a/</a></li>
          <li><a href="README.txt"> README.txt</a></li>
          <li><a href="v/"> v/</a></li>
        </ul>
        <p><a href="v9.0/">not in a list item</a></p>
        </body></html>
    "#;

    #[test]
    fn parse_listing_dedupes_in_first_seen_order() {
        assert_eq!(parse_listing(LISTING), tokens(&["v5.20", "v5.19a"]));
    }

    #[test]
    fn parse_listing_accepts_attribute_variants() {
        let html = r#"<LI class="dir"><A title="x" HREF='v5.8/'>v5.8</A></LI>"#;
        assert_eq!(parse_listing(html), tokens(&["v5.8"]));
    }

    #[test]
    fn parse_listing_of_unrelated_page_is_empty() {
        assert!(parse_listing("<html><p>maintenance</p></html>").is_empty());
    }

    #[test]
    fn resolve_defaults_to_latest() {
        let available = tokens(&["v5.20", "v5.19a"]);
        let version = resolve_version(None, &available, "u").unwrap();
        assert_eq!(version.as_str(), "v5.20");
    }

    #[test]
    fn resolve_normalizes_missing_prefix() {
        let available = tokens(&["v5.20", "v5.19a"]);
        let version = resolve_version(Some("5.19a"), &available, "u").unwrap();
        assert_eq!(version.as_str(), "v5.19a");
        let version = resolve_version(Some("v5.20"), &available, "u").unwrap();
        assert_eq!(version.as_str(), "v5.20");
    }

    #[test]
    fn resolve_rejects_unlisted_version_with_listing() {
        let available = tokens(&["v5.20", "v5.19a"]);
        let err = resolve_version(Some("9.99"), &available, "u").unwrap_err();
        match &err {
            SdkError::VersionNotFound {
                requested,
                available,
            } => {
                assert_eq!(requested, "v9.99");
                assert_eq!(available, &["v5.20", "v5.19a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("v5.20, v5.19a"));
    }

    #[test]
    fn resolve_requires_exact_match() {
        let available = tokens(&["v5.19a"]);
        assert!(resolve_version(Some("5.19"), &available, "u").is_err());
    }

    #[test]
    fn resolve_empty_listing_is_catalog_error() {
        let err = resolve_version(None, &[], "https://host/sdk/").unwrap_err();
        assert!(matches!(err, SdkError::EmptyCatalog { ref url } if url == "https://host/sdk/"));
    }

    #[test]
    fn artifact_url_follows_catalog_scheme() {
        let client = CatalogClient::new("https://bearware.dk/teamtalksdk/").unwrap();
        let version = VersionToken::normalize("5.19a");
        assert_eq!(
            client.artifact_url(
                &version,
                Edition::Professional,
                PlatformTarget::Win64,
                ArchiveFormat::SevenZip
            ),
            "https://bearware.dk/teamtalksdk/v5.19a/tt5prosdk_v5.19a_win64.7z"
        );
        assert_eq!(
            client.artifact_url(
                &version,
                Edition::Standard,
                PlatformTarget::LinuxX86_64,
                ArchiveFormat::SevenZip
            ),
            "https://bearware.dk/teamtalksdk/v5.19a/tt5sdk_v5.19a_ubuntu22_x86_64.7z"
        );
    }

    #[tokio::test]
    async fn list_versions_fetches_and_parses() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/teamtalksdk/")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(LISTING)
            .create_async()
            .await;

        let client = CatalogClient::new(&format!("{}/teamtalksdk", server.url())).unwrap();
        let versions = client.list_versions().await.unwrap();

        assert_eq!(versions, tokens(&["v5.20", "v5.19a"]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_versions_reports_http_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = CatalogClient::new(&server.url()).unwrap();
        let err = client.list_versions().await.unwrap_err();

        assert!(matches!(err, SdkError::Http { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn list_versions_reports_transport_failure() {
        let client = CatalogClient::new("http://127.0.0.1:1").unwrap();
        let err = client.list_versions().await.unwrap_err();
        assert!(matches!(err, SdkError::Transport { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn resolve_combines_fetch_and_resolution() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(LISTING)
            .create_async()
            .await;

        let client = CatalogClient::new(&server.url()).unwrap();
        assert_eq!(client.resolve(None).await.unwrap().as_str(), "v5.20");
        assert!(matches!(
            client.resolve(Some("1.0")).await,
            Err(SdkError::VersionNotFound { .. })
        ));
    }
}
