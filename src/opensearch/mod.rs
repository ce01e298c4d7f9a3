//! OpenSearch autodiscovery.
//!
//! Discovery runs in two sequential phases:
//! 1. fetch the seed page and locate its
//!    `<link rel="search" type="application/opensearchdescription+xml">`;
//! 2. fetch that description and extract the HTML results template and
//!    short name.
//!
//! Each call to [`OpenSearchDiscoverer::discover`] is independent and
//! resolves exactly once. Dropping the future cancels the in-flight fetch.

pub mod cache;
pub mod description;
pub mod fetch;
pub mod link;

pub use cache::DiscoveryCache;
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};

use url::Url;

use crate::encoding::CharacterEncoder;
use crate::engines::authoring;
use crate::error::DiscoveryError;

/// Candidate engine found on a site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenSearchResult {
    /// Short name from the description; may be empty.
    pub name: String,
    /// Template URL with the terms placeholder in place of `{searchTerms}`.
    pub url: Option<Url>,
}

impl OpenSearchResult {
    /// Whether a usable template was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.url.is_some()
    }

    /// The template materialized with the magic word, for the user to try.
    #[must_use]
    pub fn testing_url(&self) -> Option<Url> {
        let template = authoring::split_template_url(self.url.as_ref()?.as_str()).ok()?;
        authoring::testing_url(&template, None).ok()
    }
}

/// Parse user input as a seed URL, assuming https when no scheme is given.
///
/// # Errors
/// Returns an error if the input does not form a valid URL.
pub fn normalize_seed(input: &str) -> Result<Url, DiscoveryError> {
    let input = input.trim();
    if input.contains("://") {
        Ok(Url::parse(input)?)
    } else {
        Ok(Url::parse(&format!("https://{input}"))?)
    }
}

/// Runs discovery attempts against a [`PageFetcher`].
#[derive(Clone, Debug)]
pub struct OpenSearchDiscoverer<F = HttpFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> OpenSearchDiscoverer<F> {
    /// Create a discoverer over `fetcher`.
    #[must_use]
    pub const fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Discover the site's OpenSearch engine. Failures of any phase yield an
    /// empty result.
    pub async fn discover(&self, seed: &Url) -> OpenSearchResult {
        match self.try_discover(seed).await {
            Ok(result) => result,
            Err(e) if e.is_network() => {
                tracing::warn!(%seed, error = %e, "OpenSearch discovery failed");
                OpenSearchResult::default()
            }
            Err(e) => {
                tracing::debug!(%seed, error = %e, "no OpenSearch description");
                OpenSearchResult::default()
            }
        }
    }

    /// Discover the site's OpenSearch engine, reporting why it failed.
    ///
    /// # Errors
    /// Returns the error of the phase that stopped the attempt.
    pub async fn try_discover(&self, seed: &Url) -> Result<OpenSearchResult, DiscoveryError> {
        let page = self.fetcher.fetch(seed).await?;
        let html = CharacterEncoder::decode_with_hint(&page.body, page.charset.as_deref());
        let description_url = link::find_description_url(&html, seed)?;

        tracing::debug!(%description_url, "fetching OpenSearch description");
        let document = self.fetcher.fetch(&description_url).await?;
        let xml = CharacterEncoder::decode_with_hint(&document.body, document.charset.as_deref());
        let found = description::parse_description(&xml)?;

        let name = found.short_name.unwrap_or_default();
        let url = match found.template {
            Some(template) => {
                let materialized = description::materialize_template(&template)?;
                match description_url.join(&materialized) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        tracing::debug!(%template, error = %e, "template is not a valid URL");
                        None
                    }
                }
            }
            None => {
                tracing::debug!(%description_url, "description has no text/html template");
                None
            }
        };

        Ok(OpenSearchResult { name, url })
    }
}
