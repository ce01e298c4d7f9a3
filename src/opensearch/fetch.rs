//! Network access for discovery.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;

/// Body and declared charset of a fetched document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Raw response bytes, possibly truncated.
    pub body: Vec<u8>,
    /// Charset from the `Content-Type` header.
    pub charset: Option<String>,
}

impl FetchedPage {
    /// A UTF-8 page without charset hint.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            body: text.into().into_bytes(),
            charset: None,
        }
    }
}

/// Fetches documents for the discoverer.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return its body.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, DiscoveryError>;
}

/// [`PageFetcher`] over a `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_document_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher from discovery settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let mut headers = HeaderMap::new();

        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/opensearchdescription+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| DiscoveryError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            max_document_bytes: config.max_document_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, DiscoveryError> {
        tracing::debug!(%url, "fetching");
        let mut response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(DiscoveryError::HttpStatus(response.status().as_u16()));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let mut body = CappedBody::new(self.max_document_bytes);
        while let Some(chunk) = response.chunk().await? {
            if !body.push(&chunk) {
                tracing::debug!(%url, limit = self.max_document_bytes, "document truncated");
                break;
            }
        }

        Ok(FetchedPage {
            body: body.into_inner(),
            charset,
        })
    }
}

/// Response body accumulator that keeps at most `limit` bytes.
#[derive(Debug)]
struct CappedBody {
    bytes: Vec<u8>,
    limit: usize,
}

impl CappedBody {
    const fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    /// Append what fits of `chunk`; false once bytes past the limit were dropped.
    fn push(&mut self, chunk: &[u8]) -> bool {
        let room = self.limit.saturating_sub(self.bytes.len());
        let kept = chunk.len().min(room);
        self.bytes.extend_from_slice(&chunk[..kept]);
        kept == chunk.len()
    }

    fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

/// Extract the `charset` parameter of a `Content-Type` value.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}
