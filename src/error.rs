//! Error types for templating, discovery and the engine registry.

use thiserror::Error;

/// Errors produced while injecting terms into an engine template.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The base URL does not parse.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(url::ParseError),

    /// A pre-encoded query value contains a malformed percent escape.
    #[error("malformed percent-encoding in query parameter `{key}`")]
    MalformedEscape {
        /// Offending query parameter name.
        key: String,
    },

    /// The assembled string is not a valid URL.
    #[error("assembled URL is invalid: {0}")]
    InvalidUrl(url::ParseError),
}

/// Errors that stop an OpenSearch discovery attempt.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The seed URL could not be parsed.
    #[error("invalid seed URL: {0}")]
    InvalidSeed(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Server answered with a non-success status.
    #[error("server returned status {0}")]
    HttpStatus(u16),

    /// No OpenSearch `<link>` tag before the end of the document head.
    #[error("no OpenSearch description link found")]
    TagNotFound,

    /// The isolated `<link>` fragment could not be parsed.
    #[error("OpenSearch link tag could not be parsed: {0}")]
    TagUnparseable(String),

    /// The link tag has no `href`.
    #[error("OpenSearch link tag has no href")]
    MissingHref,

    /// The `href` does not resolve against the seed URL.
    #[error("OpenSearch href is not a valid URL: {0}")]
    InvalidHref(String),

    /// The description document is not well-formed XML.
    #[error("malformed OpenSearch description: {0}")]
    MalformedXml(String),

    /// Template parameter pattern error.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl DiscoveryError {
    /// Whether the failure came from the transport rather than the content.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::HttpClient(_) | Self::HttpStatus(_)
        )
    }
}

/// Errors raised by the engine store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Shortcut is empty.
    #[error("shortcut must not be empty")]
    EmptyShortcut,

    /// Shortcut contains characters unusable in a file name or in matching.
    #[error("shortcut `{0}` contains whitespace, separators or control characters")]
    InvalidShortcut(String),

    /// Another engine already uses the shortcut.
    #[error("shortcut `{0}` is already in use")]
    DuplicateShortcut(String),

    /// No engine has the shortcut.
    #[error("no engine with shortcut `{0}`")]
    UnknownShortcut(String),

    /// Persisted store could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted store is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from turning an input line into a URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No shortcut matched and no default engine is set.
    #[error("no engine matches the input and no default engine is set")]
    NoEngine,

    /// Term injection failed.
    #[error(transparent)]
    Injection(#[from] InjectionError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
