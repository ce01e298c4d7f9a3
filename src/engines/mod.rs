//! Search engine model.
//!
//! An engine is a base URL plus a map of query parameters whose values may
//! carry [`TERMS_PLACEHOLDER`]. The placeholder can also sit directly in the
//! base URL for sites that take the search terms in the path.

pub mod authoring;
pub mod registry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::CharacterEncoding;

pub use authoring::EngineTemplate;
pub use registry::{EngineRegistry, EngineStore};

/// Stored sentinel marking where user terms are inserted.
///
/// Alphanumeric only, so percent-encoding leaves it untouched.
pub const TERMS_PLACEHOLDER: &str = "sQ7vTq2xKp9WmL4zRb8NfJ3cYh6DgE5uTERMSa1";

/// Internal stand-in for a literal `+` while a URL is being assembled.
///
/// This is [`TERMS_PLACEHOLDER`] reversed.
pub const PLUS_PLACEHOLDER: &str = "1aSMRETu5EgD6hYc3JfN8bRz4LmW9pKx2qTv7Qs";

/// Transient sentinel used while authoring an engine from a sample URL.
pub const MAGIC_WORD: &str = "123";

/// A stored search engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    /// Display name.
    pub name: String,
    /// Unique token typed before the search terms.
    pub shortcut: String,
    /// URL without its query string; may embed the terms placeholder.
    pub base_url: String,
    /// Query parameter name to value template.
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
    /// Whether the shortcut is active.
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    /// Legacy encoding expected by the site; `None` means UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<CharacterEncoding>,
}

const fn default_enabled() -> bool {
    true
}

impl SearchEngine {
    /// Create an enabled UTF-8 engine.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        shortcut: impl Into<String>,
        base_url: impl Into<String>,
        queries: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            shortcut: shortcut.into(),
            base_url: base_url.into(),
            queries,
            is_enabled: true,
            encoding: None,
        }
    }

    /// Build an engine from an authored template.
    #[must_use]
    pub fn from_template(
        name: impl Into<String>,
        shortcut: impl Into<String>,
        template: EngineTemplate,
    ) -> Self {
        Self::new(name, shortcut, template.base_url, template.queries)
    }

    /// Set the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    /// Attach a legacy character encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: CharacterEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Whether the engine template contains a terms insertion point.
    #[must_use]
    pub fn has_terms_slot(&self) -> bool {
        self.base_url.contains(TERMS_PLACEHOLDER)
            || self.queries.values().any(|v| v.contains(TERMS_PLACEHOLDER))
    }
}
