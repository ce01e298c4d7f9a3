//! Turning user-pasted URLs into engine templates.
//!
//! The user searches a site for [`MAGIC_WORD`] and pastes the resulting URL.
//! Every occurrence of the magic word in the query values, path or fragment
//! becomes [`TERMS_PLACEHOLDER`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{MAGIC_WORD, TERMS_PLACEHOLDER};
use crate::encoding::{CharacterEncoder, CharacterEncoding};
use crate::error::InjectionError;
use crate::injector;

/// Base URL and query templates ready to be stored in an engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTemplate {
    /// URL without query string.
    pub base_url: String,
    /// Query parameter name to value template.
    pub queries: BTreeMap<String, String>,
}

/// Build a template from a sample search URL.
///
/// Query values are decoded for UTF-8 engines and kept raw for legacy
/// encodings, matching how [`injector::inject`] treats them. Returns `None`
/// when the URL does not parse or `magic_word` appears nowhere.
#[must_use]
pub fn template_from_sample(
    sample: &str,
    magic_word: &str,
    encoding: Option<&CharacterEncoding>,
) -> Option<EngineTemplate> {
    if magic_word.is_empty() {
        return None;
    }
    let url = Url::parse(sample.trim()).ok()?;
    let legacy = encoding.and_then(CharacterEncoder::for_engine).is_some();

    let mut found = false;
    let queries = query_map(&url, legacy)
        .into_iter()
        .map(|(key, value)| {
            if value.contains(magic_word) {
                found = true;
                (key, value.replace(magic_word, TERMS_PLACEHOLDER))
            } else {
                (key, value)
            }
        })
        .collect();

    let mut base = url;
    base.set_query(None);
    if base.path().contains(magic_word) {
        found = true;
        let path = base.path().replace(magic_word, TERMS_PLACEHOLDER);
        base.set_path(&path);
    }
    if let Some(fragment) = base.fragment().filter(|f| f.contains(magic_word)) {
        found = true;
        let fragment = fragment.replace(magic_word, TERMS_PLACEHOLDER);
        base.set_fragment(Some(&fragment));
    }

    if !found {
        tracing::debug!(magic_word, "magic word not found in sample URL");
        return None;
    }

    Some(EngineTemplate {
        base_url: base.into(),
        queries,
    })
}

/// Split a full template URL, already carrying [`TERMS_PLACEHOLDER`], into
/// base URL and decoded query templates.
///
/// # Errors
/// Returns an error if `template` is not a valid URL.
pub fn split_template_url(template: &str) -> Result<EngineTemplate, url::ParseError> {
    let mut url = Url::parse(template)?;
    let queries = query_map(&url, false);
    url.set_query(None);
    Ok(EngineTemplate {
        base_url: url.into(),
        queries,
    })
}

/// Materialize a template with [`MAGIC_WORD`] so the user can check it.
///
/// # Errors
/// Returns an error if injection fails.
pub fn testing_url(
    template: &EngineTemplate,
    encoding: Option<&CharacterEncoding>,
) -> Result<Url, InjectionError> {
    injector::inject(MAGIC_WORD, &template.base_url, &template.queries, encoding)
}

fn query_map(url: &Url, raw: bool) -> BTreeMap<String, String> {
    if raw {
        url.query()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key.to_string(), value.to_string())
            })
            .collect()
    } else {
        url.query_pairs().into_owned().collect()
    }
}
