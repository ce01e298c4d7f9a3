//! Search-term injection into engine URL templates.
//!
//! UTF-8 engines get standard percent-encoding of each query value.
//! Legacy-encoded engines store their query values pre-escaped, so those are
//! only validated, and the terms are converted by [`CharacterEncoder`]. Plain
//! ASCII terms are byte-identical in every supported encoding and go through
//! the UTF-8 escaping instead.
//!
//! A literal `+` in the terms is carried through as [`PLUS_PLACEHOLDER`] and
//! only turned into `%2B` on the final string, since many servers decode a
//! bare `+` in a query as a space.

use std::collections::BTreeMap;

use url::Url;

use crate::encoding::{CharacterEncoder, CharacterEncoding};
use crate::engines::{PLUS_PLACEHOLDER, SearchEngine, TERMS_PLACEHOLDER};
use crate::error::InjectionError;

/// Inject `terms` into an engine's template.
///
/// # Errors
/// Returns an error if the base URL is invalid, a pre-encoded query value has
/// a malformed escape, or the assembled URL does not parse.
pub fn inject_engine(terms: &str, engine: &SearchEngine) -> Result<Url, InjectionError> {
    inject(
        terms,
        &engine.base_url,
        &engine.queries,
        engine.encoding.as_ref(),
    )
}

/// Inject `terms` into `base_url` and `queries`.
///
/// # Errors
/// Returns an error if the base URL is invalid, a pre-encoded query value has
/// a malformed escape, or the assembled URL does not parse.
pub fn inject(
    terms: &str,
    base_url: &str,
    queries: &BTreeMap<String, String>,
    encoding: Option<&CharacterEncoding>,
) -> Result<Url, InjectionError> {
    let encoder = encoding.and_then(CharacterEncoder::for_engine);
    let legacy_terms = encoder.map(|e| e.encode(terms)).filter(|encoded| {
        if !encoded.transformed {
            tracing::debug!("terms are plain ASCII, encoding them as UTF-8");
        }
        encoded.transformed
    });

    let mut url = Url::parse(base_url).map_err(InjectionError::InvalidBaseUrl)?;

    // Legacy engines store their values pre-escaped whatever the terms are.
    if !queries.is_empty() {
        let query = if encoder.is_some() {
            raw_queries(queries)?
        } else {
            encode_queries(queries, &terms.replace('+', PLUS_PLACEHOLDER))
        };
        url.set_query(Some(&query));
    }

    let replacement = legacy_terms.map_or_else(
        || urlencoding::encode(&terms.replace('+', PLUS_PLACEHOLDER)).into_owned(),
        |encoded| encoded.text.replace('+', PLUS_PLACEHOLDER),
    );

    let assembled = url
        .as_str()
        .replace(TERMS_PLACEHOLDER, &replacement)
        .replace(PLUS_PLACEHOLDER, "%2B");

    Url::parse(&assembled).map_err(|e| {
        tracing::debug!(url = %assembled, "assembled URL failed to parse");
        InjectionError::InvalidUrl(e)
    })
}

/// Substitute terms into each value and percent-encode every pair.
fn encode_queries(queries: &BTreeMap<String, String>, terms: &str) -> String {
    queries
        .iter()
        .map(|(key, value)| {
            let value = value.replace(TERMS_PLACEHOLDER, terms);
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Join pre-encoded pairs verbatim after checking every escape.
///
/// The terms placeholder is left in place; it is replaced on the full URL
/// string afterwards.
fn raw_queries(queries: &BTreeMap<String, String>) -> Result<String, InjectionError> {
    let mut pairs = Vec::with_capacity(queries.len());
    for (key, value) in queries {
        if !is_percent_encoded(key) || !is_percent_encoded(value) {
            tracing::debug!(%key, "query parameter is not valid percent-encoding");
            return Err(InjectionError::MalformedEscape { key: key.clone() });
        }
        pairs.push(format!("{key}={value}"));
    }
    Ok(pairs.join("&"))
}

/// Whether every `%` in `s` starts a two hex digit escape and no character
/// outside the URL query set is present raw.
#[must_use]
pub fn is_percent_encoded(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let well_formed = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
                if !well_formed {
                    return false;
                }
                i += 3;
            }
            b if !b.is_ascii_graphic() || matches!(b, b'#' | b'&' | b'=') => return false,
            _ => i += 1,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_queries() -> BTreeMap<String, String> {
        let mut queries = BTreeMap::new();
        queries.insert("q".to_string(), TERMS_PLACEHOLDER.to_string());
        queries
    }

    #[test]
    fn test_spaces_are_percent_encoded() {
        let url = inject(
            "hello world",
            "https://example.com/search",
            &google_queries(),
            None,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=hello%20world");
    }

    #[test]
    fn test_plus_is_preserved() {
        let url = inject("a+b", "https://example.com/search", &google_queries(), None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=a%2Bb");
        let decoded = urlencoding::decode(url.query().unwrap().trim_start_matches("q=")).unwrap();
        assert_eq!(decoded, "a+b");
    }

    #[test]
    fn test_placeholder_in_path_with_empty_queries() {
        let base = format!("https://x.com/go/{TERMS_PLACEHOLDER}");
        let url = inject("cats", &base, &BTreeMap::new(), None).unwrap();
        assert_eq!(url.as_str(), "https://x.com/go/cats");
    }

    #[test]
    fn test_path_terms_are_encoded() {
        let base = format!("https://x.com/go/{TERMS_PLACEHOLDER}");
        let url = inject("c++ & rust", &base, &BTreeMap::new(), None).unwrap();
        assert_eq!(url.as_str(), "https://x.com/go/c%2B%2B%20%26%20rust");
    }

    #[test]
    fn test_no_queries_no_placeholder_passes_through() {
        let url = inject("ignored", "https://example.com/home", &BTreeMap::new(), None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/home");
    }

    #[test]
    fn test_literal_values_and_partial_templates() {
        let mut queries = google_queries();
        queries.insert("hl".to_string(), "en".to_string());
        queries.insert("tag".to_string(), format!("lang:{TERMS_PLACEHOLDER}"));
        let url = inject("rust", "https://example.com/s", &queries, None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/s?hl=en&q=rust&tag=lang%3Arust"
        );
    }

    #[test]
    fn test_unicode_terms_utf8() {
        let url = inject("café", "https://example.com/s", &google_queries(), None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/s?q=caf%C3%A9");
    }

    #[test]
    fn test_legacy_encoding() {
        let encoding = CharacterEncoding::from_label("euc-kr");
        let url = inject(
            "한글",
            "https://search.example.kr/search",
            &google_queries(),
            Some(&encoding),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://search.example.kr/search?q=%C7%D1%B1%DB");
    }

    #[test]
    fn test_legacy_encoding_ascii_terms_keep_raw_values() {
        let encoding = CharacterEncoding::from_label("euc-kr");
        let mut queries = google_queries();
        queries.insert("where".to_string(), "%C7%D1".to_string());
        let url = inject("a+b c", "https://example.kr/s", &queries, Some(&encoding)).unwrap();
        assert_eq!(url.as_str(), "https://example.kr/s?q=a%2Bb%20c&where=%C7%D1");
    }

    #[test]
    fn test_legacy_encoding_rejects_raw_literal_for_ascii_terms() {
        let encoding = CharacterEncoding::from_label("euc-kr");
        let mut queries = google_queries();
        queries.insert("where".to_string(), "a b".to_string());
        let err = inject("rust", "https://example.kr/s", &queries, Some(&encoding)).unwrap_err();
        assert!(matches!(err, InjectionError::MalformedEscape { key } if key == "where"));
    }

    #[test]
    fn test_legacy_encoding_rejects_malformed_escape() {
        let encoding = CharacterEncoding::from_label("euc-kr");
        let mut queries = google_queries();
        queries.insert("bad".to_string(), "50%".to_string());
        let err = inject("한글", "https://example.kr/s", &queries, Some(&encoding)).unwrap_err();
        assert!(matches!(err, InjectionError::MalformedEscape { key } if key == "bad"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = inject("x", "not a url", &google_queries(), None).unwrap_err();
        assert!(matches!(err, InjectionError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_is_percent_encoded() {
        assert!(is_percent_encoded("abc%20def"));
        assert!(is_percent_encoded("%C7%D1"));
        assert!(is_percent_encoded(""));
        assert!(!is_percent_encoded("50%"));
        assert!(!is_percent_encoded("%4"));
        assert!(!is_percent_encoded("%zz"));
        assert!(!is_percent_encoded("a b"));
        assert!(!is_percent_encoded("é"));
    }
}
