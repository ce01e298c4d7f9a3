//! Locating the OpenSearch description link in a web page.
//!
//! Arbitrary pages are rarely well-formed, so the page is never parsed as a
//! whole. The candidate `<link ...>` tag is cut out of the raw text first and
//! only that fragment goes through the HTML parser.

use scraper::{Html, Selector};
use url::Url;

use crate::error::DiscoveryError;

/// MIME type advertised by OpenSearch autodiscovery links.
pub const OPENSEARCH_TYPE: &str = "application/opensearchdescription+xml";

/// Attributes read from an isolated `<link>` tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkTag {
    /// `rel` attribute.
    pub rel: Option<String>,
    /// `type` attribute.
    pub mime_type: Option<String>,
    /// `href` attribute.
    pub href: Option<String>,
}

impl LinkTag {
    /// Whether the tag declares an OpenSearch description.
    #[must_use]
    pub fn is_opensearch(&self) -> bool {
        let rel_is_search = self.rel.as_deref().is_some_and(|rel| {
            rel.split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("search"))
        });
        let type_matches = self
            .mime_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(OPENSEARCH_TYPE));
        rel_is_search && type_matches
    }
}

/// Find the OpenSearch description URL advertised in `html`, resolved
/// against `seed` and forced to https.
///
/// Scanning stops at the end of the document head.
///
/// # Errors
/// Returns [`DiscoveryError::TagNotFound`] when no suitable link precedes
/// `</head>`, or the error of the last candidate tag that was rejected.
pub fn find_description_url(html: &str, seed: &Url) -> Result<Url, DiscoveryError> {
    let lower = html.to_ascii_lowercase();
    let head_end = lower.find("</head>").unwrap_or(lower.len());
    let head = &lower[..head_end];

    let mut last_error = DiscoveryError::TagNotFound;
    let mut from = 0;

    while let Some(offset) = head[from..].find(OPENSEARCH_TYPE) {
        let hit = from + offset;
        from = hit + OPENSEARCH_TYPE.len();

        let Some(fragment) = isolate_link_tag(html, head, hit) else {
            tracing::debug!(position = hit, "OpenSearch type outside a link tag");
            continue;
        };

        match parse_link_tag(fragment).and_then(|tag| resolve_href(&tag, seed)) {
            Ok(Some(url)) => {
                tracing::debug!(%url, "found OpenSearch description link");
                return Ok(url);
            }
            Ok(None) => tracing::debug!(fragment, "link tag is not rel=search"),
            Err(e) => {
                tracing::debug!(fragment, error = %e, "rejected link tag");
                last_error = e;
            }
        }
    }

    if head_end < lower.len() {
        tracing::debug!("reached end of head without OpenSearch link");
    }
    Err(last_error)
}

/// Cut the smallest `<link ...>` tag around the match at `hit`.
///
/// `lower` is the ASCII-lowercased copy of `html`, so byte offsets agree.
fn isolate_link_tag<'a>(html: &'a str, lower: &str, hit: usize) -> Option<&'a str> {
    let start = lower[..hit].rfind("<link")?;
    let after_name = lower[start + "<link".len()..].chars().next()?;
    if !(after_name.is_whitespace() || after_name == '/') {
        return None;
    }
    if lower[start..hit].contains('>') {
        return None;
    }
    let end = hit + lower[hit..].find('>')? + 1;
    Some(&html[start..end])
}

/// Parse an isolated tag and read its attributes.
///
/// # Errors
/// Returns [`DiscoveryError::TagUnparseable`] if no `link` element results.
pub fn parse_link_tag(fragment: &str) -> Result<LinkTag, DiscoveryError> {
    let selector = Selector::parse("link")
        .map_err(|e| DiscoveryError::TagUnparseable(format!("Invalid selector: {e:?}")))?;
    let document = Html::parse_fragment(fragment);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| DiscoveryError::TagUnparseable(fragment.to_string()))?;

    let attr = |name: &str| element.value().attr(name).map(str::to_string);
    Ok(LinkTag {
        rel: attr("rel"),
        mime_type: attr("type"),
        href: attr("href"),
    })
}

/// Resolve the tag's `href`; `Ok(None)` when the tag is not a search link.
fn resolve_href(tag: &LinkTag, seed: &Url) -> Result<Option<Url>, DiscoveryError> {
    if !tag.is_opensearch() {
        return Ok(None);
    }
    let href = tag
        .href
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(DiscoveryError::MissingHref)?;

    let mut url = seed
        .join(href)
        .map_err(|e| DiscoveryError::InvalidHref(format!("{href}: {e}")))?;
    if url.scheme() != "https" && url.set_scheme("https").is_err() {
        return Err(DiscoveryError::InvalidHref(href.to_string()));
    }
    Ok(Some(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Url {
        Url::parse("http://www.example.com/articles/page.html").unwrap()
    }

    #[test]
    fn test_absolute_path_href() {
        let html = r#"<html><head><title>x</title>
            <link rel="search" type="application/opensearchdescription+xml" href="/opensearch.xml">
            </head><body></body></html>"#;
        let url = find_description_url(html, &seed()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/opensearch.xml");
    }

    #[test]
    fn test_relative_and_protocol_relative_href() {
        let html = r#"<link rel="search" type="application/opensearchdescription+xml" href="os.xml" />"#;
        let url = find_description_url(html, &seed()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/articles/os.xml");

        let html = r#"<LINK REL="Search" TYPE="application/opensearchdescription+xml" HREF="//cdn.example.net/os.xml">"#;
        let url = find_description_url(html, &seed()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.net/os.xml");
    }

    #[test]
    fn test_attribute_order_and_entities() {
        let html = "<head><link\n  href=\"/os.xml?a=1&amp;b=2\"\n  title=\"Example\"\n  type=\"application/opensearchdescription+xml\"\n  rel=\"search\"></head>";
        let url = find_description_url(html, &seed()).unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/os.xml?a=1&b=2");
    }

    #[test]
    fn test_skips_non_search_rel() {
        let html = r#"<head>
            <link rel="alternate" type="application/opensearchdescription+xml" href="/wrong.xml">
            <link rel="search" type="application/opensearchdescription+xml" href="/right.xml">
            </head>"#;
        let url = find_description_url(html, &seed()).unwrap();
        assert_eq!(url.path(), "/right.xml");
    }

    #[test]
    fn test_stops_at_end_of_head() {
        let html = r#"<html><head></head><body>
            <link rel="search" type="application/opensearchdescription+xml" href="/late.xml">
            </body></html>"#;
        assert!(matches!(
            find_description_url(html, &seed()),
            Err(DiscoveryError::TagNotFound)
        ));
    }

    #[test]
    fn test_type_mentioned_outside_link() {
        let html = r#"<head><meta content="application/opensearchdescription+xml"></head>"#;
        assert!(matches!(
            find_description_url(html, &seed()),
            Err(DiscoveryError::TagNotFound)
        ));
    }

    #[test]
    fn test_missing_href() {
        let html = r#"<head><link rel="search" type="application/opensearchdescription+xml"></head>"#;
        assert!(matches!(
            find_description_url(html, &seed()),
            Err(DiscoveryError::MissingHref)
        ));
    }

    #[test]
    fn test_parse_link_tag() {
        let tag = parse_link_tag(
            r#"<link rel="search" type="application/opensearchdescription+xml" href="/a.xml" title="A">"#,
        )
        .unwrap();
        assert!(tag.is_opensearch());
        assert_eq!(tag.href.as_deref(), Some("/a.xml"));
    }
}
