//! OpenSearch 1.1 description documents.
//!
//! Only the subset needed to build a search engine is read: the first
//! `ShortName` and the first `Url` of type `text/html` whose `rel` is absent
//! or `results`. Reading stops as soon as both are known.

use std::borrow::Cow;
use std::ops::ControlFlow;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use crate::engines::TERMS_PLACEHOLDER;
use crate::error::DiscoveryError;

/// Template token replaced by the user's terms.
pub const SEARCH_TERMS_TOKEN: &str = "{searchTerms}";

/// Any OpenSearch template parameter, e.g. `{startPage?}`.
static TEMPLATE_PARAMETER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}"));

/// Fields extracted from a description document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenSearchDescription {
    /// First `ShortName`, trimmed.
    pub short_name: Option<String>,
    /// Raw `template` of the selected `Url` element.
    pub template: Option<String>,
}

#[derive(Default)]
struct DescriptionVisitor {
    found: OpenSearchDescription,
    short_name_text: Option<String>,
}

impl DescriptionVisitor {
    fn visit(&mut self, event: &Event<'_>) -> Result<ControlFlow<()>, DiscoveryError> {
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ShortName" if self.found.short_name.is_none() => {
                    self.short_name_text = Some(String::new());
                }
                b"Url" => self.visit_url(e)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"ShortName" if self.found.short_name.is_none() => {
                    self.found.short_name = Some(String::new());
                }
                b"Url" => self.visit_url(e)?,
                _ => {}
            },
            Event::Text(e) => {
                if let Some(text) = self.short_name_text.as_mut() {
                    let unescaped = e.unescape().map_err(xml_error)?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(text) = self.short_name_text.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"ShortName" => {
                if let Some(text) = self.short_name_text.take() {
                    self.found.short_name = Some(text.trim().to_string());
                }
            }
            Event::Eof => return Ok(ControlFlow::Break(())),
            _ => {}
        }

        if self.found.short_name.is_some() && self.found.template.is_some() {
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn visit_url(&mut self, element: &BytesStart<'_>) -> Result<(), DiscoveryError> {
        if self.found.template.is_some() {
            return Ok(());
        }

        let mut mime_type = None;
        let mut rel = None;
        let mut method = None;
        let mut template = None;
        for attr in element.attributes() {
            let attr = attr.map_err(|e| DiscoveryError::MalformedXml(e.to_string()))?;
            let value = attr.unescape_value().map_err(xml_error)?;
            match attr.key.local_name().as_ref() {
                b"type" => mime_type = Some(value),
                b"rel" => rel = Some(value),
                b"method" => method = Some(value),
                b"template" => template = Some(value),
                _ => {}
            }
        }

        let is_html = mime_type.as_deref().is_some_and(|t| t.trim() == "text/html");
        let is_results = rel.as_deref().is_none_or(|r| r.trim() == "results");
        let is_get = method
            .as_deref()
            .is_none_or(|m| m.trim().eq_ignore_ascii_case("get"));

        if is_html && is_results && is_get {
            self.found.template = template.map(Cow::into_owned);
        }
        Ok(())
    }
}

fn xml_error(e: quick_xml::Error) -> DiscoveryError {
    DiscoveryError::MalformedXml(e.to_string())
}

/// Parse a description document.
///
/// # Errors
/// Returns [`DiscoveryError::MalformedXml`] if the document is not
/// well-formed up to the point where the needed fields were found.
pub fn parse_description(xml: &str) -> Result<OpenSearchDescription, DiscoveryError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut visitor = DescriptionVisitor::default();
    loop {
        let event = reader.read_event().map_err(|e| {
            DiscoveryError::MalformedXml(format!("{e} at byte {}", reader.buffer_position()))
        })?;
        if visitor.visit(&event)?.is_break() {
            break;
        }
    }

    if visitor.found.template.is_some() && visitor.found.short_name.is_some() {
        tracing::debug!("stopped reading description early, all fields found");
    }
    Ok(visitor.found)
}

/// Turn an OpenSearch template into a stored URL template: `{searchTerms}`
/// becomes [`TERMS_PLACEHOLDER`] and every other parameter is dropped.
///
/// # Errors
/// Returns an error if the parameter pattern failed to compile.
pub fn materialize_template(template: &str) -> Result<String, DiscoveryError> {
    let parameter = (*TEMPLATE_PARAMETER)
        .as_ref()
        .map_err(|e| DiscoveryError::Pattern(e.clone()))?;
    let with_terms = template.trim().replace(SEARCH_TERMS_TOKEN, TERMS_PLACEHOLDER);
    Ok(parameter.replace_all(&with_terms, "").into_owned())
}
