//! Conversion between Unicode text and the legacy byte encodings some search
//! sites still expect in their query strings.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

/// Encodings offered when authoring an engine, as `(display name, label)`.
const SUPPORTED: &[(&str, &str)] = &[
    ("Unicode (UTF-8)", "utf-8"),
    ("Korean (EUC-KR)", "euc-kr"),
    ("Japanese (Shift JIS)", "shift_jis"),
    ("Japanese (EUC-JP)", "euc-jp"),
    ("Simplified Chinese (GBK)", "gbk"),
    ("Traditional Chinese (Big5)", "big5"),
    ("Western (ISO Latin 1)", "iso-8859-1"),
    ("Cyrillic (Windows)", "windows-1251"),
    ("Cyrillic (KOI8-R)", "koi8-r"),
];

/// A named character encoding attached to an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEncoding {
    /// Human readable name.
    pub name: String,
    /// WHATWG encoding label, e.g. `euc-kr`.
    pub label: String,
}

impl CharacterEncoding {
    /// Build from a label, naming it after the supported list when possible.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        let name = SUPPORTED
            .iter()
            .find(|(_, l)| *l == label)
            .map_or_else(
                || {
                    Encoding::for_label(label.as_bytes())
                        .map_or_else(|| "Invalid".to_string(), |e| e.name().to_string())
                },
                |(n, _)| (*n).to_string(),
            );
        Self { name, label }
    }

    /// Encodings offered in the engine editor.
    #[must_use]
    pub fn supported() -> Vec<Self> {
        SUPPORTED
            .iter()
            .map(|(name, label)| Self {
                name: (*name).to_string(),
                label: (*label).to_string(),
            })
            .collect()
    }

    /// The resolved encoding, or `None` when the label is unrecognized.
    #[must_use]
    pub fn encoding(&self) -> Option<&'static Encoding> {
        Encoding::for_label(self.label.as_bytes())
    }

    /// Whether this is UTF-8.
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.encoding() == Some(UTF_8)
    }
}

/// Terms after legacy encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedTerms {
    /// Percent-escaped representation of the encoded bytes.
    pub text: String,
    /// Whether any non-ASCII byte was produced.
    pub transformed: bool,
}

/// Encodes and decodes text with a given legacy encoding.
#[derive(Clone, Copy, Debug)]
pub struct CharacterEncoder {
    encoding: &'static Encoding,
}

impl CharacterEncoder {
    /// Create an encoder for a resolved encoding.
    #[must_use]
    pub const fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Create an encoder from an engine's encoding; `None` for UTF-8 or
    /// unrecognized labels.
    #[must_use]
    pub fn for_engine(encoding: &CharacterEncoding) -> Option<Self> {
        match encoding.encoding() {
            Some(e) if e != UTF_8 => Some(Self::new(e)),
            Some(_) => None,
            None => {
                tracing::warn!(label = %encoding.label, "unrecognized encoding label, using UTF-8");
                None
            }
        }
    }

    /// Encode `text` into the legacy encoding and percent-escape every byte
    /// outside the URL unreserved set.
    ///
    /// `transformed` is false when the input had nothing outside ASCII, in
    /// which case callers can stay on the UTF-8 path.
    #[must_use]
    pub fn encode(&self, text: &str) -> EncodedTerms {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            tracing::debug!(
                encoding = self.encoding.name(),
                "some characters are not representable and were replaced"
            );
        }
        let transformed = bytes.iter().any(|b| !b.is_ascii());
        EncodedTerms {
            text: urlencoding::encode_binary(&bytes).into_owned(),
            transformed,
        }
    }

    /// Decode bytes into Unicode, honoring a BOM if present.
    #[must_use]
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            tracing::debug!(encoding = self.encoding.name(), "malformed input while decoding");
        }
        text
    }

    /// Decode a fetched body using an optional charset hint, falling back to
    /// UTF-8 when the hint is absent or unknown.
    #[must_use]
    pub fn decode_with_hint<'a>(bytes: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
        let encoding = charset
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .unwrap_or(UTF_8);
        Self::new(encoding).decode(bytes)
    }
}
