//! Incremental shortcut detection for the search field.
//!
//! [`classify`] is called on every text change with the state returned by the
//! previous call. The caller owns one [`MatcherState`] per text field.
//!
//! An engine is *previewed* while the field holds exactly its shortcut and
//! *committed* once a separator follows it.

use crate::engines::{EngineRegistry, SearchEngine};

/// Committed engine for the text currently in the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatcherState {
    current: Option<SearchEngine>,
}

impl MatcherState {
    /// State with nothing committed.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The committed engine, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&SearchEngine> {
        self.current.as_ref()
    }

    /// Restore a state from a committed engine.
    #[must_use]
    pub const fn with_current(current: Option<SearchEngine>) -> Self {
        Self { current }
    }
}

/// Notification describing the detected engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    /// Engine whose shortcut was found, if any.
    pub engine: Option<SearchEngine>,
    /// Whether the engine is armed for searching. Always false without an
    /// engine.
    pub committed: bool,
}

impl Detection {
    const fn none() -> Self {
        Self {
            engine: None,
            committed: false,
        }
    }

    fn engine(engine: SearchEngine, committed: bool) -> Self {
        Self {
            engine: Some(engine),
            committed,
        }
    }
}

/// Outcome of one [`classify`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// State to pass to the next call.
    pub state: MatcherState,
    /// Notification for the UI; `None` when the committed engine is unchanged.
    pub detection: Option<Detection>,
}

/// Split field text into its first whitespace-delimited token and the rest.
///
/// The separator itself is dropped; the rest is returned verbatim.
#[must_use]
pub fn split_shortcut(raw: &str) -> (&str, Option<&str>) {
    raw.find(char::is_whitespace).map_or((raw, None), |idx| {
        let sep_len = raw[idx..].chars().next().map_or(1, char::len_utf8);
        (&raw[..idx], Some(&raw[idx + sep_len..]))
    })
}

/// Classify the field contents `raw` given the previous `state`.
#[must_use]
pub fn classify<R>(state: &MatcherState, raw: &str, registry: &R) -> Classification
where
    R: EngineRegistry + ?Sized,
{
    if raw.is_empty() {
        return cleared(Detection::none());
    }

    // Leading whitespace is rejected rather than trimmed so the cursor stays
    // aligned with the string.
    if raw.starts_with(char::is_whitespace) {
        tracing::debug!("leading whitespace, no shortcut");
        return cleared(Detection::none());
    }

    let (possible, rest) = split_shortcut(raw);
    let bare = rest.is_none();

    if let Some(current) = state.current() {
        if current.shortcut == possible {
            if !bare {
                return Classification {
                    state: state.clone(),
                    detection: None,
                };
            }
            // Separator deleted: report the engine once, then drop it.
            return cleared(Detection::engine(current.clone(), false));
        }
        tracing::debug!(from = %current.shortcut, to = %possible, "shortcut edited");
    }

    match lookup_enabled(registry, possible) {
        None => cleared(Detection::none()),
        Some(engine) if bare => cleared(Detection::engine(engine, false)),
        Some(engine) => Classification {
            state: MatcherState::with_current(Some(engine.clone())),
            detection: Some(Detection::engine(engine, true)),
        },
    }
}

fn cleared(detection: Detection) -> Classification {
    Classification {
        state: MatcherState::new(),
        detection: Some(detection),
    }
}

fn lookup_enabled<R>(registry: &R, shortcut: &str) -> Option<SearchEngine>
where
    R: EngineRegistry + ?Sized,
{
    registry
        .lookup(shortcut)
        .filter(|engine| engine.is_enabled)
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::engines::{EngineStore, TERMS_PLACEHOLDER};

    fn registry() -> EngineStore {
        let mut queries = BTreeMap::new();
        queries.insert("q".to_string(), TERMS_PLACEHOLDER.to_string());
        let mut store = EngineStore::in_memory();
        store
            .add(SearchEngine::new(
                "Google",
                "g",
                "https://www.google.com/search",
                queries.clone(),
            ))
            .unwrap();
        store
            .add(SearchEngine::new(
                "Wikipedia",
                "w",
                "https://en.wikipedia.org/w/index.php",
                queries.clone(),
            ))
            .unwrap();
        store
            .add(
                SearchEngine::new("Off", "off", "https://off.example.com/", queries)
                    .with_enabled(false),
            )
            .unwrap();
        store
    }

    fn shortcut_of(detection: &Detection) -> Option<&str> {
        detection.engine.as_ref().map(|e| e.shortcut.as_str())
    }

    #[test]
    fn test_empty_input() {
        let out = classify(&MatcherState::new(), "", &registry());
        assert_eq!(out.detection, Some(Detection::none()));
        assert!(out.state.current().is_none());
    }

    #[test]
    fn test_leading_whitespace_clears_committed_engine() {
        let registry = registry();
        let committed = classify(&MatcherState::new(), "g cats", &registry);
        assert!(committed.state.current().is_some());

        for text in [" g", " g cats", "\tg ", "  "] {
            let out = classify(&committed.state, text, &registry);
            assert_eq!(out.detection, Some(Detection::none()), "{text:?}");
            assert!(out.state.current().is_none());
        }
    }

    #[test]
    fn test_bare_shortcut_is_preview() {
        let out = classify(&MatcherState::new(), "g", &registry());
        let detection = out.detection.unwrap();
        assert_eq!(shortcut_of(&detection), Some("g"));
        assert!(!detection.committed);
        assert!(out.state.current().is_none());
    }

    #[test]
    fn test_separator_commits() {
        let registry = registry();
        for text in ["g ", "g cats", "g  two spaces"] {
            let out = classify(&MatcherState::new(), text, &registry);
            let detection = out.detection.unwrap();
            assert_eq!(shortcut_of(&detection), Some("g"));
            assert!(detection.committed);
            assert_eq!(out.state.current().map(|e| e.shortcut.as_str()), Some("g"));
        }
    }

    #[test]
    fn test_typing_terms_is_steady_state() {
        let registry = registry();
        let first = classify(&MatcherState::new(), "g ", &registry);
        let second = classify(&first.state, "g c", &registry);
        assert!(second.detection.is_none());
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn test_deleting_separator_reports_then_uncommits() {
        let registry = registry();
        let committed = classify(&MatcherState::new(), "g ", &registry);
        let out = classify(&committed.state, "g", &registry);
        let detection = out.detection.unwrap();
        assert_eq!(shortcut_of(&detection), Some("g"));
        assert!(!detection.committed);
        assert!(out.state.current().is_none());
    }

    #[test]
    fn test_editing_shortcut_redetects() {
        let registry = registry();
        let committed = classify(&MatcherState::new(), "g cats", &registry);

        let switched = classify(&committed.state, "w cats", &registry);
        let detection = switched.detection.unwrap();
        assert_eq!(shortcut_of(&detection), Some("w"));
        assert!(detection.committed);

        let unknown = classify(&committed.state, "gx cats", &registry);
        assert_eq!(unknown.detection, Some(Detection::none()));
        assert!(unknown.state.current().is_none());
    }

    #[test]
    fn test_unknown_disabled_and_case_sensitive() {
        let registry = registry();
        for text in ["x cats", "off cats", "off", "G cats", "goo"] {
            let out = classify(&MatcherState::new(), text, &registry);
            assert_eq!(out.detection, Some(Detection::none()), "{text:?}");
        }
    }

    #[test]
    fn test_same_text_twice_is_idempotent() {
        let registry = registry();
        for text in ["", " g", "g", "g ", "g cats", "zzz"] {
            let first = classify(&MatcherState::new(), text, &registry);
            let second = classify(&first.state, text, &registry);
            assert_eq!(first.state, second.state, "{text:?}");
            if let Some(detection) = second.detection {
                assert_eq!(Some(detection), first.detection, "{text:?}");
            }
        }
    }

    #[test]
    fn test_split_shortcut() {
        assert_eq!(split_shortcut("g"), ("g", None));
        assert_eq!(split_shortcut("g "), ("g", Some("")));
        assert_eq!(split_shortcut("g cats dogs"), ("g", Some("cats dogs")));
        assert_eq!(split_shortcut("g\u{3000}猫"), ("g", Some("猫")));
    }
}
