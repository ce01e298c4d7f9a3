//! Turning a full input line into the URL to open.

use url::Url;

use crate::engines::{EngineRegistry, SearchEngine};
use crate::error::ResolveError;
use crate::injector::inject_engine;
use crate::matcher::{MatcherState, classify, split_shortcut};

/// A search ready to be handed to the URL opener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSearch {
    /// Shortcut of the engine used.
    pub shortcut: String,
    /// Terms injected into the template.
    pub terms: String,
    /// Final URL.
    pub url: Url,
    /// Whether the URL targets another application rather than the browser.
    pub opens_externally: bool,
}

/// Whether `url` has to be opened by an application other than the browser.
#[must_use]
pub fn opens_externally(url: &Url) -> bool {
    !matches!(url.scheme(), "http" | "https")
}

/// Resolve `input` against the registry.
///
/// A committed shortcut searches the text after it. Otherwise, or when the
/// shortcut's template cannot be filled, the whole input goes to the default
/// engine.
///
/// # Errors
/// Returns [`ResolveError::NoEngine`] when nothing matches and there is no
/// default engine, or the injection error of the engine that was tried last.
pub fn resolve<R>(input: &str, registry: &R) -> Result<ResolvedSearch, ResolveError>
where
    R: EngineRegistry + ?Sized,
{
    let classification = classify(&MatcherState::new(), input, registry);

    if let Some(engine) = classification.state.current() {
        let terms = split_shortcut(input).1.unwrap_or_default().trim();
        match search_with(engine, terms) {
            Ok(resolved) => return Ok(resolved),
            Err(e) => {
                tracing::warn!(
                    shortcut = %engine.shortcut,
                    error = %e,
                    "falling back to default engine"
                );
                if registry.default_engine().is_none() {
                    return Err(e.into());
                }
            }
        }
    }

    let engine = registry.default_engine().ok_or(ResolveError::NoEngine)?;
    Ok(search_with(engine, input.trim())?)
}

fn search_with(
    engine: &SearchEngine,
    terms: &str,
) -> Result<ResolvedSearch, crate::error::InjectionError> {
    let url = inject_engine(terms, engine)?;
    tracing::debug!(shortcut = %engine.shortcut, %url, "resolved search");
    Ok(ResolvedSearch {
        shortcut: engine.shortcut.clone(),
        terms: terms.to_string(),
        opens_externally: opens_externally(&url),
        url,
    })
}
