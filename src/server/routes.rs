//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::encoding::CharacterEncoding;
use crate::engines::{EngineRegistry, EngineTemplate, MAGIC_WORD, SearchEngine, authoring};
use crate::error::{RegistryError, ResolveError};
use crate::matcher::{Detection, MatcherState, classify};
use crate::opensearch::{OpenSearchResult, normalize_seed};
use crate::resolve::resolve;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/engines", get(list_engines).post(add_engine))
        .route("/api/engines/{shortcut}", put(update_engine).delete(remove_engine))
        .route("/api/engines/{shortcut}/default", put(set_default_engine))
        .route("/api/encodings", get(list_encodings))
        .route("/api/author", post(author_template))
        .route("/api/classify", post(classify_text))
        .route("/api/search", post(search))
        .route("/api/discover", post(discover))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shortcut-search",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Engine listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnginesResponse {
    /// Shortcut of the default engine.
    pub default: Option<String>,
    /// All engines sorted by shortcut.
    pub engines: Vec<SearchEngine>,
}

async fn list_engines(State(state): State<Arc<AppState>>) -> Json<EnginesResponse> {
    let registry = state.registry.read().await;
    Json(EnginesResponse {
        default: registry.default_shortcut().map(str::to_string),
        engines: registry.engines().cloned().collect(),
    })
}

fn registry_status(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::EmptyShortcut | RegistryError::InvalidShortcut(_) => StatusCode::BAD_REQUEST,
        RegistryError::DuplicateShortcut(_) => StatusCode::CONFLICT,
        RegistryError::UnknownShortcut(_) => StatusCode::NOT_FOUND,
        RegistryError::Io(_) | RegistryError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn add_engine(
    State(state): State<Arc<AppState>>,
    Json(engine): Json<SearchEngine>,
) -> Result<(StatusCode, Json<SearchEngine>), (StatusCode, String)> {
    let mut registry = state.registry.write().await;
    registry
        .add(engine.clone())
        .map_err(|e| (registry_status(&e), e.to_string()))?;
    Ok((StatusCode::CREATED, Json(engine)))
}

async fn update_engine(
    State(state): State<Arc<AppState>>,
    Path(shortcut): Path<String>,
    Json(engine): Json<SearchEngine>,
) -> Result<Json<SearchEngine>, (StatusCode, String)> {
    let mut registry = state.registry.write().await;
    registry
        .update(&shortcut, engine.clone())
        .map_err(|e| (registry_status(&e), e.to_string()))?;
    Ok(Json(engine))
}

async fn set_default_engine(
    State(state): State<Arc<AppState>>,
    Path(shortcut): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut registry = state.registry.write().await;
    registry
        .set_default(&shortcut)
        .map_err(|e| (registry_status(&e), e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_engine(
    State(state): State<Arc<AppState>>,
    Path(shortcut): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut registry = state.registry.write().await;
    registry
        .remove(&shortcut)
        .map_err(|e| (registry_status(&e), e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_encodings() -> Json<Vec<CharacterEncoding>> {
    Json(CharacterEncoding::supported())
}

/// Authoring request: a URL obtained by searching the site for the magic word.
#[derive(Debug, Deserialize)]
pub struct AuthorRequest {
    /// Pasted search URL.
    pub sample_url: String,
    /// Encoding label; UTF-8 when absent.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Extracted template and the URL to try it with.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorResponse {
    /// Template to store in an engine.
    pub template: EngineTemplate,
    /// Template filled with the magic word.
    pub testing_url: String,
}

async fn author_template(
    Json(request): Json<AuthorRequest>,
) -> Result<Json<AuthorResponse>, (StatusCode, String)> {
    let encoding = request.encoding.as_deref().map(CharacterEncoding::from_label);
    let template =
        authoring::template_from_sample(&request.sample_url, MAGIC_WORD, encoding.as_ref())
            .ok_or_else(|| {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Search the site for \"{MAGIC_WORD}\" and paste the result URL"),
                )
            })?;
    let testing_url = authoring::testing_url(&template, encoding.as_ref())
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok(Json(AuthorResponse {
        template,
        testing_url: testing_url.into(),
    }))
}

/// Classification request; the caller keeps `current` between keystrokes.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Full contents of the search field.
    pub text: String,
    /// Shortcut committed by the previous call.
    #[serde(default)]
    pub current: Option<String>,
}

/// Detected engine as seen by the UI.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionDto {
    /// Shortcut of the detected engine, if any.
    pub shortcut: Option<String>,
    /// Name of the detected engine, if any.
    pub name: Option<String>,
    /// Whether the engine is armed.
    pub committed: bool,
}

impl From<Detection> for DetectionDto {
    fn from(d: Detection) -> Self {
        Self {
            shortcut: d.engine.as_ref().map(|e| e.shortcut.clone()),
            name: d.engine.map(|e| e.name),
            committed: d.committed,
        }
    }
}

/// Classification response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// Shortcut to send back as `current` on the next call.
    pub current: Option<String>,
    /// Notification; absent when nothing changed.
    pub detection: Option<DetectionDto>,
}

async fn classify_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let registry = state.registry.read().await;
    let previous = MatcherState::with_current(
        request
            .current
            .as_deref()
            .and_then(|s| registry.lookup(s))
            .cloned(),
    );

    let outcome = classify(&previous, &request.text, &*registry);
    Json(ClassifyResponse {
        current: outcome.state.current().map(|e| e.shortcut.clone()),
        detection: outcome.detection.map(DetectionDto::from),
    })
}

/// Search request.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Full input line.
    pub input: String,
}

/// Resolved search.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Engine used.
    pub shortcut: String,
    /// Terms searched.
    pub terms: String,
    /// URL to open.
    pub url: String,
    /// Whether the URL targets another application.
    pub opens_externally: bool,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let registry = state.registry.read().await;
    let resolved = resolve(&request.input, &*registry).map_err(|e| match e {
        ResolveError::NoEngine => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ResolveError::Injection(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Search error: {e}"),
        ),
    })?;

    Ok(Json(SearchResponse {
        shortcut: resolved.shortcut,
        terms: resolved.terms,
        url: resolved.url.into(),
        opens_externally: resolved.opens_externally,
    }))
}

/// Discovery request.
#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    /// Site URL, with or without scheme.
    pub url: String,
}

/// Discovery response.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverResponse {
    /// Whether a template was found.
    pub found: bool,
    /// Short name; may be empty.
    pub name: String,
    /// Template URL carrying the terms placeholder.
    pub url: Option<String>,
    /// Template filled with the magic word.
    pub testing_url: Option<String>,
}

impl From<OpenSearchResult> for DiscoverResponse {
    fn from(result: OpenSearchResult) -> Self {
        Self {
            found: result.is_found(),
            testing_url: result.testing_url().map(String::from),
            url: result.url.map(String::from),
            name: result.name,
        }
    }
}

async fn discover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Json<DiscoverResponse>, (StatusCode, String)> {
    let seed = normalize_seed(&request.url)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if let Some(cached) = state.discovery_cache.get(seed.as_str()) {
        tracing::debug!(%seed, "Cache hit for discovery");
        return Ok(Json(cached.into()));
    }

    let result = state.discoverer.discover(&seed).await;
    state.discovery_cache.insert(seed.as_str(), &result);
    Ok(Json(result.into()))
}
