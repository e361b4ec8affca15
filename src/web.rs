use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

use crate::{
    CategoryType, Quote, QueryScope, QuoteDetail, QuoteError, QuoteLibrary, RelatedEntity,
    SourceSummary, Suggestion, find_key_by_slug, slugify, today,
};

type SharedState = Arc<AppState>;
const MAX_FAVORITES: usize = 200;

pub struct AppState {
    pub library: QuoteLibrary,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    /// Prefix for the absolute links in detail responses.
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig, library: QuoteLibrary) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        library,
        base_url: config.base_url.trim_end_matches('/').to_string(),
    });
    let router = build_router(state);
    info!(%config.addr, base = %config.base_url, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        if err.is_transient() {
            warn!("Dataset unavailable: {err}");
            Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: format!("{err}; try again"),
            }
        } else {
            Self::bad_request(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/quotes", get(api_quotes))
        .route("/api/quote", get(api_quote))
        .route("/api/related", get(api_related))
        .route("/api/suggest", get(api_suggest))
        .route("/api/directory", get(api_directory))
        .route("/api/daily", get(api_daily))
        .route("/api/favorites", get(api_favorites))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn parse_category(value: Option<&str>) -> Result<CategoryType, ApiError> {
    let value = value.ok_or_else(|| ApiError::bad_request("Missing `type` parameter"))?;
    Ok(value.parse()?)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct QuotesParams {
    #[serde(default)]
    q: String,
    #[serde(rename = "type")]
    scope: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QuotesPayload {
    query: String,
    #[serde(rename = "type")]
    scope: String,
    total: usize,
    results: Vec<Quote>,
}

async fn api_quotes(
    State(state): State<SharedState>,
    Query(params): Query<QuotesParams>,
) -> Result<Json<QuotesPayload>, ApiError> {
    let scope = match params.scope.as_deref() {
        Some(value) => value.parse::<QueryScope>()?,
        None => QueryScope::Search,
    };
    let mut results = state.library.resolve_query(&params.q, scope)?;
    let total = results.len();
    if let Some(limit) = params.limit {
        results.truncate(limit);
    }
    Ok(Json(QuotesPayload {
        query: params.q,
        scope: scope.to_string(),
        total,
        results,
    }))
}

#[derive(Debug, Deserialize)]
struct QuoteParams {
    #[serde(rename = "type")]
    category: Option<String>,
    source: String,
    quote: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DetailPayload {
    #[serde(flatten)]
    detail: DetailBody,
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DetailBody {
    quote: Quote,
    related: Vec<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<String>,
}

async fn api_quote(
    State(state): State<SharedState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<DetailPayload>, ApiError> {
    let category = parse_category(params.category.as_deref())?;
    let QuoteDetail { quote, related, bio } =
        state
            .library
            .resolve_detail(category, &params.source, &params.quote)?;
    let quote = quote.ok_or_else(|| {
        ApiError::not_found(format!(
            "No quote {:?} under {category}/{}",
            params.quote, params.source
        ))
    })?;
    let map = state.library.store().partition(category)?;
    let source_slug = map
        .source_by_key(&quote.category)
        .map_or_else(|| slugify(&quote.category), |source| source.route_slug().to_string());
    let url = format!(
        "{}/{category}/{source_slug}/{}",
        state.base_url,
        quote.slug()
    );
    Ok(Json(DetailPayload {
        detail: DetailBody {
            quote,
            related,
            bio,
        },
        url,
    }))
}

#[derive(Debug, Deserialize)]
struct RelatedParams {
    #[serde(rename = "type")]
    category: Option<String>,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RelatedPayload {
    name: String,
    #[serde(rename = "type")]
    category: CategoryType,
    related: Vec<RelatedEntity>,
}

async fn api_related(
    State(state): State<SharedState>,
    Query(params): Query<RelatedParams>,
) -> Result<Json<RelatedPayload>, ApiError> {
    let category = parse_category(params.category.as_deref())?;
    let scope = QueryScope::Category(category);
    let map = state.library.store().partition(category)?;
    let name = find_key_by_slug(map, &params.name)
        .or_else(|| find_key_by_slug(map, &slugify(&params.name)))
        .unwrap_or(params.name.as_str())
        .to_string();
    let quotes = match category {
        CategoryType::Topic => state.library.resolve_query(&name, scope)?,
        _ => Vec::new(),
    };
    let related = state.library.related_entities(scope, &name, &quotes)?;
    Ok(Json(RelatedPayload {
        name,
        category,
        related,
    }))
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn api_suggest(
    State(state): State<SharedState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    Ok(Json(state.library.autocomplete(&params.q, params.limit)?))
}

#[derive(Debug, Deserialize)]
struct DirectoryParams {
    #[serde(rename = "type")]
    category: Option<String>,
    prefix: Option<String>,
}

async fn api_directory(
    State(state): State<SharedState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<Vec<SourceSummary>>, ApiError> {
    let category = parse_category(params.category.as_deref())?;
    let prefix = params.prefix.as_deref().map(slugify);
    Ok(Json(state.library.directory(category, prefix.as_deref())?))
}

#[derive(Debug, Deserialize)]
struct DailyParams {
    day: Option<u64>,
}

async fn api_daily(
    State(state): State<SharedState>,
    Query(params): Query<DailyParams>,
) -> Result<Json<Quote>, ApiError> {
    let day = params.day.unwrap_or_else(today);
    state
        .library
        .daily_quote(day)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No daily quotes available"))
}

#[derive(Debug, Deserialize)]
struct FavoritesParams {
    #[serde(default)]
    ids: String,
}

async fn api_favorites(
    State(state): State<SharedState>,
    Query(params): Query<FavoritesParams>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let ids: Vec<&str> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    if ids.len() > MAX_FAVORITES {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_FAVORITES} ids per request"
        )));
    }
    Ok(Json(state.library.quotes_by_ids(&ids)?))
}
