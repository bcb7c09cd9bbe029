use crate::config::ServerConfig;
use crate::metrics::{DOCUMENTS, OPS_TOTAL, OP_DURATION, QUERY_PARSE_MICROS};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shellindex_core::{
    Document, DocumentKey, ElementRecord, Expression, IndexError, SearchRequest, StoredDocument,
};
use shellindex_storage::{Cursor, Page, PageRequest, Storage};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub config: Arc<ServerConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/shells", put(put_shell).get(list_shells))
        .route(
            "/v1/endpoints/:endpoint/shells/:id",
            get(get_shell).delete(delete_shell),
        )
        .route(
            "/v1/endpoints/:endpoint/shells/:id/elements",
            get(shell_elements),
        )
        .route("/admin/explain-query", post(explain_query))
        .route("/admin/dump", get(admin_dump))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Maps domain errors onto HTTP statuses with a JSON body.
pub struct ApiError(IndexError);

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            IndexError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response()
            }
            IndexError::Invalid(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response()
            }
            IndexError::Query(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": e.to_string(),
                    "code": e.kind.code(),
                    "position": e.position,
                    "character": e.character,
                })),
            )
                .into_response(),
            IndexError::Internal(msg) => {
                warn!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": msg})),
                )
                    .into_response()
            }
        }
    }
}

fn record<T>(op: &'static str, started: Instant, result: &Result<T, ApiError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(ApiError(IndexError::NotFound)) => "not_found",
        Err(ApiError(IndexError::Internal(_))) => "error",
        Err(_) => "rejected",
    };
    OPS_TOTAL.with_label_values(&[op, outcome]).inc();
    OP_DURATION
        .with_label_values(&[op])
        .observe(started.elapsed().as_secs_f64());
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn put_shell(
    State(app): State<AppState>,
    Json(document): Json<Document>,
) -> Result<Json<StoredDocument>, ApiError> {
    let started = Instant::now();
    let result = app
        .store
        .put(document)
        .await
        .map(|stored| Json(stored.as_ref().clone()))
        .map_err(ApiError::from);
    DOCUMENTS.set(app.store.len() as i64);
    record("put", started, &result);
    result
}

async fn get_shell(
    State(app): State<AppState>,
    Path((endpoint, id)): Path<(String, String)>,
) -> Result<Json<StoredDocument>, ApiError> {
    let started = Instant::now();
    let key = DocumentKey::new(endpoint, id);
    let result = app
        .store
        .get(&key)
        .await
        .map(|stored| Json(stored.as_ref().clone()))
        .map_err(ApiError::from);
    record("get", started, &result);
    result
}

async fn delete_shell(
    State(app): State<AppState>,
    Path((endpoint, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let started = Instant::now();
    let key = DocumentKey::new(endpoint, id);
    let result = app
        .store
        .delete(&key)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(ApiError::from);
    DOCUMENTS.set(app.store.len() as i64);
    record("delete", started, &result);
    result
}

async fn shell_elements(
    State(app): State<AppState>,
    Path((endpoint, id)): Path<(String, String)>,
) -> Result<Json<Vec<ElementRecord>>, ApiError> {
    let started = Instant::now();
    let key = DocumentKey::new(endpoint, id);
    let result = app
        .store
        .elements(&key)
        .await
        .map(|records| Json(records.to_vec()))
        .map_err(ApiError::from);
    record("elements", started, &result);
    result
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    q: Option<String>,
    locale: Option<String>,
    limit: Option<usize>,
    // opaque token from a previous response
    cursor: Option<String>,
    #[serde(default)]
    last: bool,
    endpoint: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<'a> {
    documents: Vec<&'a StoredDocument>,
    previous: Option<&'a DocumentKey>,
    next: Option<&'a DocumentKey>,
    previous_cursor: Option<String>,
    next_cursor: Option<String>,
}

pub fn encode_cursor(cursor: &Cursor) -> String {
    // serializing a plain enum of strings cannot fail
    let raw = serde_json::to_vec(cursor).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(raw)
}

pub fn decode_cursor(token: &str) -> Result<Cursor, IndexError> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| IndexError::Invalid("cursor is not valid base64".into()))?;
    serde_json::from_slice(&raw).map_err(|_| IndexError::Invalid("cursor is malformed".into()))
}

fn parse_query(params: &ListParams, default_locale: &str) -> Result<Option<Expression>, IndexError> {
    let started = Instant::now();
    let request = SearchRequest {
        q: params.q.clone(),
        locale: params.locale.clone(),
        limit: params.limit,
        endpoint: params.endpoint.clone(),
    };
    let expression = request.expression(default_locale)?;
    QUERY_PARSE_MICROS.observe(started.elapsed().as_micros() as f64);
    Ok(expression)
}

async fn list_shells(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let started = Instant::now();
    let result = search(&app, &params).await;
    record("search", started, &result);
    match result {
        Ok(page) => {
            let body = ListResponse {
                documents: page.documents.iter().map(|d| d.as_ref()).collect(),
                previous: page.previous.as_ref(),
                next: page.next.as_ref(),
                previous_cursor: page.previous_cursor().as_ref().map(encode_cursor),
                next_cursor: page.next_cursor().as_ref().map(encode_cursor),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn search(app: &AppState, params: &ListParams) -> Result<Page<Arc<StoredDocument>>, ApiError> {
    let query = parse_query(params, &app.config.default_locale)?;
    let cursor = match &params.cursor {
        Some(token) => decode_cursor(token)?,
        None if params.last => Cursor::Last,
        None => Cursor::First,
    };
    let limit = app.config.page_size(params.limit);
    debug!(cursor = cursor.label(), limit, filtered = query.is_some(), "search");
    let request = PageRequest::first(limit)
        .with_cursor(cursor)
        .with_query(query)
        .with_endpoint(params.endpoint.clone().filter(|e| !e.is_empty()));
    Ok(app.store.page(request).await?)
}

#[derive(Debug, Deserialize)]
struct ExplainRequest {
    q: String,
    #[serde(default)]
    locale: Option<String>,
}

async fn explain_query(
    State(app): State<AppState>,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let started = Instant::now();
    let locale = req
        .locale
        .unwrap_or_else(|| app.config.default_locale.clone());
    let result = explain(&req.q, &locale, started).map_err(ApiError::from);
    record("explain", started, &result);
    result
}

fn explain(
    q: &str,
    locale: &str,
    started: Instant,
) -> Result<Json<serde_json::Value>, IndexError> {
    let expression = shellindex_core::parse(q, locale)?;
    let micros = started.elapsed().as_micros() as f64;
    QUERY_PARSE_MICROS.observe(micros);
    let tree = serde_json::to_value(&expression)
        .map_err(|e| IndexError::Internal(format!("cannot render expression: {e}")))?;
    Ok(Json(json!({
        "locale": locale,
        "groups": expression.groups().len(),
        "structural": expression.has_structural_predicates(),
        "expression": tree,
        "parse_micros": micros,
    })))
}

async fn admin_dump(State(app): State<AppState>) -> impl IntoResponse {
    let mut body = String::new();
    for stored in app.store.all_documents() {
        match serde_json::to_string(&stored.document) {
            Ok(line) => {
                body.push_str(&line);
                body.push('\n');
            }
            Err(error) => warn!(key = %stored.key(), %error, "skipping document in dump"),
        }
    }
    (
        StatusCode::OK,
        [("content-type", "application/x-ndjson")],
        body,
    )
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}
