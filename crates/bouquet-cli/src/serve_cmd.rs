use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bouquet_core::plan::{self as plan_service, PlanGenerator};
use bouquet_db::models::{Plan, PlanInput};
use bouquet_db::store::PlanStore;

use crate::config::ServerSettings;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    /// Log the full error chain; the client only sees a generic message.
    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Server error".to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and wire types
// ---------------------------------------------------------------------------

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanStore>,
    pub generator: PlanGenerator,
}

impl AppState {
    pub fn new(store: Arc<dyn PlanStore>, generator: PlanGenerator) -> Self {
        Self { store, generator }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanResponse {
    pub share_id: String,
    pub ai_plan: String,
}

/// Plan fields from a request body.
///
/// A missing body, an empty body, or a content type other than JSON all
/// read as an empty [`PlanInput`]. A JSON body that fails to parse is
/// still rejected.
#[derive(Debug)]
pub struct PlanBody(pub PlanInput);

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || mime.to_ascii_lowercase().ends_with("+json")
}

impl<S> FromRequest<S> for PlanBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);
        let bytes = Bytes::from_request(req, state).await?;

        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(PlanInput::default()));
        }
        let Json(input) = Json::<PlanInput>::from_bytes(&bytes)?;
        Ok(Self(input))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    #[serde(rename = "regenAI")]
    pub regen_ai: Option<String>,
}

impl UpdateParams {
    /// Only the exact string `true` requests a regeneration.
    fn regenerate(&self) -> bool {
        self.regen_ai.as_deref() == Some("true")
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Helmet-style response headers added to every response.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self'; frame-ancestors 'self'; object-src 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for &(name, value) in SECURITY_HEADERS {
        headers
            .entry(HeaderName::from_static(name))
            .or_insert(HeaderValue::from_static(value));
    }
    response
}

/// CORS policy: only `frontend_url` when configured, any origin otherwise.
pub fn cors_layer(frontend_url: Option<&str>) -> Result<CorsLayer> {
    let origin = match frontend_url {
        Some(url) => {
            let value = HeaderValue::from_str(url.trim_end_matches('/'))
                .with_context(|| format!("invalid frontend URL {url:?}"))?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/plans", post(create_plan))
        .route("/api/plans/{share_id}", get(get_plan).put(update_plan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::map_response(security_headers))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, settings: &ServerSettings) -> Result<()> {
    let cors = cors_layer(settings.frontend_url.as_deref())?;
    let app = build_router(state, cors);
    let addr: SocketAddr = format!("{}:{}", settings.bind, settings.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", settings.bind, settings.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("bouquet listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("bouquet shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn create_plan(
    State(state): State<AppState>,
    PlanBody(input): PlanBody,
) -> Result<Json<CreatePlanResponse>, AppError> {

    let created = plan_service::create_plan(state.store.as_ref(), &state.generator, &input)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(CreatePlanResponse {
        share_id: created.plan.share_id,
        ai_plan: created.outcome.into_text(),
    }))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<Plan>, AppError> {
    if !plan_service::is_share_id(&share_id) {
        return Err(AppError::not_found("Not found"));
    }

    let plan = plan_service::get_plan(state.store.as_ref(), &share_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(plan))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    Query(params): Query<UpdateParams>,
    PlanBody(input): PlanBody,
) -> Result<Json<Plan>, AppError> {
    if !plan_service::is_share_id(&share_id) {
        return Err(AppError::not_found("Not found"));
    }

    let plan = plan_service::update_plan(
        state.store.as_ref(),
        &state.generator,
        &share_id,
        input,
        params.regenerate(),
    )
    .await
    .map_err(AppError::internal)?
    .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
