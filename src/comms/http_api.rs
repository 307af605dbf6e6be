use anyhow::Result;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{ConnectInfo, FromRequestParts, Query, State},
    http::request::Parts,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AuthError;
use crate::monitor::{AlertNotifier, SecurityMonitor, WebhookNotifier};
use crate::registry::{MemoryRegistry, PgRegistry, SessionRegistry};
use crate::rotation::RotationProtocol;
use crate::token::{TokenCodec, TokenPair};

type SharedState = Arc<AppState>;

// Extract client IP from ConnectInfo, proxy headers, or fallback to 127.0.0.1.
// The origin always comes from the transport layer, never the payload.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Prefer the socket address inserted by Axum's connect info middleware
        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        // Check common proxy headers
        if let Some(forwarded) = parts.headers.get("x-forwarded-for") {
            if let Ok(s) = forwarded.to_str() {
                // Take the first IP if multiple
                let ip = s.split(',').next().unwrap_or(s).trim().to_string();
                if !ip.is_empty() {
                    return Ok(ClientIp(ip));
                }
            }
        }
        if let Some(real_ip) = parts.headers.get("x-real-ip") {
            if let Ok(s) = real_ip.to_str() {
                let ip = s.trim().to_string();
                if !ip.is_empty() {
                    return Ok(ClientIp(ip));
                }
            }
        }

        // Fallback for tests or when info is unavailable
        Ok(ClientIp("127.0.0.1".to_string()))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub protocol: RotationProtocol,
}

impl AppState {
    pub fn new(protocol: RotationProtocol) -> Self {
        Self { protocol }
    }
}

/// Transport-level failure mapping. Every client-caused rejection collapses
/// to a bare 400 with no body: the caller cannot tell a malformed token from
/// an expired, replayed, or cross-bound one.
pub(crate) enum ApiError {
    BadRequest,
    Internal,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::SessionExpired => {
                debug!(reason = %err, "request rejected");
                ApiError::BadRequest
            }
            AuthError::Storage(_) | AuthError::Configuration(_) => {
                error!(error = ?err, "internal failure serving token request");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST.into_response(),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

// Health check
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[derive(Deserialize)]
struct NewTokenParams {
    guid: Uuid,
}

// Issue endpoint: mint a session for the supplied identity. The guid is
// opaque and trusted once well-formed; a non-UUID is a bad request.
async fn new_jwt(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    params: Result<Query<NewTokenParams>, QueryRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Query(params) = params.map_err(|_| {
        debug!("issue rejected: malformed guid");
        ApiError::BadRequest
    })?;
    let pair = state.protocol.issue(params.guid, &ip).await?;
    Ok(Json(pair))
}

// Refresh endpoint: exchange a live pair for a fresh one. The request body
// has the same shape as the response.
async fn refresh_jwt(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<TokenPair>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(req) = payload.map_err(|_| {
        debug!("refresh rejected: malformed payload");
        ApiError::BadRequest
    })?;
    let pair = state
        .protocol
        .refresh(&req.access_token, &req.refresh_token, &ip)
        .await?;
    Ok(Json(pair))
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jwt/new", get(new_jwt))
        .route("/api/v1/jwt/refresh", post(refresh_jwt))
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

pub async fn serve(config: Config) -> Result<()> {
    let registry: Arc<dyn SessionRegistry> = match &config.database_url {
        Some(url) => Arc::new(PgRegistry::connect(url).await?),
        None => {
            info!("no DATABASE_URL configured; sessions will not survive restart");
            Arc::new(MemoryRegistry::new())
        }
    };

    let codec = TokenCodec::new(&config.jwt_secret)?;
    let notifier: Option<Arc<dyn AlertNotifier>> = match &config.alert_webhook {
        Some(url) => Some(Arc::new(WebhookNotifier::new(url.clone())?)),
        None => None,
    };
    let monitor = SecurityMonitor::new(notifier);
    let protocol = RotationProtocol::new(codec, registry, monitor, config.revoke_on_ip_mismatch);
    let state = Arc::new(AppState::new(protocol));

    let app = create_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    info!("auth server listening on {}:{}", config.host, config.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
