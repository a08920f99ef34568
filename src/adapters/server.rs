//! HTTP surface: one GET endpoint returning the profile envelope, plus /health.

use crate::core::service::ProfileService;
use crate::core::{ConfigProvider, ProfileCache, ProfileFetcher, RateLimiter};
use crate::domain::model::ApiResponse;
use crate::utils::error::{ProfileError, Result};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Client address headers, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: Option<String>,
}

type SharedService<F, C, R, P> = Arc<ProfileService<F, C, R, P>>;

/// Build the axum Router for the profile API.
pub fn router<F, C, R, P>(service: SharedService<F, C, R, P>) -> Router
where
    F: ProfileFetcher + 'static,
    C: ProfileCache + 'static,
    R: RateLimiter + 'static,
    P: ConfigProvider + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", profile_route::<F, C, R, P>())
        .route("/profile", profile_route::<F, C, R, P>())
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("private, max-age=300"),
        ))
        .with_state(service)
}

fn profile_route<F, C, R, P>() -> MethodRouter<SharedService<F, C, R, P>>
where
    F: ProfileFetcher + 'static,
    C: ProfileCache + 'static,
    R: RateLimiter + 'static,
    P: ConfigProvider + 'static,
{
    get(handle_profile::<F, C, R, P>)
        .options(handle_preflight)
        .fallback(handle_method_not_allowed)
}

/// Serve until Ctrl-C.
pub async fn serve<F, C, R, P>(listener: TcpListener, service: SharedService<F, C, R, P>) -> Result<()>
where
    F: ProfileFetcher + 'static,
    C: ProfileCache + 'static,
    R: RateLimiter + 'static,
    P: ConfigProvider + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("🌐 Profile API listening on http://{}", addr);

    axum::serve(
        listener,
        router(service).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn handle_profile<F, C, R, P>(
    State(service): State<SharedService<F, C, R, P>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Option<Query<ProfileQuery>>,
) -> Response
where
    F: ProfileFetcher + 'static,
    C: ProfileCache + 'static,
    R: RateLimiter + 'static,
    P: ConfigProvider + 'static,
{
    let identity = client_identity(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    // 無法解析的查詢字串 (例如重複的 username) 視同未提供
    let username = query.and_then(|Query(q)| q.username);

    match service.lookup(&identity, username.as_deref()).await {
        Ok(lookup) => {
            tracing::info!(
                "✅ {} served{}",
                lookup.record.profile.uniqueid,
                if lookup.from_cache { " from cache" } else { "" }
            );
            (
                StatusCode::OK,
                Json(ApiResponse::success(lookup.record, lookup.from_cache)),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn handle_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn handle_method_not_allowed(method: Method) -> Response {
    error_response(&ProfileError::MethodNotAllowed {
        method: method.to_string(),
    })
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Maps a failed lookup onto the JSON error envelope.
pub fn error_response(err: &ProfileError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!("❌ Request failed: {}", err);
    } else {
        tracing::debug!("Request rejected: {}", err);
    }

    let mut response = (status, Json(ApiResponse::error(err.user_friendly_message()))).into_response();

    if let ProfileError::RateLimited { retry_after } = err {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
    }
    response
}

/// First valid IP from the proxy headers, else the peer address, else "unknown".
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in CLIENT_IP_HEADERS {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = value.split(',').next().unwrap_or_default().trim();
        if candidate.parse::<IpAddr>().is_ok() {
            return candidate.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
