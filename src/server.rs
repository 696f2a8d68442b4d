use crate::config::CatalogConfig;
use crate::query::{CatalogPage, CatalogQuery};
use crate::service::CatalogService;
use crate::CatalogResult;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CatalogService>,
}

impl AppState {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    details: String,
}

impl ApiError {
    pub fn bad_request(details: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid query parameters".to_string(),
            details: details.to_string(),
        }
    }

    pub fn internal(details: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Failed to fetch products".to_string(),
            details: details.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub fetched_at: String,
    /// Milliseconds since the snapshot was fetched.
    pub cache_age: u64,
    pub last_error_details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsResponse {
    #[serde(flatten)]
    pub page: CatalogPage,
    pub data_source: String,
    pub debug_info: DebugInfo,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET])
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/debug", get(debug_report))
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: &CatalogConfig) -> CatalogResult<()> {
    let service = CatalogService::from_config(config)?;
    let app = router(AppState::new(service));
    let listener = TcpListener::bind(config.bind).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, sources = config.sources.len(), "catalog service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    query.validate().map_err(ApiError::bad_request)?;

    let entry = state.service.get_or_fetch().await;
    let page = query.apply(&entry.products);
    Ok(Json(ProductsResponse {
        page,
        data_source: entry.source_label.clone(),
        debug_info: DebugInfo {
            fetched_at: entry.fetched_at_utc.to_rfc3339_opts(SecondsFormat::Millis, true),
            cache_age: entry.age().as_millis() as u64,
            last_error_details: entry.last_error_detail.clone(),
        },
    }))
}

async fn debug_report(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.service;
    let primary = service.primary_source().map(|source| {
        json!({
            "name": source.name,
            "fromEnv": service.primary_from_env(),
            "urlLength": source.url.len(),
            "urlPreview": source.url_preview(),
        })
    });

    let (fetch_test, fetch_error) = match service.probe_primary().await {
        Some(Ok(report)) => (Some(report), None),
        Some(Err(e)) => (None, Some(json!({ "message": e.to_string(), "kind": format!("{:?}", e.kind()) }))),
        None => (None, None),
    };

    let cache = service.cache();
    let cached = cache.get().map(|entry| {
        json!({
            "sourceLabel": entry.source_label,
            "products": entry.products.len(),
            "ageMs": entry.age().as_millis() as u64,
            "fetchedAt": entry.fetched_at_utc.to_rfc3339_opts(SecondsFormat::Millis, true),
            "lastErrorDetails": entry.last_error_detail,
        })
    });

    Json(json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "primarySource": primary,
        "fetchTest": fetch_test,
        "fetchError": fetch_error,
        "cache": {
            "expired": cache.is_expired(),
            "entry": cached,
        },
    }))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    error!(%details, "request handler panicked");
    ApiError::internal(details).into_response()
}
