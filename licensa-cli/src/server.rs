use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;

use licensa_core::error::PoolError;
use licensa_core::pool::{now_ms, LicensePool};
use licensa_core::types::{BorrowRecord, LicenseStatus};
use licensa_core::wire::{
    BorrowRequest, BorrowResponse, ErrorResponse, OverageChargesResponse, ReturnRequest,
    ReturnResponse, VersionResponse,
};

use crate::handlers::*;

pub type AppState = Arc<Mutex<LicensePool>>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn run(host: &str, port: u16, pool: LicensePool, max_concurrent: usize) -> std::io::Result<()> {
    let state: AppState = Arc::new(Mutex::new(pool));
    let app = router(state, max_concurrent);

    let addr = format!("{}:{}", host, port);
    tracing::info!("🎫 License pool server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

pub fn router(state: AppState, max_concurrent: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/licenses/borrow", post(borrow_license))
        .route("/licenses/return", post(return_license))
        .route("/licenses/status", get(all_statuses))
        .route("/licenses/{tool}/status", get(tool_status))
        .route("/borrows", get(list_borrows))
        .route("/overage-charges", get(overage_charges))
        .layer(ConcurrencyLimitLayer::new(max_concurrent.max(1)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        tools: pool.statuses().len(),
        outstanding: pool.outstanding(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn borrow_license(
    State(state): State<AppState>,
    Json(req): Json<BorrowRequest>,
) -> ApiResult<BorrowResponse> {
    validate_borrow(&req).map_err(bad_request)?;

    let mut pool = state.lock().await;
    match pool.borrow(&req.tool, &req.user, now_ms()) {
        Ok(record) => {
            tracing::info!(
                lease_id = %record.id,
                tool = %record.tool,
                user = %record.user,
                overage = record.is_overage,
                "License borrowed"
            );
            if record.is_overage {
                if let Some(charge) = pool.overage_charges().last() {
                    tracing::info!(lease_id = %charge.borrow_id, amount = charge.amount, "Overage charged");
                }
            }
            Ok(Json(BorrowResponse {
                id: record.id,
                tool: Some(record.tool),
                user: Some(record.user),
                is_overage: record.is_overage,
            }))
        }
        Err(e) => {
            tracing::info!(tool = %req.tool, user = %req.user, reason = %e, "Borrow denied");
            Err(pool_error(e))
        }
    }
}

async fn return_license(
    State(state): State<AppState>,
    Json(req): Json<ReturnRequest>,
) -> ApiResult<ReturnResponse> {
    validate_return(&req).map_err(bad_request)?;

    let mut pool = state.lock().await;
    let record = pool.return_lease(&req.id).map_err(pool_error)?;
    tracing::info!(lease_id = %record.id, tool = %record.tool, "License returned");
    Ok(Json(ReturnResponse {
        id: record.id,
        tool: Some(record.tool),
    }))
}

async fn all_statuses(State(state): State<AppState>) -> Json<Vec<LicenseStatus>> {
    let pool = state.lock().await;
    Json(pool.statuses())
}

async fn tool_status(
    State(state): State<AppState>,
    Path(tool): Path<String>,
) -> ApiResult<LicenseStatus> {
    let pool = state.lock().await;
    pool.status(&tool).map(Json).map_err(pool_error)
}

async fn list_borrows(
    State(state): State<AppState>,
    Query(query): Query<BorrowsQuery>,
) -> Json<Vec<BorrowRecord>> {
    let pool = state.lock().await;
    Json(pool.borrows(query.user.as_deref()))
}

async fn overage_charges(State(state): State<AppState>) -> Json<OverageChargesResponse> {
    let pool = state.lock().await;
    Json(OverageChargesResponse::new(pool.overage_charges().to_vec()))
}

// ─── Error Mapping ──────────────────────────────────────────────────────────

fn pool_error(e: PoolError) -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(e.to_string())))
}

fn bad_request(msg: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg)))
}
