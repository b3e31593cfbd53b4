use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use volta_core::order::OrderStatus;
use volta_order::reconcile::ReconcileError;
use volta_order::{OrderError, PollSummary};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub short_id: String,
    pub status: OrderStatus,
    pub package_details: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub short_id: String,
    pub status: OrderStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/orders/{short_id}
/// Public order status lookup.
pub async fn get_order(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<OrderStatusResponse>, AppError> {
    let order = state
        .orders
        .get_by_short_id(&short_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFoundError(short_id))?;

    Ok(Json(OrderStatusResponse {
        short_id: order.short_id,
        status: order.status,
        package_details: order.package_details,
        created_at: order.created_at,
    }))
}

/// POST /v1/admin/orders/{short_id}/refresh
/// Re-check one order against its supplier, same normalization path as
/// the background poller.
pub async fn refresh_order(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let order = state
        .poller
        .refresh_order(&short_id)
        .await
        .map_err(|e| match e {
            ReconcileError::NotFound(id) => AppError::NotFoundError(id),
            other => AppError::InternalServerError(other.to_string()),
        })?;

    Ok(Json(RefreshResponse {
        short_id: order.short_id,
        status: order.status,
    }))
}

/// POST /v1/admin/orders/refresh-all
/// Run one full reconciliation pass over every category, synchronously.
pub async fn refresh_all(State(state): State<AppState>) -> Json<PollSummary> {
    Json(state.poller.run_once().await)
}

/// POST /v1/admin/orders/{short_id}/retry
/// Manually re-drive a FAILED order.
pub async fn retry_order(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let order = state
        .manager
        .retry_order(&short_id)
        .await
        .map_err(|e| match e {
            OrderError::NotFound(id) => AppError::NotFoundError(id),
            OrderError::Transition(t) => AppError::ConflictError(t.to_string()),
            other => AppError::InternalServerError(other.to_string()),
        })?;

    Ok(Json(RefreshResponse {
        short_id: order.short_id,
        status: order.status,
    }))
}
