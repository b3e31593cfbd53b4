use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use volta_core::category::ServiceCategory;
use volta_core::supplier::SupplierId;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSupplierResponse {
    pub category: ServiceCategory,
    pub supplier: SupplierId,
}

#[derive(Debug, Deserialize)]
pub struct SetSupplierRequest {
    pub supplier: SupplierId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub supplier: SupplierId,
    pub success: bool,
    pub balance: Option<Decimal>,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/admin/suppliers
/// The active supplier for each category.
pub async fn list_active(State(state): State<AppState>) -> Json<Vec<ActiveSupplierResponse>> {
    let mut entries = Vec::with_capacity(ServiceCategory::ALL.len());
    for category in ServiceCategory::ALL {
        entries.push(ActiveSupplierResponse {
            category,
            supplier: state.supplier_router.active(category).await,
        });
    }
    Json(entries)
}

/// PUT /v1/admin/suppliers/{category}
/// Hot-swap the active supplier for a category. Takes effect on the next
/// routed call, no restart.
pub async fn set_active(
    State(state): State<AppState>,
    Path(category): Path<ServiceCategory>,
    Json(req): Json<SetSupplierRequest>,
) -> Result<Json<ActiveSupplierResponse>, AppError> {
    state
        .supplier_router
        .set_active(category, req.supplier)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    tracing::info!(%category, supplier = %req.supplier, "active supplier changed");
    Ok(Json(ActiveSupplierResponse {
        category,
        supplier: req.supplier,
    }))
}

/// GET /v1/admin/suppliers/balances
/// Best-effort wallet balances across all registered suppliers.
pub async fn wallet_balances(State(state): State<AppState>) -> Json<Vec<WalletBalanceResponse>> {
    let mut balances = Vec::new();
    // Sequential on purpose; this is an admin page, not a hot path.
    for adapter in state.registry.suppliers() {
        let response = adapter.wallet_balance().await;
        balances.push(WalletBalanceResponse {
            supplier: adapter.id(),
            success: response.success,
            balance: response.balance,
            message: response.message,
        });
    }
    Json(balances)
}
