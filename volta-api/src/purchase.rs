use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use volta_core::category::ServiceCategory;
use volta_core::order::OrderStatus;
use volta_order::{IntakeOutcome, IntakeRequest};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub phone_number: String,
    pub data_amount: String,
    pub price: Decimal,
    pub reference: String,
    #[serde(default)]
    pub shop_id: Option<Uuid>,
    #[serde(default)]
    pub shop_markup: Option<Decimal>,
}

/// Same event as [`PurchaseRequest`], delivered by the payment gateway's
/// server-side webhook instead of the storefront callback. Both may fire
/// for one payment; intake deduplicates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhookRequest {
    pub category: ServiceCategory,
    #[serde(flatten)]
    pub purchase: PurchaseRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Whether the supplier accepted the order. `false` still means the
    /// payment was taken in and the order is durable; callers should only
    /// treat transport-level 5xx as rejection.
    pub success: bool,
    pub message: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub data: Option<Value>,
}

impl From<IntakeOutcome> for PurchaseResponse {
    fn from(outcome: IntakeOutcome) -> Self {
        let success = outcome.fulfilled();
        let message = if !outcome.created {
            "Order already exists for this payment".to_string()
        } else if success {
            "Order accepted and processing".to_string()
        } else {
            // Surface the supplier's reason so storefront support can see
            // it without digging through the audit payload.
            outcome
                .order
                .supplier_response
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Order received but fulfillment has not completed")
                .to_string()
        };

        Self {
            success,
            message,
            order_id: outcome.order.short_id.clone(),
            status: outcome.order.status,
            data: outcome.order.supplier_response,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/{category}/purchase
/// Storefront purchase intake, called after payment confirmation.
pub async fn create_purchase(
    State(state): State<AppState>,
    Path(category): Path<ServiceCategory>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let outcome = state
        .manager
        .create_order(intake_request(category, req))
        .await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/webhooks/payments
/// Payment-gateway webhook; trusted, same intake path as the storefront
/// callback.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(req): Json<PaymentWebhookRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let outcome = state
        .manager
        .create_order(intake_request(req.category, req.purchase))
        .await?;
    Ok(Json(outcome.into()))
}

fn intake_request(category: ServiceCategory, req: PurchaseRequest) -> IntakeRequest {
    IntakeRequest {
        category,
        phone_number: req.phone_number,
        data_amount: req.data_amount,
        price: req.price,
        reference: req.reference,
        shop_id: req.shop_id,
        shop_markup: req.shop_markup,
    }
}
