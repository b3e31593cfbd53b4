use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::category::ServiceCategory;
use crate::supplier::SupplierId;

/// Order status in the lifecycle. Forward-only:
/// PAID -> PROCESSING -> {FULFILLED, FAILED}. A FAILED order can be
/// re-driven to PROCESSING by the explicit retry operation, nothing else
/// moves backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Paid,
    Processing,
    Fulfilled,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAID" => Ok(OrderStatus::Paid),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "FULFILLED" => Ok(OrderStatus::Fulfilled),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid state transition from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// The single durable record of a bundle sale. Created exactly once at
/// purchase time, mutated by the lifecycle manager and the poller, never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-facing reference, also sent to suppliers as our reference.
    pub short_id: String,
    pub category: ServiceCategory,
    pub customer_phone: String,
    /// Catalog amount string, e.g. "5GB".
    pub package_details: String,
    pub package_price: Decimal,
    pub payment_reference: String,
    pub supplier_used: Option<SupplierId>,
    /// Supplier-assigned transaction id, when the supplier issues one.
    pub supplier_reference: Option<String>,
    /// Raw supplier payload (or failure reason) kept for audit.
    pub supplier_response: Option<Value>,
    pub status: OrderStatus,
    pub shop_id: Option<Uuid>,
    pub shop_markup: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        category: ServiceCategory,
        customer_phone: String,
        package_details: String,
        package_price: Decimal,
        payment_reference: String,
        shop_id: Option<Uuid>,
        shop_markup: Option<Decimal>,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            short_id: Self::generate_short_id(&id),
            category,
            customer_phone,
            package_details,
            package_price,
            payment_reference,
            supplier_used: None,
            supplier_reference: None,
            supplier_response: None,
            status: OrderStatus::Paid,
            shop_id,
            shop_markup,
            created_at: now,
            updated_at: now,
        }
    }

    /// Supplier accepted the order. Acceptance is not delivery.
    pub fn mark_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(OrderStatus::Processing, |from| {
            matches!(from, OrderStatus::Paid)
        })
    }

    /// Supplier confirmed delivery.
    pub fn mark_fulfilled(&mut self) -> Result<(), TransitionError> {
        self.transition(OrderStatus::Fulfilled, |from| {
            matches!(from, OrderStatus::Processing)
        })
    }

    /// Fulfillment attempt failed. Valid from PAID (initial attempt
    /// rejected) and from PROCESSING (reconciliation found a failure).
    pub fn mark_failed(&mut self) -> Result<(), TransitionError> {
        self.transition(OrderStatus::Failed, |from| {
            matches!(from, OrderStatus::Paid | OrderStatus::Processing)
        })
    }

    /// Manual re-drive of a FAILED order back into PROCESSING.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        self.transition(OrderStatus::Processing, |from| {
            matches!(from, OrderStatus::Failed)
        })
    }

    fn transition(
        &mut self,
        to: OrderStatus,
        allowed: impl Fn(OrderStatus) -> bool,
    ) -> Result<(), TransitionError> {
        if !allowed(self.status) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn generate_short_id(id: &Uuid) -> String {
        let hex = id.simple().to_string();
        format!("VT-{}", hex[..10].to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            ServiceCategory::Fastnet,
            "0541112222".to_string(),
            "5GB".to_string(),
            Decimal::from(10),
            "REF1".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn happy_path_is_paid_processing_fulfilled() {
        let mut o = order();
        assert_eq!(o.status, OrderStatus::Paid);
        o.mark_processing().unwrap();
        assert_eq!(o.status, OrderStatus::Processing);
        o.mark_fulfilled().unwrap();
        assert_eq!(o.status, OrderStatus::Fulfilled);
    }

    #[test]
    fn terminal_states_do_not_move_without_retry() {
        let mut o = order();
        o.mark_processing().unwrap();
        o.mark_fulfilled().unwrap();
        assert!(o.mark_processing().is_err());
        assert!(o.mark_failed().is_err());
        assert!(o.retry().is_err());

        let mut o = order();
        o.mark_failed().unwrap();
        assert!(o.mark_fulfilled().is_err());
        // The one sanctioned backwards move.
        o.retry().unwrap();
        assert_eq!(o.status, OrderStatus::Processing);
    }

    #[test]
    fn fulfilled_requires_processing_first() {
        let mut o = order();
        assert!(o.mark_fulfilled().is_err());
        assert_eq!(o.status, OrderStatus::Paid);
    }

    #[test]
    fn short_id_is_stable_and_prefixed() {
        let o = order();
        assert!(o.short_id.starts_with("VT-"));
        assert_eq!(o.short_id.len(), 13);
    }
}
