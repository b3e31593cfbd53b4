use volta_core::order::{Order, OrderStatus};
use volta_core::repository::{OrderRepository, StoreError};
use volta_core::supplier::{SupplierApi, SupplierError};
use volta_supplier::router::RouteError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("order not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Supplier(#[from] SupplierError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Route(#[from] RouteError),
}

const FAILED_KEYWORDS: [&str; 4] = ["failed", "error", "cancelled", "rejected"];
const FULFILLED_KEYWORDS: [&str; 4] = ["delivered", "successful", "fulfilled", "complete"];

/// Collapse a supplier's free-text status into the order lifecycle.
/// Total and deterministic: every input lands on exactly one status, and
/// anything unrecognized stays PROCESSING rather than regressing a live
/// order on ambiguous input. Failure keywords win over delivery keywords
/// so "completed with errors" does not read as a delivery.
pub fn normalize_status(raw: &str) -> OrderStatus {
    let lowered = raw.to_lowercase();
    if FAILED_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return OrderStatus::Failed;
    }
    if FULFILLED_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return OrderStatus::Fulfilled;
    }
    OrderStatus::Processing
}

/// The reference quoted to a supplier on status checks. Suppliers that
/// assign their own transaction id expect it back; everyone else gets our
/// short id.
pub fn lookup_key(order: &Order) -> &str {
    order
        .supplier_reference
        .as_deref()
        .unwrap_or(&order.short_id)
}

/// Re-check one order against a supplier and advance its status. Shared
/// by the background poller and the admin refresh triggers. Writes back
/// only when the normalized status differs from the stored one. Orders
/// already terminal are left alone.
pub async fn reconcile_order(
    orders: &dyn OrderRepository,
    adapter: &dyn SupplierApi,
    order: &Order,
) -> Result<OrderStatus, ReconcileError> {
    if order.status != OrderStatus::Processing {
        return Ok(order.status);
    }

    let response = adapter.check_status(lookup_key(order)).await?;
    let raw = match (response.success, response.status) {
        (true, Some(raw)) => raw,
        // No usable status (webhook-only supplier, lookup miss): leave the
        // order as-is.
        _ => return Ok(order.status),
    };

    let normalized = normalize_status(&raw);
    if normalized != order.status {
        orders.update_status(order.id, normalized).await?;
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use volta_core::category::ServiceCategory;

    #[test]
    fn delivery_vocabulary_normalizes_to_fulfilled() {
        for raw in [
            "Delivered successfully",
            "SUCCESSFUL",
            "order fulfilled",
            "Complete",
            "Transaction completed",
        ] {
            assert_eq!(normalize_status(raw), OrderStatus::Fulfilled, "{raw:?}");
        }
    }

    #[test]
    fn failure_vocabulary_normalizes_to_failed() {
        for raw in [
            "failed",
            "Order FAILED at supplier",
            "internal error",
            "Cancelled by agent",
            "rejected",
        ] {
            assert_eq!(normalize_status(raw), OrderStatus::Failed, "{raw:?}");
        }
    }

    #[test]
    fn unrecognized_strings_stay_processing() {
        for raw in ["pending", "queued", "in progress", "??", ""] {
            assert_eq!(normalize_status(raw), OrderStatus::Processing, "{raw:?}");
        }
    }

    #[test]
    fn failure_keywords_win_over_delivery_keywords() {
        assert_eq!(
            normalize_status("completed with errors"),
            OrderStatus::Failed
        );
    }

    #[test]
    fn lookup_prefers_supplier_assigned_reference() {
        let mut order = Order::new(
            ServiceCategory::Fastnet,
            "0541112222".to_string(),
            "5GB".to_string(),
            Decimal::from(10),
            "REF1".to_string(),
            None,
            None,
        );
        assert_eq!(lookup_key(&order), order.short_id);

        order.supplier_reference = Some("KAZ-778899".to_string());
        assert_eq!(lookup_key(&order), "KAZ-778899");
    }
}
