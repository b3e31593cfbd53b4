use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use volta_core::category::ServiceCategory;
use volta_core::notify::SmsNotifier;
use volta_core::order::{Order, OrderStatus, TransitionError};
use volta_core::repository::{DedupKey, OrderRepository, StoreError};
use volta_core::supplier::{PurchaseContext, SupplierResponse};
use volta_supplier::SupplierRouter;

use crate::ledger::ShopLedger;

/// A confirmed-payment purchase, as delivered by the storefront callback
/// or the payment webhook. Both may fire for the same payment, which is
/// why intake deduplicates.
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub category: ServiceCategory,
    pub phone_number: String,
    pub data_amount: String,
    pub price: Decimal,
    pub reference: String,
    pub shop_id: Option<Uuid>,
    pub shop_markup: Option<Decimal>,
}

impl IntakeRequest {
    fn dedup_key(&self) -> DedupKey {
        DedupKey {
            payment_reference: self.reference.clone(),
            customer_phone: self.phone_number.clone(),
            package_details: self.data_amount.clone(),
            package_price: self.price,
        }
    }
}

#[derive(Debug)]
pub struct IntakeOutcome {
    pub order: Order,
    /// False when intake deduplicated against an existing order.
    pub created: bool,
}

impl IntakeOutcome {
    /// Whether the supplier accepted the order. Acceptance is not
    /// delivery; delivery is confirmed later by reconciliation.
    pub fn fulfilled(&self) -> bool {
        self.order.status == OrderStatus::Processing
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns order creation and the single synchronous fulfillment attempt.
/// Everything after intake is the poller's job.
pub struct OrderManager {
    orders: Arc<dyn OrderRepository>,
    router: Arc<SupplierRouter>,
    ledger: ShopLedger,
    notifier: Arc<dyn SmsNotifier>,
}

impl OrderManager {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        router: Arc<SupplierRouter>,
        ledger: ShopLedger,
        notifier: Arc<dyn SmsNotifier>,
    ) -> Self {
        Self {
            orders,
            router,
            ledger,
            notifier,
        }
    }

    /// Accept a confirmed-payment purchase. Idempotent on the
    /// (reference, phone, package, price) tuple; the order row is durable
    /// before any supplier call so a paid order survives a supplier
    /// outage; the supplier is called exactly once, with no automatic
    /// retry.
    pub async fn create_order(&self, req: IntakeRequest) -> Result<IntakeOutcome, OrderError> {
        let key = req.dedup_key();
        if let Some(existing) = self.orders.find_by_dedup(&key).await? {
            info!(
                order = %existing.short_id,
                reference = %req.reference,
                "duplicate intake, returning existing order"
            );
            return Ok(IntakeOutcome {
                order: existing,
                created: false,
            });
        }

        let mut order = Order::new(
            req.category,
            req.phone_number.clone(),
            req.data_amount.clone(),
            req.price,
            req.reference.clone(),
            req.shop_id,
            req.shop_markup,
        );

        match self.orders.insert(&order).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                // A concurrent intake (callback + webhook racing) won the
                // insert; hand back the winner.
                if let Some(existing) = self.orders.find_by_dedup(&key).await? {
                    return Ok(IntakeOutcome {
                        order: existing,
                        created: false,
                    });
                }
                return Err(OrderError::Store(StoreError::Duplicate(
                    req.reference.clone(),
                )));
            }
            Err(e) => return Err(e.into()),
        }
        info!(order = %order.short_id, category = %order.category, "order created");

        // Markup is credited on payment, regardless of fulfillment
        // outcome. A failed credit is logged for manual reconciliation
        // rather than failing an already-paid order.
        if let (Some(shop_id), Some(markup)) = (order.shop_id, order.shop_markup) {
            if let Err(e) = self.ledger.credit(shop_id, markup).await {
                error!(
                    order = %order.short_id,
                    %shop_id,
                    error = %e,
                    "shop markup credit failed"
                );
            }
        }

        self.attempt_fulfillment(&mut order).await?;

        if let Err(e) = self.notifier.order_update(&order).await {
            warn!(order = %order.short_id, error = %e, "sms notification failed");
        }

        Ok(IntakeOutcome {
            order,
            created: true,
        })
    }

    /// Manually re-drive a FAILED order: back to PROCESSING, then one
    /// fresh purchase attempt through whichever supplier is active now.
    pub async fn retry_order(&self, short_id: &str) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .get_by_short_id(short_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(short_id.to_string()))?;

        order.retry()?;
        self.orders.update_status(order.id, order.status).await?;
        info!(order = %order.short_id, "manual retry requested");

        self.attempt_fulfillment(&mut order).await?;

        if let Err(e) = self.notifier.order_update(&order).await {
            warn!(order = %order.short_id, error = %e, "sms notification failed");
        }

        Ok(order)
    }

    pub async fn get_order(&self, short_id: &str) -> Result<Order, OrderError> {
        self.orders
            .get_by_short_id(short_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(short_id.to_string()))
    }

    /// One synchronous purchase attempt. Routing failures and supplier
    /// rejections both land the order in FAILED with the reason kept on
    /// the record; nothing here propagates a supplier problem to the
    /// intake caller, because the payment has already succeeded.
    async fn attempt_fulfillment(&self, order: &mut Order) -> Result<(), OrderError> {
        let outcome = match self.router.route(order.category).await {
            Ok(adapter) => {
                order.supplier_used = Some(adapter.id());
                let context = PurchaseContext {
                    phone: order.customer_phone.clone(),
                    data_amount: order.package_details.clone(),
                    price: order.package_price,
                    reference: order.short_id.clone(),
                    network: order.category.network(),
                };
                adapter.purchase(&context).await
            }
            Err(e) => Ok(SupplierResponse::rejected(e.to_string())),
        };

        match outcome {
            Ok(response) if response.success => {
                if order.status == OrderStatus::Paid {
                    order.mark_processing()?;
                }
                order.supplier_reference = response.data.as_ref().and_then(extract_reference);
                order.supplier_response = serde_json::to_value(&response).ok();
            }
            Ok(response) => {
                order.mark_failed()?;
                order.supplier_response = serde_json::to_value(&response).ok();
                warn!(
                    order = %order.short_id,
                    message = %response.message,
                    "supplier rejected order"
                );
            }
            Err(e) => {
                order.mark_failed()?;
                order.supplier_response = Some(json!({ "error": e.to_string() }));
                warn!(order = %order.short_id, error = %e, "fulfillment attempt errored");
            }
        }

        self.orders
            .update_fulfillment(
                order.id,
                order.status,
                order.supplier_used,
                order.supplier_reference.as_deref(),
                order.supplier_response.as_ref(),
            )
            .await?;
        Ok(())
    }
}

/// Pull a supplier-assigned transaction id out of a purchase response, if
/// the supplier issued one.
fn extract_reference(data: &Value) -> Option<String> {
    for key in ["transaction_id", "transactionId", "reference", "ref"] {
        if let Some(value) = data.get(key).and_then(Value::as_str) {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use volta_core::notify::LogSmsNotifier;
    use volta_core::repository::ShopRepository;
    use volta_core::supplier::{SupplierError, SupplierId};
    use volta_supplier::mock::MockSupplier;
    use volta_supplier::registry::SupplierRegistry;
    use volta_store::memory::{
        MemoryOrderRepository, MemorySettingRepository, MemoryShopRepository,
    };

    struct Harness {
        manager: OrderManager,
        orders: Arc<MemoryOrderRepository>,
        shops: Arc<MemoryShopRepository>,
        supplier: Arc<MockSupplier>,
    }

    fn harness() -> Harness {
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        let registry = Arc::new(SupplierRegistry::new().register(supplier.clone()));
        let router = Arc::new(SupplierRouter::new(
            registry,
            Arc::new(MemorySettingRepository::new()),
            Duration::ZERO,
        ));
        let orders = Arc::new(MemoryOrderRepository::new());
        let shops = Arc::new(MemoryShopRepository::new());
        let manager = OrderManager::new(
            orders.clone(),
            router,
            ShopLedger::new(shops.clone()),
            Arc::new(LogSmsNotifier),
        );
        Harness {
            manager,
            orders,
            shops,
            supplier,
        }
    }

    fn request(reference: &str) -> IntakeRequest {
        IntakeRequest {
            category: ServiceCategory::Fastnet,
            phone_number: "0541112222".to_string(),
            data_amount: "5GB".to_string(),
            price: Decimal::from(10),
            reference: reference.to_string(),
            shop_id: None,
            shop_markup: None,
        }
    }

    #[tokio::test]
    async fn accepted_purchase_lands_in_processing() {
        let h = harness();
        let outcome = h.manager.create_order(request("REF1")).await.unwrap();

        assert!(outcome.created);
        assert!(outcome.fulfilled());
        assert_eq!(outcome.order.status, OrderStatus::Processing);
        assert_eq!(outcome.order.supplier_used, Some(SupplierId::DataXpress));
        assert!(outcome.order.supplier_response.is_some());
        assert_eq!(h.supplier.purchase_calls().len(), 1);
    }

    #[tokio::test]
    async fn double_fire_returns_first_order_and_one_row() {
        let h = harness();
        let first = h.manager.create_order(request("REF1")).await.unwrap();
        let second = h.manager.create_order(request("REF1")).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.order.short_id, second.order.short_id);
        assert_eq!(h.orders.len(), 1);
        // The supplier must not see the duplicate either.
        assert_eq!(h.supplier.purchase_calls().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_double_fire_still_yields_one_row() {
        let h = harness();
        let (a, b) = tokio::join!(
            h.manager.create_order(request("REF1")),
            h.manager.create_order(request("REF1")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.order.short_id, b.order.short_id);
        assert_eq!(h.orders.len(), 1);
    }

    #[tokio::test]
    async fn different_payment_references_are_distinct_orders() {
        let h = harness();
        h.manager.create_order(request("REF1")).await.unwrap();
        h.manager.create_order(request("REF2")).await.unwrap();
        assert_eq!(h.orders.len(), 2);
    }

    #[tokio::test]
    async fn rejection_preserves_the_order_as_failed() {
        let h = harness();
        h.supplier.push_purchase(Ok(SupplierResponse::rejected(
            "Requested bundle is out of stock at the supplier",
        )));

        let outcome = h.manager.create_order(request("REF1")).await.unwrap();
        assert!(!outcome.fulfilled());
        assert_eq!(outcome.order.status, OrderStatus::Failed);

        let stored = h.orders.get_by_short_id(&outcome.order.short_id).await;
        let stored = stored.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        let response = stored.supplier_response.unwrap();
        assert_eq!(
            response["message"],
            "Requested bundle is out of stock at the supplier"
        );
    }

    #[tokio::test]
    async fn transport_error_never_loses_the_paid_order() {
        let h = harness();
        h.supplier
            .push_purchase(Err(SupplierError::Transport("connection reset".to_string())));

        let outcome = h.manager.create_order(request("REF1")).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Failed);
        assert_eq!(h.orders.len(), 1);
    }

    #[tokio::test]
    async fn supplier_assigned_reference_is_extracted() {
        let h = harness();
        h.supplier.push_purchase(Ok(SupplierResponse::accepted(
            "ok",
            Some(json!({ "transaction_id": "KAZ-778899" })),
        )));

        let outcome = h.manager.create_order(request("REF1")).await.unwrap();
        assert_eq!(
            outcome.order.supplier_reference.as_deref(),
            Some("KAZ-778899")
        );
    }

    #[tokio::test]
    async fn shop_markup_is_credited_once_even_on_double_fire() {
        let h = harness();
        let shop_id = Uuid::new_v4();
        let mut req = request("REF1");
        req.shop_id = Some(shop_id);
        req.shop_markup = Some(Decimal::new(15, 1));

        h.manager.create_order(req.clone()).await.unwrap();
        h.manager.create_order(req).await.unwrap();

        let account = h.shops.get_account(shop_id).await.unwrap().unwrap();
        assert_eq!(account.total_earnings, Decimal::new(15, 1));
    }

    #[tokio::test]
    async fn markup_is_credited_even_when_fulfillment_fails() {
        let h = harness();
        h.supplier
            .push_purchase(Ok(SupplierResponse::rejected("out of stock")));
        let shop_id = Uuid::new_v4();
        let mut req = request("REF1");
        req.shop_id = Some(shop_id);
        req.shop_markup = Some(Decimal::from(2));

        let outcome = h.manager.create_order(req).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Failed);
        let account = h.shops.get_account(shop_id).await.unwrap().unwrap();
        assert_eq!(account.total_earnings, Decimal::from(2));
    }

    #[tokio::test]
    async fn retry_redrives_a_failed_order() {
        let h = harness();
        h.supplier
            .push_purchase(Ok(SupplierResponse::rejected("out of stock")));
        let outcome = h.manager.create_order(request("REF1")).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Failed);

        // Next attempt uses the mock's default accepting behavior.
        let retried = h.manager.retry_order(&outcome.order.short_id).await.unwrap();
        assert_eq!(retried.status, OrderStatus::Processing);
        assert_eq!(h.supplier.purchase_calls().len(), 2);
    }

    #[tokio::test]
    async fn retry_rejects_orders_that_are_not_failed() {
        let h = harness();
        let outcome = h.manager.create_order(request("REF1")).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Processing);

        let result = h.manager.retry_order(&outcome.order.short_id).await;
        assert!(matches!(result, Err(OrderError::Transition(_))));
    }
}
