use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use volta_core::category::ServiceCategory;
use volta_core::repository::OrderRepository;
use volta_supplier::SupplierRouter;

use crate::reconcile::{reconcile_order, ReconcileError};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub batch_limit: i64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            batch_limit: 50,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PollSummary {
    pub checked: usize,
    pub updated: usize,
}

/// Periodically re-checks in-flight orders against their supplier and
/// advances their status. One tick walks every category sequentially;
/// outbound calls are deliberately not parallelized so we stay inside
/// supplier rate limits.
pub struct StatusPoller {
    orders: Arc<dyn OrderRepository>,
    router: Arc<SupplierRouter>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        router: Arc<SupplierRouter>,
        config: PollerConfig,
    ) -> Self {
        Self {
            orders,
            router,
            config,
        }
    }

    /// Tick until told to stop. The first tick fires immediately; a
    /// shutdown signal lets an in-flight tick finish rather than
    /// interrupting it.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.config.interval.as_secs(), "status poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.run_once().await;
                    debug!(checked = summary.checked, updated = summary.updated, "poll tick finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("status poller stopping");
                        break;
                    }
                }
            }
        }
    }

    /// One full reconciliation pass over all categories. Public so the
    /// admin bulk-refresh trigger and tests can drive ticks directly,
    /// without the timer.
    pub async fn run_once(&self) -> PollSummary {
        let mut summary = PollSummary::default();
        for category in ServiceCategory::ALL {
            match self.reconcile_category(category).await {
                Ok((checked, updated)) => {
                    summary.checked += checked;
                    summary.updated += updated;
                }
                // One broken category must not starve the others.
                Err(e) => warn!(%category, error = %e, "reconciliation batch failed"),
            }
        }
        summary
    }

    /// Re-check a single order on demand. Same normalization path as the
    /// background tick.
    pub async fn refresh_order(
        &self,
        short_id: &str,
    ) -> Result<volta_core::order::Order, ReconcileError> {
        let mut order = self
            .orders
            .get_by_short_id(short_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(short_id.to_string()))?;

        let adapter = self.router.route(order.category).await?;
        order.status = reconcile_order(self.orders.as_ref(), adapter.as_ref(), &order).await?;
        Ok(order)
    }

    async fn reconcile_category(
        &self,
        category: ServiceCategory,
    ) -> Result<(usize, usize), ReconcileError> {
        let adapter = self.router.route(category).await?;
        let excluded = self.router.registry().non_polling();
        let batch = self
            .orders
            .list_processing(category, &excluded, self.config.batch_limit)
            .await?;

        let mut updated = 0;
        for order in &batch {
            match reconcile_order(self.orders.as_ref(), adapter.as_ref(), order).await {
                Ok(status) if status != order.status => {
                    info!(order = %order.short_id, from = %order.status, to = %status, "order status advanced");
                    updated += 1;
                }
                Ok(_) => {}
                // Keep going: one bad order must not abort the batch.
                Err(e) => warn!(order = %order.short_id, error = %e, "status check failed"),
            }
        }
        Ok((batch.len(), updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use volta_core::order::{Order, OrderStatus};
    use volta_core::supplier::{StatusResponse, SupplierError, SupplierId};
    use volta_supplier::mock::MockSupplier;
    use volta_supplier::registry::SupplierRegistry;
    use volta_store::memory::{MemoryOrderRepository, MemorySettingRepository};

    fn status(raw: &str) -> Result<StatusResponse, SupplierError> {
        Ok(StatusResponse {
            success: true,
            status: Some(raw.to_string()),
            message: "ok".to_string(),
            data: None,
        })
    }

    async fn processing_order(
        orders: &MemoryOrderRepository,
        supplier: SupplierId,
    ) -> Order {
        let mut order = Order::new(
            ServiceCategory::Fastnet,
            "0541112222".to_string(),
            "5GB".to_string(),
            Decimal::from(10),
            format!("REF-{}", uuid::Uuid::new_v4().simple()),
            None,
            None,
        );
        order.mark_processing().unwrap();
        order.supplier_used = Some(supplier);
        orders.insert(&order).await.unwrap();
        order
    }

    fn poller(
        orders: Arc<MemoryOrderRepository>,
        registry: SupplierRegistry,
    ) -> StatusPoller {
        let router = Arc::new(SupplierRouter::new(
            Arc::new(registry),
            Arc::new(MemorySettingRepository::new()),
            Duration::ZERO,
        ));
        StatusPoller::new(orders, router, PollerConfig::default())
    }

    #[tokio::test]
    async fn one_bad_order_does_not_abort_the_batch() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));

        // list_processing returns most-recent-first, so queue outcomes for
        // the third, second, then first created order.
        let o1 = processing_order(&orders, SupplierId::DataXpress).await;
        let o2 = processing_order(&orders, SupplierId::DataXpress).await;
        let o3 = processing_order(&orders, SupplierId::DataXpress).await;
        supplier.push_status(Err(SupplierError::Transport("timeout".to_string())));
        supplier.push_status(status("Delivered successfully"));
        supplier.push_status(status("failed"));

        let p = poller(
            orders.clone(),
            SupplierRegistry::new().register(supplier.clone()),
        );
        let summary = p.run_once().await;

        assert_eq!(summary.checked, 3);
        assert_eq!(summary.updated, 2);
        let get = |o: &Order| {
            let orders = orders.clone();
            let short_id = o.short_id.clone();
            async move {
                orders
                    .get_by_short_id(&short_id)
                    .await
                    .unwrap()
                    .unwrap()
                    .status
            }
        };
        assert_eq!(get(&o3).await, OrderStatus::Processing);
        assert_eq!(get(&o2).await, OrderStatus::Fulfilled);
        assert_eq!(get(&o1).await, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn webhook_only_orders_are_skipped_by_the_batch() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let pollable = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        let webhook_only = Arc::new(MockSupplier::new(SupplierId::Hubnet).without_polling());

        let hubnet_order = processing_order(&orders, SupplierId::Hubnet).await;
        let xpress_order = processing_order(&orders, SupplierId::DataXpress).await;
        pollable.push_status(status("Delivered successfully"));

        let p = poller(
            orders.clone(),
            SupplierRegistry::new()
                .register(pollable.clone())
                .register(webhook_only.clone()),
        );
        let summary = p.run_once().await;

        assert_eq!(summary.checked, 1);
        assert_eq!(
            orders
                .get_by_short_id(&hubnet_order.short_id)
                .await
                .unwrap()
                .unwrap()
                .status,
            OrderStatus::Processing
        );
        assert_eq!(
            orders
                .get_by_short_id(&xpress_order.short_id)
                .await
                .unwrap()
                .unwrap()
                .status,
            OrderStatus::Fulfilled
        );
        assert!(webhook_only.status_calls().is_empty());
    }

    #[tokio::test]
    async fn unchanged_statuses_are_not_rewritten() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        processing_order(&orders, SupplierId::DataXpress).await;
        supplier.push_status(status("still pending"));

        let p = poller(
            orders.clone(),
            SupplierRegistry::new().register(supplier.clone()),
        );
        let summary = p.run_once().await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.updated, 0);
    }

    #[tokio::test]
    async fn refresh_order_advances_a_single_order() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        let order = processing_order(&orders, SupplierId::DataXpress).await;
        supplier.push_status(status("Delivered successfully"));

        let p = poller(
            orders.clone(),
            SupplierRegistry::new().register(supplier.clone()),
        );
        let refreshed = p.refresh_order(&order.short_id).await.unwrap();
        assert_eq!(refreshed.status, OrderStatus::Fulfilled);
    }

    #[tokio::test]
    async fn refresh_uses_supplier_assigned_reference_when_present() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));

        let mut order = Order::new(
            ServiceCategory::Fastnet,
            "0541112222".to_string(),
            "5GB".to_string(),
            Decimal::from(10),
            "REF1".to_string(),
            None,
            None,
        );
        order.mark_processing().unwrap();
        order.supplier_used = Some(SupplierId::DataXpress);
        order.supplier_reference = Some("KAZ-778899".to_string());
        orders.insert(&order).await.unwrap();

        let p = poller(
            orders.clone(),
            SupplierRegistry::new().register(supplier.clone()),
        );
        p.refresh_order(&order.short_id).await.unwrap();
        assert_eq!(supplier.status_calls(), vec!["KAZ-778899".to_string()]);
    }

    #[tokio::test]
    async fn run_loop_stops_on_shutdown_signal() {
        let orders = Arc::new(MemoryOrderRepository::new());
        let supplier = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        let p = Arc::new(poller(orders, SupplierRegistry::new().register(supplier)));

        let (tx, rx) = watch::channel(false);
        let handle = {
            let p = p.clone();
            tokio::spawn(async move { p.run(rx).await })
        };

        // Let the immediate first tick happen, then stop.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop promptly")
            .unwrap();
    }
}
