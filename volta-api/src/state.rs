use std::sync::Arc;

use volta_core::repository::OrderRepository;
use volta_order::{OrderManager, StatusPoller};
use volta_supplier::{SupplierRegistry, SupplierRouter};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<OrderManager>,
    pub poller: Arc<StatusPoller>,
    pub supplier_router: Arc<SupplierRouter>,
    pub registry: Arc<SupplierRegistry>,
    pub orders: Arc<dyn OrderRepository>,
}
