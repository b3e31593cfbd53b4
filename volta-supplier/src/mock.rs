use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use volta_core::supplier::{
    BalanceResponse, PurchaseContext, StatusResponse, SupplierApi, SupplierError, SupplierId,
    SupplierResponse,
};

/// Scriptable in-process supplier for tests and local development. Queue
/// outcomes with `push_purchase`/`push_status`; with an empty queue it
/// accepts purchases and reports orders as still processing.
pub struct MockSupplier {
    id: SupplierId,
    polling: bool,
    purchase_queue: Mutex<VecDeque<Result<SupplierResponse, SupplierError>>>,
    status_queue: Mutex<VecDeque<Result<StatusResponse, SupplierError>>>,
    purchase_calls: Mutex<Vec<PurchaseContext>>,
    status_calls: Mutex<Vec<String>>,
}

impl MockSupplier {
    pub fn new(id: SupplierId) -> Self {
        Self {
            id,
            polling: true,
            purchase_queue: Mutex::new(VecDeque::new()),
            status_queue: Mutex::new(VecDeque::new()),
            purchase_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_polling(mut self) -> Self {
        self.polling = false;
        self
    }

    pub fn push_purchase(&self, outcome: Result<SupplierResponse, SupplierError>) {
        self.purchase_queue.lock().unwrap().push_back(outcome);
    }

    pub fn push_status(&self, outcome: Result<StatusResponse, SupplierError>) {
        self.status_queue.lock().unwrap().push_back(outcome);
    }

    pub fn purchase_calls(&self) -> Vec<PurchaseContext> {
        self.purchase_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SupplierApi for MockSupplier {
    fn id(&self) -> SupplierId {
        self.id
    }

    fn supports_polling(&self) -> bool {
        self.polling
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError> {
        self.purchase_calls.lock().unwrap().push(req.clone());
        match self.purchase_queue.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(SupplierResponse::accepted(
                "Mock supplier accepted the order",
                None,
            )),
        }
    }

    async fn check_status(&self, reference: &str) -> Result<StatusResponse, SupplierError> {
        self.status_calls.lock().unwrap().push(reference.to_string());
        match self.status_queue.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(StatusResponse {
                success: true,
                status: Some("processing".to_string()),
                message: "mock status".to_string(),
                data: None,
            }),
        }
    }

    async fn wallet_balance(&self) -> BalanceResponse {
        BalanceResponse {
            success: true,
            balance: Some(Decimal::from(100)),
            message: "ok".to_string(),
        }
    }
}
