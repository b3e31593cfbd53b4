use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::category::ServiceCategory;
use crate::order::{Order, OrderStatus};
use crate::supplier::SupplierId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

/// The tuple that makes intake idempotent: both a client-side callback and
/// a server-side webhook may fire for the same payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub payment_reference: String,
    pub customer_phone: String,
    pub package_details: String,
    pub package_price: Decimal,
}

impl DedupKey {
    pub fn of(order: &Order) -> Self {
        Self {
            payment_reference: order.payment_reference.clone(),
            customer_phone: order.customer_phone.clone(),
            package_details: order.package_details.clone(),
            package_price: order.package_price,
        }
    }
}

/// Repository trait for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_dedup(&self, key: &DedupKey) -> Result<Option<Order>, StoreError>;

    async fn get_by_short_id(&self, short_id: &str) -> Result<Option<Order>, StoreError>;

    /// Write back the result of a fulfillment attempt in one go.
    async fn update_fulfillment(
        &self,
        id: Uuid,
        status: OrderStatus,
        supplier_used: Option<SupplierId>,
        supplier_reference: Option<&str>,
        supplier_response: Option<&Value>,
    ) -> Result<(), StoreError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError>;

    /// In-flight orders for one category, most recent first, bounded by
    /// `limit`. Orders created under a supplier in `exclude_suppliers`
    /// (webhook-only) are filtered out by the query itself.
    async fn list_processing(
        &self,
        category: ServiceCategory,
        exclude_suppliers: &[SupplierId],
        limit: i64,
    ) -> Result<Vec<Order>, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopAccount {
    pub shop_id: Uuid,
    pub total_earnings: Decimal,
    pub available_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for reseller balance bookkeeping. Balances only ever
/// increase here; withdrawals are approved by an external process.
#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn credit_earnings(&self, shop_id: Uuid, amount: Decimal) -> Result<(), StoreError>;

    async fn get_account(&self, shop_id: Uuid) -> Result<Option<ShopAccount>, StoreError>;
}

/// Key/value settings store backing the supplier router. Read-mostly,
/// hot-swappable without restart.
#[async_trait]
pub trait SettingRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
