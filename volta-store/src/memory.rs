//! In-memory repositories backing tests and local development. They
//! enforce the same dedup uniqueness the Postgres schema does, so intake
//! race behavior can be exercised without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use volta_core::category::ServiceCategory;
use volta_core::order::{Order, OrderStatus};
use volta_core::repository::{
    DedupKey, OrderRepository, SettingRepository, ShopAccount, ShopRepository, StoreError,
};
use volta_core::supplier::SupplierId;

pub struct MemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let key = DedupKey::of(order);
        if orders.iter().any(|o| DedupKey::of(o) == key) {
            return Err(StoreError::Duplicate(order.payment_reference.clone()));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_by_dedup(&self, key: &DedupKey) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| DedupKey::of(o) == *key)
            .cloned())
    }

    async fn get_by_short_id(&self, short_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.short_id == short_id)
            .cloned())
    }

    async fn update_fulfillment(
        &self,
        id: Uuid,
        status: OrderStatus,
        supplier_used: Option<SupplierId>,
        supplier_reference: Option<&str>,
        supplier_response: Option<&Value>,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        order.status = status;
        order.supplier_used = supplier_used;
        order.supplier_reference = supplier_reference.map(str::to_string);
        order.supplier_response = supplier_response.cloned();
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn list_processing(
        &self,
        category: ServiceCategory,
        exclude_suppliers: &[SupplierId],
        limit: i64,
    ) -> Result<Vec<Order>, StoreError> {
        // Insertion index breaks created_at ties so most-recent-first is
        // deterministic even within one clock tick.
        let mut batch: Vec<(usize, Order)> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, o)| o.category == category && o.status == OrderStatus::Processing)
            .filter(|(_, o)| match o.supplier_used {
                Some(supplier) => !exclude_suppliers.contains(&supplier),
                None => true,
            })
            .map(|(i, o)| (i, o.clone()))
            .collect();
        batch.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at).then(b.0.cmp(&a.0)));
        batch.truncate(limit.max(0) as usize);
        Ok(batch.into_iter().map(|(_, o)| o).collect())
    }
}

pub struct MemoryShopRepository {
    accounts: Mutex<HashMap<Uuid, ShopAccount>>,
}

impl MemoryShopRepository {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryShopRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShopRepository for MemoryShopRepository {
    async fn credit_earnings(&self, shop_id: Uuid, amount: Decimal) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.entry(shop_id).or_insert_with(|| ShopAccount {
            shop_id,
            total_earnings: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            updated_at: Utc::now(),
        });
        account.total_earnings += amount;
        account.available_balance += amount;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn get_account(&self, shop_id: Uuid) -> Result<Option<ShopAccount>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(&shop_id).cloned())
    }
}

pub struct MemorySettingRepository {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingRepository {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemorySettingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingRepository for MemorySettingRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
