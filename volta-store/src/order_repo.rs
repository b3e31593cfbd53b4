use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use volta_core::category::ServiceCategory;
use volta_core::order::{Order, OrderStatus};
use volta_core::repository::{DedupKey, OrderRepository, StoreError};
use volta_core::supplier::SupplierId;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    short_id: String,
    category: String,
    customer_phone: String,
    package_details: String,
    package_price: Decimal,
    payment_reference: String,
    supplier_used: Option<String>,
    supplier_reference: Option<String>,
    supplier_response: Option<Value>,
    status: String,
    shop_id: Option<Uuid>,
    shop_markup: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let category: ServiceCategory = row
            .category
            .parse()
            .map_err(|e| StoreError::Database(format!("bad category column: {e}")))?;
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Database(format!("bad status column: {e}")))?;
        let supplier_used = match row.supplier_used {
            Some(name) => Some(
                name.parse::<SupplierId>()
                    .map_err(|e| StoreError::Database(format!("bad supplier column: {e}")))?,
            ),
            None => None,
        };

        Ok(Order {
            id: row.id,
            short_id: row.short_id,
            category,
            customer_phone: row.customer_phone,
            package_details: row.package_details,
            package_price: row.package_price,
            payment_reference: row.payment_reference,
            supplier_used,
            supplier_reference: row.supplier_reference,
            supplier_response: row.supplier_response,
            status,
            shop_id: row.shop_id,
            shop_markup: row.shop_markup,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return StoreError::Duplicate(db.message().to_string());
        }
    }
    StoreError::Database(e.to_string())
}

const SELECT_COLUMNS: &str = "id, short_id, category, customer_phone, package_details, \
     package_price, payment_reference, supplier_used, supplier_reference, supplier_response, \
     status, shop_id, shop_markup, created_at, updated_at";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, short_id, category, customer_phone, package_details,
                package_price, payment_reference, supplier_used, supplier_reference,
                supplier_response, status, shop_id, shop_markup, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id)
        .bind(&order.short_id)
        .bind(order.category.as_str())
        .bind(&order.customer_phone)
        .bind(&order.package_details)
        .bind(order.package_price)
        .bind(&order.payment_reference)
        .bind(order.supplier_used.map(|s| s.as_str()))
        .bind(&order.supplier_reference)
        .bind(&order.supplier_response)
        .bind(order.status.as_str())
        .bind(order.shop_id)
        .bind(order.shop_markup)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_by_dedup(&self, key: &DedupKey) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders \
             WHERE payment_reference = $1 AND customer_phone = $2 \
               AND package_details = $3 AND package_price = $4"
        ))
        .bind(&key.payment_reference)
        .bind(&key.customer_phone)
        .bind(&key.package_details)
        .bind(key.package_price)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(Order::try_from).transpose()
    }

    async fn get_by_short_id(&self, short_id: &str) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE short_id = $1"))
                .bind(short_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.map(Order::try_from).transpose()
    }

    async fn update_fulfillment(
        &self,
        id: Uuid,
        status: OrderStatus,
        supplier_used: Option<SupplierId>,
        supplier_reference: Option<&str>,
        supplier_response: Option<&Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, supplier_used = $2, supplier_reference = $3, \
             supplier_response = $4, updated_at = NOW() WHERE id = $5",
        )
        .bind(status.as_str())
        .bind(supplier_used.map(|s| s.as_str()))
        .bind(supplier_reference)
        .bind(supplier_response)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_processing(
        &self,
        category: ServiceCategory,
        exclude_suppliers: &[SupplierId],
        limit: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let excluded: Vec<String> = exclude_suppliers
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders \
             WHERE category = $1 AND status = 'PROCESSING' \
               AND (supplier_used IS NULL OR supplier_used <> ALL($2)) \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(category.as_str())
        .bind(&excluded)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
