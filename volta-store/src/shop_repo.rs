use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use volta_core::repository::{ShopAccount, ShopRepository, StoreError};

pub struct StoreShopRepository {
    pool: PgPool,
}

impl StoreShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShopRow {
    shop_id: Uuid,
    total_earnings: Decimal,
    available_balance: Decimal,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl ShopRepository for StoreShopRepository {
    async fn credit_earnings(&self, shop_id: Uuid, amount: Decimal) -> Result<(), StoreError> {
        // Single upsert keeps the increment atomic under concurrent
        // intakes.
        sqlx::query(
            r#"
            INSERT INTO shop_accounts (shop_id, total_earnings, available_balance, updated_at)
            VALUES ($1, $2, $2, NOW())
            ON CONFLICT (shop_id) DO UPDATE
            SET total_earnings = shop_accounts.total_earnings + EXCLUDED.total_earnings,
                available_balance = shop_accounts.available_balance + EXCLUDED.available_balance,
                updated_at = NOW()
            "#,
        )
        .bind(shop_id)
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_account(&self, shop_id: Uuid) -> Result<Option<ShopAccount>, StoreError> {
        let row: Option<ShopRow> = sqlx::query_as(
            "SELECT shop_id, total_earnings, available_balance, updated_at \
             FROM shop_accounts WHERE shop_id = $1",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row.map(|r| ShopAccount {
            shop_id: r.shop_id,
            total_earnings: r.total_earnings,
            available_balance: r.available_balance,
            updated_at: r.updated_at,
        }))
    }
}
