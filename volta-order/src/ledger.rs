use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use volta_core::repository::{ShopRepository, StoreError};

/// Credits reseller markup at order-creation time. Balances only grow
/// here; withdrawals are approved by an external process. Markup is
/// credited on payment, not on confirmed fulfillment, and is never
/// reversed automatically.
pub struct ShopLedger {
    shops: Arc<dyn ShopRepository>,
}

impl ShopLedger {
    pub fn new(shops: Arc<dyn ShopRepository>) -> Self {
        Self { shops }
    }

    pub async fn credit(&self, shop_id: Uuid, amount: Decimal) -> Result<(), StoreError> {
        self.shops.credit_earnings(shop_id, amount).await?;
        info!(%shop_id, %amount, "shop markup credited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volta_store::memory::MemoryShopRepository;

    #[tokio::test]
    async fn credits_accumulate_across_orders() {
        let shops = Arc::new(MemoryShopRepository::new());
        let ledger = ShopLedger::new(shops.clone());
        let shop_id = Uuid::new_v4();

        let markups = [Decimal::new(15, 1), Decimal::new(25, 1), Decimal::from(3)];
        for markup in markups {
            ledger.credit(shop_id, markup).await.unwrap();
        }

        let account = shops.get_account(shop_id).await.unwrap().unwrap();
        let expected: Decimal = markups.iter().sum();
        assert_eq!(account.total_earnings, expected);
        assert_eq!(account.available_balance, expected);
    }

    #[tokio::test]
    async fn shops_are_tracked_independently() {
        let shops = Arc::new(MemoryShopRepository::new());
        let ledger = ShopLedger::new(shops.clone());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        ledger.credit(first, Decimal::from(2)).await.unwrap();
        ledger.credit(second, Decimal::from(5)).await.unwrap();

        assert_eq!(
            shops
                .get_account(first)
                .await
                .unwrap()
                .unwrap()
                .total_earnings,
            Decimal::from(2)
        );
        assert_eq!(
            shops
                .get_account(second)
                .await
                .unwrap()
                .unwrap()
                .total_earnings,
            Decimal::from(5)
        );
    }
}
