use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::warn;

use volta_core::category::ServiceCategory;
use volta_core::repository::{SettingRepository, StoreError};
use volta_core::supplier::{SupplierApi, SupplierId};

use crate::registry::{default_supplier, SupplierRegistry};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no adapter registered for supplier {0}")]
    NotRegistered(SupplierId),
}

struct CachedChoice {
    id: SupplierId,
    resolved_at: Instant,
}

/// Resolves the active adapter per service category from the persisted
/// setting, with a short-lived in-process cache in front of the read.
/// Adds no retry or timeout policy of its own; calls pass through to the
/// adapter unchanged.
pub struct SupplierRouter {
    registry: Arc<SupplierRegistry>,
    settings: Arc<dyn SettingRepository>,
    cache_ttl: Duration,
    cache: Mutex<HashMap<ServiceCategory, CachedChoice>>,
}

impl SupplierRouter {
    pub fn new(
        registry: Arc<SupplierRegistry>,
        settings: Arc<dyn SettingRepository>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            settings,
            cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn setting_key(category: ServiceCategory) -> String {
        format!("active_supplier:{category}")
    }

    /// The currently active supplier for a category. Falls back to the
    /// hardcoded default when no setting exists, when the persisted name
    /// is unknown, or when the settings store is unreachable — routing
    /// must not fail a paid order over a settings read.
    pub async fn active(&self, category: ServiceCategory) -> SupplierId {
        if let Some(cached) = self.cache.lock().unwrap().get(&category) {
            if cached.resolved_at.elapsed() < self.cache_ttl {
                return cached.id;
            }
        }

        let id = match self.settings.get(&Self::setting_key(category)).await {
            Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
                warn!(%category, value = %value, "unknown active-supplier setting, using default");
                default_supplier(category)
            }),
            Ok(None) => default_supplier(category),
            Err(e) => {
                warn!(%category, error = %e, "settings read failed, using default supplier");
                default_supplier(category)
            }
        };

        self.cache.lock().unwrap().insert(
            category,
            CachedChoice {
                id,
                resolved_at: Instant::now(),
            },
        );
        id
    }

    pub async fn route(
        &self,
        category: ServiceCategory,
    ) -> Result<Arc<dyn SupplierApi>, RouteError> {
        let id = self.active(category).await;
        self.registry.get(id).ok_or(RouteError::NotRegistered(id))
    }

    /// Persist a new active supplier for a category. Last write wins;
    /// concurrent admin edits are rare and idempotent.
    pub async fn set_active(
        &self,
        category: ServiceCategory,
        supplier: SupplierId,
    ) -> Result<(), StoreError> {
        self.settings
            .set(&Self::setting_key(category), supplier.as_str())
            .await?;
        self.cache.lock().unwrap().remove(&category);
        Ok(())
    }

    pub fn registry(&self) -> &SupplierRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    use crate::mock::MockSupplier;

    struct FakeSettings {
        values: StdMutex<HashMap<String, String>>,
        fail_reads: bool,
    }

    impl FakeSettings {
        fn empty() -> Self {
            Self {
                values: StdMutex::new(HashMap::new()),
                fail_reads: false,
            }
        }

        fn failing() -> Self {
            Self {
                values: StdMutex::new(HashMap::new()),
                fail_reads: true,
            }
        }
    }

    #[async_trait]
    impl SettingRepository for FakeSettings {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Database("settings store down".to_string()));
            }
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

    fn registry() -> Arc<SupplierRegistry> {
        Arc::new(
            SupplierRegistry::new()
                .register(Arc::new(MockSupplier::new(SupplierId::DataXpress)))
                .register(Arc::new(MockSupplier::new(SupplierId::DataKazina))),
        )
    }

    #[tokio::test]
    async fn missing_setting_falls_back_to_default() {
        let router = SupplierRouter::new(
            registry(),
            Arc::new(FakeSettings::empty()),
            Duration::ZERO,
        );
        assert_eq!(
            router.active(ServiceCategory::Fastnet).await,
            SupplierId::DataXpress
        );
    }

    #[tokio::test]
    async fn set_active_takes_effect_immediately() {
        let router = SupplierRouter::new(
            registry(),
            Arc::new(FakeSettings::empty()),
            Duration::from_secs(60),
        );

        // Prime the cache with the default, then swap.
        assert_eq!(
            router.active(ServiceCategory::Fastnet).await,
            SupplierId::DataXpress
        );
        router
            .set_active(ServiceCategory::Fastnet, SupplierId::DataKazina)
            .await
            .unwrap();
        assert_eq!(
            router.active(ServiceCategory::Fastnet).await,
            SupplierId::DataKazina
        );
    }

    #[tokio::test]
    async fn settings_outage_routes_to_default() {
        let router = SupplierRouter::new(
            registry(),
            Arc::new(FakeSettings::failing()),
            Duration::ZERO,
        );
        let adapter = router.route(ServiceCategory::Fastnet).await.unwrap();
        assert_eq!(adapter.id(), SupplierId::DataXpress);
    }

    #[tokio::test]
    async fn unregistered_supplier_is_a_route_error() {
        let settings = FakeSettings::empty();
        settings
            .set("active_supplier:fastnet", "hubnet")
            .await
            .unwrap();
        let router = SupplierRouter::new(registry(), Arc::new(settings), Duration::ZERO);
        assert!(matches!(
            router.route(ServiceCategory::Fastnet).await,
            Err(RouteError::NotRegistered(SupplierId::Hubnet))
        ));
    }
}
