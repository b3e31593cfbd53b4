use std::collections::HashMap;
use std::sync::Arc;

use volta_core::category::ServiceCategory;
use volta_core::supplier::{SupplierApi, SupplierId};

use crate::codecraft::CodeCraft;
use crate::datakazina::DataKazina;
use crate::dataxpress::DataXpress;
use crate::hubnet::Hubnet;
use crate::SupplierEndpoint;

/// Hardcoded fallback when no active-supplier setting exists for a
/// category.
pub fn default_supplier(category: ServiceCategory) -> SupplierId {
    match category {
        ServiceCategory::Fastnet => SupplierId::DataXpress,
        ServiceCategory::Airshare => SupplierId::Hubnet,
        ServiceCategory::Teledata => SupplierId::DataKazina,
    }
}

/// Closed map of supplier id to adapter. Built once at startup; routing
/// resolves against this, never against string comparisons.
pub struct SupplierRegistry {
    adapters: HashMap<SupplierId, Arc<dyn SupplierApi>>,
}

impl SupplierRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Build the production registry from per-supplier configuration.
    /// Unconfigured suppliers are still registered; they answer with a
    /// fixed not-configured failure instead of being absent.
    pub fn from_endpoints(
        dataxpress: Option<SupplierEndpoint>,
        hubnet: Option<SupplierEndpoint>,
        datakazina: Option<SupplierEndpoint>,
        codecraft: Option<SupplierEndpoint>,
    ) -> Self {
        Self::new()
            .register(Arc::new(DataXpress::new(dataxpress)))
            .register(Arc::new(Hubnet::new(hubnet)))
            .register(Arc::new(DataKazina::new(datakazina)))
            .register(Arc::new(CodeCraft::new(codecraft)))
    }

    pub fn register(mut self, adapter: Arc<dyn SupplierApi>) -> Self {
        self.adapters.insert(adapter.id(), adapter);
        self
    }

    pub fn get(&self, id: SupplierId) -> Option<Arc<dyn SupplierApi>> {
        self.adapters.get(&id).cloned()
    }

    /// Registered adapters in the stable [`SupplierId::ALL`] order.
    pub fn suppliers(&self) -> Vec<Arc<dyn SupplierApi>> {
        SupplierId::ALL
            .iter()
            .filter_map(|id| self.adapters.get(id).cloned())
            .collect()
    }

    /// Suppliers whose delivery status cannot be polled. Reconciliation
    /// batches exclude orders created under these.
    pub fn non_polling(&self) -> Vec<SupplierId> {
        SupplierId::ALL
            .iter()
            .filter_map(|id| self.adapters.get(id))
            .filter(|adapter| !adapter.supports_polling())
            .map(|adapter| adapter.id())
            .collect()
    }
}

impl Default for SupplierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
