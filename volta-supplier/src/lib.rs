pub mod amount;
pub mod codecraft;
pub mod datakazina;
pub mod dataxpress;
pub mod hubnet;
pub mod mock;
pub mod registry;
pub mod router;

pub use registry::{default_supplier, SupplierRegistry};
pub use router::SupplierRouter;

/// Credentials and endpoint for one supplier integration, as loaded from
/// configuration. A supplier left out of the config is still registered
/// but answers every purchase with a fixed not-configured failure.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SupplierEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub agent_id: Option<String>,
}
