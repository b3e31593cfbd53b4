use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::Network;

/// Closed set of supplier integrations. Adding a supplier means
/// implementing [`SupplierApi`] and registering it, not editing dispatch
/// logic elsewhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SupplierId {
    DataXpress,
    Hubnet,
    DataKazina,
    CodeCraft,
}

impl SupplierId {
    pub const ALL: [SupplierId; 4] = [
        SupplierId::DataXpress,
        SupplierId::Hubnet,
        SupplierId::DataKazina,
        SupplierId::CodeCraft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierId::DataXpress => "dataxpress",
            SupplierId::Hubnet => "hubnet",
            SupplierId::DataKazina => "datakazina",
            SupplierId::CodeCraft => "codecraft",
        }
    }
}

impl std::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SupplierId {
    type Err = UnknownSupplier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dataxpress" => Ok(SupplierId::DataXpress),
            "hubnet" => Ok(SupplierId::Hubnet),
            "datakazina" => Ok(SupplierId::DataKazina),
            "codecraft" => Ok(SupplierId::CodeCraft),
            _ => Err(UnknownSupplier(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown supplier: {0}")]
pub struct UnknownSupplier(pub String);

/// Everything an adapter needs to place one bundle order.
#[derive(Debug, Clone)]
pub struct PurchaseContext {
    pub phone: String,
    /// Catalog amount string, e.g. "5GB". Adapters translate this into
    /// their native unit.
    pub data_amount: String,
    pub price: Decimal,
    /// Our reference for the order, quoted back on status checks.
    pub reference: String,
    pub network: Network,
}

/// Uniform purchase outcome. `success` means the supplier *accepted* the
/// order, not that the bundle was delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl SupplierResponse {
    pub fn accepted(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Raw status check result. `status` carries the supplier's own
/// vocabulary untouched; normalization is the poller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: Option<String>,
    pub message: String,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub balance: Option<Decimal>,
    pub message: String,
}

impl BalanceResponse {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            success: false,
            balance: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("unsupported data amount format: {0}")]
    UnsupportedFormat(String),
    #[error("supplier transport error: {0}")]
    Transport(String),
    #[error("unexpected supplier response: {0}")]
    InvalidResponse(String),
}

/// Capability surface every supplier integration provides.
///
/// Contract notes:
/// - `purchase` folds missing credentials and transport failures into a
///   `success:false` response; the only `Err` it may return is
///   [`SupplierError::UnsupportedFormat`] for an unparseable amount.
/// - `check_status` may surface transport failures as `Err`; callers
///   isolate those per order.
/// - `wallet_balance` is best-effort and infallible; suppliers without a
///   balance endpoint answer `success:false`.
#[async_trait]
pub trait SupplierApi: Send + Sync {
    fn id(&self) -> SupplierId;

    /// Whether this supplier can be polled for delivery status. Webhook-only
    /// suppliers return false and their orders are excluded from
    /// reconciliation batches.
    fn supports_polling(&self) -> bool {
        true
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError>;

    async fn check_status(&self, reference: &str) -> Result<StatusResponse, SupplierError>;

    async fn wallet_balance(&self) -> BalanceResponse;
}
