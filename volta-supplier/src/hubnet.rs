use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use volta_core::category::Network;
use volta_core::supplier::{
    BalanceResponse, PurchaseContext, StatusResponse, SupplierApi, SupplierError, SupplierId,
    SupplierResponse,
};

use crate::amount::DataAmount;
use crate::SupplierEndpoint;

pub const MSG_NOT_CONFIGURED: &str = "Hubnet credentials are not configured";

/// Fixed reply for status checks: Hubnet has no polling endpoint at all,
/// delivery confirmations arrive only on their inbound webhook.
pub const MSG_WEBHOOK_ONLY: &str =
    "Hubnet does not support status polling; delivery is confirmed via webhook";

/// Hubnet takes MB volumes on per-network transaction endpoints. It is the
/// one webhook-only supplier: `check_status` never touches the network.
pub struct Hubnet {
    endpoint: Option<SupplierEndpoint>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    status: String,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WalletEnvelope {
    balance: Decimal,
}

impl Hubnet {
    pub fn new(endpoint: Option<SupplierEndpoint>) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }

    fn network_path(network: Network) -> &'static str {
        match network {
            Network::Mtn => "mtn-new-transaction",
            Network::At => "at-new-transaction",
            Network::Telecel => "telecel-new-transaction",
        }
    }
}

#[async_trait]
impl SupplierApi for Hubnet {
    fn id(&self) -> SupplierId {
        SupplierId::Hubnet
    }

    fn supports_polling(&self) -> bool {
        false
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError> {
        let amount = DataAmount::parse(&req.data_amount)?;
        let Some(endpoint) = &self.endpoint else {
            return Ok(SupplierResponse::rejected(MSG_NOT_CONFIGURED));
        };

        let url = format!(
            "{}/transaction/{}",
            endpoint.base_url,
            Self::network_path(req.network)
        );
        debug!(url = %url, reference = %req.reference, "hubnet purchase");

        let result = self
            .http
            .post(&url)
            .header("token", &endpoint.api_key)
            .json(&json!({
                "phone": req.phone,
                "volume": amount.megabytes(),
                "reference": req.reference,
            }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "hubnet purchase transport failure");
                return Ok(SupplierResponse::rejected(format!(
                    "Hubnet request failed: {e}"
                )));
            }
        };

        if !response.status().is_success() {
            return Ok(SupplierResponse::rejected(format!(
                "Hubnet rejected the request with HTTP {}",
                response.status()
            )));
        }

        match response.json::<TransactionEnvelope>().await {
            Ok(envelope) if envelope.status == "success" => Ok(SupplierResponse::accepted(
                envelope
                    .message
                    .unwrap_or_else(|| "Transaction accepted by Hubnet".to_string()),
                envelope.data,
            )),
            Ok(envelope) => Ok(SupplierResponse::rejected(envelope.message.unwrap_or_else(
                || format!("Hubnet returned status {}", envelope.status),
            ))),
            Err(e) => Ok(SupplierResponse::rejected(format!(
                "Hubnet returned an unreadable response: {e}"
            ))),
        }
    }

    async fn check_status(&self, _reference: &str) -> Result<StatusResponse, SupplierError> {
        Ok(StatusResponse {
            success: false,
            status: None,
            message: MSG_WEBHOOK_ONLY.to_string(),
            data: None,
        })
    }

    async fn wallet_balance(&self) -> BalanceResponse {
        let Some(endpoint) = &self.endpoint else {
            return BalanceResponse::unsupported(MSG_NOT_CONFIGURED);
        };

        let url = format!("{}/wallet/balance", endpoint.base_url);
        let result = self
            .http
            .get(&url)
            .header("token", &endpoint.api_key)
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<WalletEnvelope>().await {
                Ok(envelope) => BalanceResponse {
                    success: true,
                    balance: Some(envelope.balance),
                    message: "ok".to_string(),
                },
                Err(e) => {
                    BalanceResponse::unsupported(format!("Hubnet balance response unreadable: {e}"))
                }
            },
            Err(e) => BalanceResponse::unsupported(format!("Hubnet balance request failed: {e}")),
        }
    }
}
