use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use volta_core::supplier::{
    BalanceResponse, PurchaseContext, StatusResponse, SupplierApi, SupplierError, SupplierId,
    SupplierResponse,
};

use crate::amount::DataAmount;
use crate::SupplierEndpoint;

pub const MSG_NOT_CONFIGURED: &str = "DataKazina credentials are not configured";

/// DataKazina takes MB volumes and assigns its own transaction id, which
/// it expects back on status lookups instead of our reference. The poller
/// picks that id out of the stored purchase response.
pub struct DataKazina {
    endpoint: Option<SupplierEndpoint>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    status: String,
    message: Option<String>,
    transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: String,
    order_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WalletEnvelope {
    balance: Decimal,
}

impl DataKazina {
    pub fn new(endpoint: Option<SupplierEndpoint>) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl SupplierApi for DataKazina {
    fn id(&self) -> SupplierId {
        SupplierId::DataKazina
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError> {
        let amount = DataAmount::parse(&req.data_amount)?;
        let Some(endpoint) = &self.endpoint else {
            return Ok(SupplierResponse::rejected(MSG_NOT_CONFIGURED));
        };

        let url = format!("{}/api/orders", endpoint.base_url);
        debug!(url = %url, reference = %req.reference, "datakazina purchase");

        let result = self
            .http
            .post(&url)
            .header("x-api-key", &endpoint.api_key)
            .json(&json!({
                "recipient": req.phone,
                "data_mb": amount.megabytes(),
                "network": req.network.as_str(),
                "reference": req.reference,
            }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "datakazina purchase transport failure");
                return Ok(SupplierResponse::rejected(format!(
                    "DataKazina request failed: {e}"
                )));
            }
        };

        if !response.status().is_success() {
            return Ok(SupplierResponse::rejected(format!(
                "DataKazina rejected the request with HTTP {}",
                response.status()
            )));
        }

        match response.json::<OrderEnvelope>().await {
            Ok(envelope) if envelope.status == "ok" => {
                // transaction_id is what their status endpoint wants back.
                let data = envelope
                    .transaction_id
                    .as_ref()
                    .map(|id| json!({ "transaction_id": id }));
                Ok(SupplierResponse::accepted(
                    envelope
                        .message
                        .unwrap_or_else(|| "Order accepted by DataKazina".to_string()),
                    data,
                ))
            }
            Ok(envelope) => Ok(SupplierResponse::rejected(envelope.message.unwrap_or_else(
                || format!("DataKazina returned status {}", envelope.status),
            ))),
            Err(e) => Ok(SupplierResponse::rejected(format!(
                "DataKazina returned an unreadable response: {e}"
            ))),
        }
    }

    async fn check_status(&self, reference: &str) -> Result<StatusResponse, SupplierError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(StatusResponse {
                success: false,
                status: None,
                message: MSG_NOT_CONFIGURED.to_string(),
                data: None,
            });
        };

        let url = format!("{}/api/orders/{}", endpoint.base_url, reference);
        let envelope = self
            .http
            .get(&url)
            .header("x-api-key", &endpoint.api_key)
            .send()
            .await
            .map_err(|e| SupplierError::Transport(e.to_string()))?
            .json::<StatusEnvelope>()
            .await
            .map_err(|e| SupplierError::InvalidResponse(e.to_string()))?;

        Ok(StatusResponse {
            success: envelope.status == "ok",
            status: envelope.order_status,
            message: format!("DataKazina lookup returned status {}", envelope.status),
            data: None,
        })
    }

    async fn wallet_balance(&self) -> BalanceResponse {
        let Some(endpoint) = &self.endpoint else {
            return BalanceResponse::unsupported(MSG_NOT_CONFIGURED);
        };

        let url = format!("{}/api/wallet", endpoint.base_url);
        let result = self
            .http
            .get(&url)
            .header("x-api-key", &endpoint.api_key)
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<WalletEnvelope>().await {
                Ok(envelope) => BalanceResponse {
                    success: true,
                    balance: Some(envelope.balance),
                    message: "ok".to_string(),
                },
                Err(e) => BalanceResponse::unsupported(format!(
                    "DataKazina balance response unreadable: {e}"
                )),
            },
            Err(e) => {
                BalanceResponse::unsupported(format!("DataKazina balance request failed: {e}"))
            }
        }
    }
}
