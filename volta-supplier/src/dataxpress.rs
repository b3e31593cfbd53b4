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

pub const MSG_NOT_CONFIGURED: &str = "DataXpress credentials are not configured";

/// DataXpress sells GB-denominated bundles behind a bearer-token REST API
/// and supports status polling by our own reference.
pub struct DataXpress {
    endpoint: Option<SupplierEndpoint>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PurchaseEnvelope {
    status: String,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: String,
    order_status: Option<String>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BalanceEnvelope {
    balance: Decimal,
}

impl DataXpress {
    pub fn new(endpoint: Option<SupplierEndpoint>) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl SupplierApi for DataXpress {
    fn id(&self) -> SupplierId {
        SupplierId::DataXpress
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError> {
        let amount = DataAmount::parse(&req.data_amount)?;
        let Some(endpoint) = &self.endpoint else {
            return Ok(SupplierResponse::rejected(MSG_NOT_CONFIGURED));
        };

        let url = format!("{}/api/v1/purchase", endpoint.base_url);
        debug!(url = %url, reference = %req.reference, "dataxpress purchase");

        let result = self
            .http
            .post(&url)
            .bearer_auth(&endpoint.api_key)
            .json(&json!({
                "phone": req.phone,
                "volume": amount.gigabytes_label(),
                "reference": req.reference,
            }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "dataxpress purchase transport failure");
                return Ok(SupplierResponse::rejected(format!(
                    "DataXpress request failed: {e}"
                )));
            }
        };

        if !response.status().is_success() {
            return Ok(SupplierResponse::rejected(format!(
                "DataXpress rejected the request with HTTP {}",
                response.status()
            )));
        }

        match response.json::<PurchaseEnvelope>().await {
            Ok(envelope) if envelope.status == "success" => Ok(SupplierResponse::accepted(
                envelope
                    .message
                    .unwrap_or_else(|| "Order accepted by DataXpress".to_string()),
                envelope.data,
            )),
            Ok(envelope) => Ok(SupplierResponse::rejected(
                envelope
                    .message
                    .unwrap_or_else(|| format!("DataXpress returned status {}", envelope.status)),
            )),
            Err(e) => Ok(SupplierResponse::rejected(format!(
                "DataXpress returned an unreadable response: {e}"
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

        let url = format!("{}/api/v1/status/{}", endpoint.base_url, reference);
        let envelope = self
            .http
            .get(&url)
            .bearer_auth(&endpoint.api_key)
            .send()
            .await
            .map_err(|e| SupplierError::Transport(e.to_string()))?
            .json::<StatusEnvelope>()
            .await
            .map_err(|e| SupplierError::InvalidResponse(e.to_string()))?;

        Ok(StatusResponse {
            success: envelope.status == "success",
            status: envelope.order_status,
            message: format!("DataXpress lookup returned status {}", envelope.status),
            data: envelope.data,
        })
    }

    async fn wallet_balance(&self) -> BalanceResponse {
        let Some(endpoint) = &self.endpoint else {
            return BalanceResponse::unsupported(MSG_NOT_CONFIGURED);
        };

        let url = format!("{}/api/v1/balance", endpoint.base_url);
        let result = self
            .http
            .get(&url)
            .bearer_auth(&endpoint.api_key)
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<BalanceEnvelope>().await {
                Ok(envelope) => BalanceResponse {
                    success: true,
                    balance: Some(envelope.balance),
                    message: "ok".to_string(),
                },
                Err(e) => BalanceResponse::unsupported(format!(
                    "DataXpress balance response unreadable: {e}"
                )),
            },
            Err(e) => {
                BalanceResponse::unsupported(format!("DataXpress balance request failed: {e}"))
            }
        }
    }
}
