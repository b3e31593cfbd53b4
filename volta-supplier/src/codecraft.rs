use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use volta_core::supplier::{
    BalanceResponse, PurchaseContext, StatusResponse, SupplierApi, SupplierError, SupplierId,
    SupplierResponse,
};

use crate::amount::DataAmount;
use crate::SupplierEndpoint;

pub const MSG_NOT_CONFIGURED: &str = "CodeCraft credentials are not configured";
pub const MSG_NO_BALANCE_ENDPOINT: &str = "CodeCraft exposes no wallet balance endpoint";

// CodeCraft reports business outcomes as numeric codes. Each known code
// keeps its own message so operators can tell a stock-out from an empty
// supplier wallet at a glance.
pub const MSG_LOW_BALANCE: &str = "Supplier wallet balance is too low to fulfil this order";
pub const MSG_OUT_OF_STOCK: &str = "Requested bundle is out of stock at the supplier";
pub const MSG_AGENT_NOT_FOUND: &str = "Agent account not recognised by the supplier";
pub const MSG_PRICE_NOT_FOUND: &str = "No supplier price point matches this bundle";
pub const MSG_UNKNOWN_NETWORK: &str = "Supplier does not recognise the requested network";

/// CodeCraft wants GB labels plus an explicit network name, and
/// authenticates agents by id rather than per-request tokens.
pub struct CodeCraft {
    endpoint: Option<SupplierEndpoint>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct CodeEnvelope {
    code: i64,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    code: i64,
    order_status: Option<String>,
}

impl CodeCraft {
    pub fn new(endpoint: Option<SupplierEndpoint>) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }

    /// Map a CodeCraft result code to its stable message. Unknown codes get
    /// a generic message carrying the code for diagnosis.
    pub fn message_for_code(code: i64) -> String {
        match code {
            100 => MSG_LOW_BALANCE.to_string(),
            101 => MSG_OUT_OF_STOCK.to_string(),
            102 => MSG_AGENT_NOT_FOUND.to_string(),
            103 => MSG_PRICE_NOT_FOUND.to_string(),
            555 => MSG_UNKNOWN_NETWORK.to_string(),
            other => format!("CodeCraft returned result code {other}"),
        }
    }

    fn agent(endpoint: &SupplierEndpoint) -> Option<&str> {
        endpoint.agent_id.as_deref()
    }
}

#[async_trait]
impl SupplierApi for CodeCraft {
    fn id(&self) -> SupplierId {
        SupplierId::CodeCraft
    }

    async fn purchase(&self, req: &PurchaseContext) -> Result<SupplierResponse, SupplierError> {
        let amount = DataAmount::parse(&req.data_amount)?;
        let Some(endpoint) = &self.endpoint else {
            return Ok(SupplierResponse::rejected(MSG_NOT_CONFIGURED));
        };
        let Some(agent_id) = Self::agent(endpoint) else {
            return Ok(SupplierResponse::rejected(MSG_NOT_CONFIGURED));
        };

        let url = format!("{}/api/agent/orders", endpoint.base_url);
        debug!(url = %url, reference = %req.reference, "codecraft purchase");

        let result = self
            .http
            .post(&url)
            .bearer_auth(&endpoint.api_key)
            .json(&json!({
                "agent_id": agent_id,
                "network": req.network.as_str(),
                "phone": req.phone,
                "volume": amount.gigabytes_label(),
                "reference": req.reference,
            }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "codecraft purchase transport failure");
                return Ok(SupplierResponse::rejected(format!(
                    "CodeCraft request failed: {e}"
                )));
            }
        };

        match response.json::<CodeEnvelope>().await {
            Ok(envelope) if envelope.code == 200 => Ok(SupplierResponse::accepted(
                envelope
                    .message
                    .unwrap_or_else(|| "Order accepted by CodeCraft".to_string()),
                envelope.data,
            )),
            Ok(envelope) => Ok(SupplierResponse::rejected(Self::message_for_code(
                envelope.code,
            ))),
            Err(e) => Ok(SupplierResponse::rejected(format!(
                "CodeCraft returned an unreadable response: {e}"
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

        let url = format!("{}/api/agent/orders/{}/status", endpoint.base_url, reference);
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
            success: envelope.code == 200,
            status: envelope.order_status,
            message: Self::message_for_code(envelope.code),
            data: None,
        })
    }

    async fn wallet_balance(&self) -> BalanceResponse {
        BalanceResponse::unsupported(MSG_NO_BALANCE_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use volta_core::category::Network;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> PurchaseContext {
        PurchaseContext {
            phone: "0541112222".to_string(),
            data_amount: "5GB".to_string(),
            price: Decimal::from(10),
            reference: "VT-TEST000001".to_string(),
            network: Network::Mtn,
        }
    }

    async fn adapter_against(server: &MockServer) -> CodeCraft {
        CodeCraft::new(Some(SupplierEndpoint {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            agent_id: Some("agent-1".to_string()),
        }))
    }

    #[tokio::test]
    async fn purchase_maps_each_rejection_code_to_its_documented_message() {
        let cases = [
            (100, MSG_LOW_BALANCE),
            (101, MSG_OUT_OF_STOCK),
            (102, MSG_AGENT_NOT_FOUND),
            (103, MSG_PRICE_NOT_FOUND),
            (555, MSG_UNKNOWN_NETWORK),
        ];

        for (code, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/agent/orders"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": code })),
                )
                .mount(&server)
                .await;

            let response = adapter_against(&server)
                .await
                .purchase(&context())
                .await
                .unwrap();
            assert!(!response.success, "code {code} must reject");
            assert_eq!(response.message, expected, "code {code}");
        }
    }

    #[tokio::test]
    async fn purchase_accepts_code_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agent/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "message": "queued",
            })))
            .mount(&server)
            .await;

        let response = adapter_against(&server)
            .await
            .purchase(&context())
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.message, "queued");
    }

    #[test]
    fn each_rejection_code_maps_to_its_own_message() {
        assert_eq!(
            CodeCraft::message_for_code(100),
            "Supplier wallet balance is too low to fulfil this order"
        );
        assert_eq!(
            CodeCraft::message_for_code(101),
            "Requested bundle is out of stock at the supplier"
        );
        assert_eq!(
            CodeCraft::message_for_code(102),
            "Agent account not recognised by the supplier"
        );
        assert_eq!(
            CodeCraft::message_for_code(103),
            "No supplier price point matches this bundle"
        );
        assert_eq!(
            CodeCraft::message_for_code(555),
            "Supplier does not recognise the requested network"
        );
    }

    #[test]
    fn unknown_codes_keep_the_code_visible() {
        assert_eq!(
            CodeCraft::message_for_code(777),
            "CodeCraft returned result code 777"
        );
    }

    #[tokio::test]
    async fn balance_endpoint_is_declared_unsupported() {
        let adapter = CodeCraft::new(None);
        let response = adapter.wallet_balance().await;
        assert!(!response.success);
        assert_eq!(response.message, MSG_NO_BALANCE_ENDPOINT);
    }
}
