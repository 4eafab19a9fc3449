use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::models::{Balance, SignedBlock};

/// The subset of node config the monitor cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Seconds between blocks; the poller uses this as its cadence.
    #[serde(rename = "STEEMIT_BLOCK_INTERVAL", alias = "GOLOS_BLOCK_INTERVAL")]
    pub block_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u64,
}

/// Boundary to the chain node. The poller, detector and HTTP API only see
/// this trait, so tests substitute scripted implementations for the real
/// JSON-RPC client.
#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn get_config(&self) -> Result<ChainConfig, RpcError>;

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, RpcError>;

    async fn get_block(&self, height: u64) -> Result<SignedBlock, RpcError>;

    /// Batched balance snapshot for exactly the given accounts.
    async fn get_accounts(&self, names: &[String]) -> Result<Vec<Balance>, RpcError>;

    /// Synchronous broadcast; the raw node response is handed back untouched.
    async fn broadcast_transaction(&self, trx: &Value) -> Result<Value, RpcError>;

    /// Single-account convenience over `get_accounts`.
    async fn get_balance(&self, account: &str) -> Result<Balance, RpcError> {
        let balances = self.get_accounts(&[account.to_string()]).await?;
        balances
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::AccountNotFound(account.to_string()))
    }

    /// Whether the account is known to the chain.
    async fn account_exists(&self, account: &str) -> Result<bool, RpcError> {
        let balances = self.get_accounts(&[account.to_string()]).await?;
        Ok(!balances.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    // A present-but-null result must stay `Some(Value::Null)` so callers can
    // tell it apart from a missing result field.
    #[serde(default, deserialize_with = "deserialize_present_result")]
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

fn deserialize_present_result<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 client for a Steem/Golos-style node.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Self {
        Self::new_with_config(endpoint, 30)
    }

    pub fn new_with_config(endpoint: String, timeout_seconds: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_seconds))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let rpc_response: JsonRpcResponse = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("No result in response".to_string()))
    }
}

#[async_trait]
impl ChainApi for RpcClient {
    async fn get_config(&self) -> Result<ChainConfig, RpcError> {
        let result = self
            .make_request("condenser_api.get_config", serde_json::json!([]))
            .await?;
        serde_json::from_value(result).map_err(RpcError::Json)
    }

    async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, RpcError> {
        let result = self
            .make_request(
                "condenser_api.get_dynamic_global_properties",
                serde_json::json!([]),
            )
            .await?;
        serde_json::from_value(result).map_err(RpcError::Json)
    }

    async fn get_block(&self, height: u64) -> Result<SignedBlock, RpcError> {
        let result = self
            .make_request("condenser_api.get_block", serde_json::json!([height]))
            .await?;

        if result.is_null() {
            return Err(RpcError::BlockNotFound { height });
        }

        let mut block: SignedBlock = serde_json::from_value(result).map_err(RpcError::Json)?;
        // get_block does not echo the number back; carry the requested one.
        block.height = height;
        Ok(block)
    }

    async fn get_accounts(&self, names: &[String]) -> Result<Vec<Balance>, RpcError> {
        let result = self
            .make_request("condenser_api.get_accounts", serde_json::json!([names]))
            .await?;
        serde_json::from_value(result).map_err(RpcError::Json)
    }

    async fn broadcast_transaction(&self, trx: &Value) -> Result<Value, RpcError> {
        self.make_request(
            "network_broadcast_api.broadcast_transaction_synchronous",
            serde_json::json!([trx]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_body(result: &str) -> String {
        format!(r#"{{"jsonrpc":"2.0","result":{},"id":1}}"#, result)
    }

    #[tokio::test]
    async fn test_get_config_parses_block_interval() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body(
                r#"{"STEEMIT_BLOCK_INTERVAL":3,"STEEMIT_ADDRESS_PREFIX":"GLS"}"#,
            ))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let config = client.get_config().await.unwrap();
        assert_eq!(config.block_interval, 3);
    }

    #[tokio::test]
    async fn test_get_dynamic_global_properties() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body(
                r#"{"head_block_number":4242,"time":"2024-05-01T12:30:03"}"#,
            ))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let props = client.get_dynamic_global_properties().await.unwrap();
        assert_eq!(props.head_block_number, 4242);
    }

    #[tokio::test]
    async fn test_get_block_carries_requested_height() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body(
                r#"{"timestamp":"2024-05-01T12:30:03","transactions":[{"operations":[["transfer",{"from":"alice","to":"bob","amount":"1.000 GOLOS","memo":""}]]}]}"#,
            ))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let block = client.get_block(105).await.unwrap();
        assert_eq!(block.height, 105);
        assert_eq!(block.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_get_block_null_result_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body("null"))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let err = client.get_block(999).await.unwrap_err();
        assert!(matches!(err, RpcError::BlockNotFound { height: 999 }));
    }

    #[tokio::test]
    async fn test_get_accounts_projects_balances() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body(
                r#"[{"name":"alice","balance":"1.000 GOLOS","sbd_balance":"0.500 GBG","post_count":7}]"#,
            ))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let balances = client
            .get_accounts(&["alice".to_string()])
            .await
            .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].name, "alice");
        assert_eq!(balances[0].balance, "1.000 GOLOS");
    }

    #[tokio::test]
    async fn test_get_balance_of_missing_account() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json_body("[]"))
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let err = client.get_balance("nonexistent").await.unwrap_err();
        assert!(matches!(err, RpcError::AccountNotFound(_)));

        // account_exists reports the same condition without erroring
        let exists = client.account_exists("nonexistent").await.unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn test_rpc_error_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":1}"#)
            .create_async()
            .await;

        let client = RpcClient::new(server.url());
        let err = client.get_config().await.unwrap_err();
        match err {
            RpcError::Method { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected method error, got {:?}", other),
        }
    }

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "condenser_api.get_block".to_string(),
            params: serde_json::json!([105]),
            id: 1,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        let expected =
            r#"{"jsonrpc":"2.0","method":"condenser_api.get_block","params":[105],"id":1}"#;
        assert_eq!(serialized, expected);
    }
}
