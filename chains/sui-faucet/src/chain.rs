//! Sui JSON-RPC client
//!
//! Builds a Move call with `unsafe_moveCall`, signs the returned bytes locally
//! and submits them with `sui_executeTransactionBlock`.

use crate::account::AccountIdentity;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use core_logic::{with_retry, RetryConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// One Move entry-function call
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
    pub gas_budget: u64,
}

/// Executes signed transactions on behalf of an identity.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns the transaction digest.
    async fn execute_move_call(&self, signer: &AccountIdentity, call: &MoveCall) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

#[derive(Debug, Deserialize)]
struct ExecutionResponse {
    digest: String,
    #[serde(default)]
    effects: Option<Effects>,
}

#[derive(Debug, Deserialize)]
struct Effects {
    status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
struct ExecutionStatus {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct SuiRpcClient {
    client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
    retry: RetryConfig,
}

impl SuiRpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create RPC client")?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request failed", method))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{} returned HTTP {}: {}", method, status, text);
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("{} returned malformed JSON", method))?;

        if let Some(err) = parsed.error {
            bail!("{} error {}: {}", method, err.code, err.message);
        }
        parsed
            .result
            .ok_or_else(|| anyhow!("{} returned no result", method))
    }

    async fn build_move_call(&self, sender: &str, call: &MoveCall) -> Result<String> {
        let params = json!([
            sender,
            call.package,
            call.module,
            call.function,
            call.type_arguments,
            call.arguments,
            Value::Null,
            call.gas_budget.to_string(),
        ]);

        let built: TransactionBytes = with_retry(self.retry.clone(), "unsafe_moveCall", || {
            self.call("unsafe_moveCall", params.clone())
        })
        .await?;
        Ok(built.tx_bytes)
    }
}

fn check_execution(response: ExecutionResponse) -> Result<String> {
    match response.effects {
        Some(Effects { status }) if status.status != "success" => bail!(
            "transaction {} failed: {}",
            response.digest,
            status.error.unwrap_or(status.status)
        ),
        _ => Ok(response.digest),
    }
}

#[async_trait]
impl ChainClient for SuiRpcClient {
    async fn execute_move_call(&self, signer: &AccountIdentity, call: &MoveCall) -> Result<String> {
        let tx_bytes_b64 = self.build_move_call(signer.address(), call).await?;

        let tx_bytes = BASE64
            .decode(&tx_bytes_b64)
            .context("unsafe_moveCall returned non-base64 txBytes")?;
        let signature = signer.sign_transaction(&tx_bytes);

        debug!(
            "Submitting {}::{}::{} for {}",
            call.package,
            call.module,
            call.function,
            signer.short_tag()
        );

        // Submission is not retried: a resend could execute twice
        let response: ExecutionResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    tx_bytes_b64,
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        check_execution(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_effects_yield_digest() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "digest": "9xYz",
            "effects": { "status": { "status": "success" } }
        }))
        .unwrap();
        assert_eq!(check_execution(response).unwrap(), "9xYz");
    }

    #[test]
    fn test_failed_effects_are_errors() {
        let response: ExecutionResponse = serde_json::from_value(json!({
            "digest": "9xYz",
            "effects": { "status": { "status": "failure", "error": "InsufficientGas" } }
        }))
        .unwrap();
        let err = check_execution(response).unwrap_err();
        assert!(err.to_string().contains("InsufficientGas"));
    }

    #[test]
    fn test_rpc_error_envelope_parses() {
        let parsed: RpcResponse<TransactionBytes> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "bad params" }
        }))
        .unwrap();
        assert!(parsed.result.is_none());
        assert_eq!(parsed.error.unwrap().code, -32602);
    }
}
