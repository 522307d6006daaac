use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::error::{RpcError, RpcResult};
use super::{Provider, TransactionReceipt, TransactionRequest};

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 基于 HTTP 的 JSON-RPC provider。
#[derive(Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    url: Arc<str>,
}

impl HttpProvider {
    pub fn new(url: &Url, timeout: Duration) -> RpcResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: Arc::from(url.as_str()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> RpcResult<T> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let started = Instant::now();
        let raw = self
            .client
            .post(self.url.as_ref())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        debug!(
            target: "rpc",
            method,
            id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rpc request finished"
        );

        parse_response(method, raw)
    }
}

fn parse_response<T: DeserializeOwned>(method: &'static str, raw: Value) -> RpcResult<T> {
    if let Some(error) = raw.get("error") {
        return Err(parse_rpc_error(error));
    }

    match raw.get("result") {
        Some(result) => Ok(serde_json::from_value(result.clone())?),
        None => Err(RpcError::MissingResult { method }),
    }
}

fn parse_rpc_error(error: &Value) -> RpcError {
    match serde_json::from_value::<RpcErrorObject>(error.clone()) {
        Ok(object) => RpcError::Response {
            code: object.code,
            message: object.message,
            data: object.data,
        },
        Err(_) => RpcError::fatal(format!("无法解析的 RPC 错误: {error}")),
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn chain_id(&self) -> RpcResult<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> RpcResult<U256> {
        self.request("eth_estimateGas", json!([request])).await
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<B256> {
        debug!(
            target: "rpc",
            to = ?request.to,
            selector = ?request.selector().map(alloy_primitives::hex::encode),
            "eth_sendTransaction"
        );
        self.request("eth_sendTransaction", json!([request])).await
    }

    async fn sign_typed_data_v4(&self, signer: Address, typed_data: &str) -> RpcResult<Bytes> {
        self.request("eth_signTypedData_v4", json!([signer, typed_data]))
            .await
    }

    async fn transaction_receipt(&self, hash: B256) -> RpcResult<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
