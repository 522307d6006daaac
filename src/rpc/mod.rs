pub mod error;
mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use error::{RpcError, RpcResult};
pub use http::HttpProvider;

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 交易请求，字段与 `eth_call` / `eth_estimateGas` / `eth_sendTransaction` 的参数一致。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_gas(mut self, gas: U256) -> Self {
        self.gas = Some(gas);
        self
    }

    /// 调用数据的 4 字节函数选择器。
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data
            .get(..4)
            .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U256>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub status: Option<U256>,
}

impl TransactionReceipt {
    /// 拜占庭分叉前的回执没有 status 字段，视为成功。
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == U256::from(1u8))
    }
}

/// 钱包侧 JSON-RPC provider 的最小能力集合。
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chain_id(&self) -> RpcResult<u64>;

    async fn accounts(&self) -> RpcResult<Vec<Address>>;

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> RpcResult<U256>;

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<B256>;

    /// `eth_signTypedData_v4`，`typed_data` 为 EIP-712 JSON 文本。
    async fn sign_typed_data_v4(&self, signer: Address, typed_data: &str) -> RpcResult<Bytes>;

    async fn transaction_receipt(&self, hash: B256) -> RpcResult<Option<TransactionReceipt>>;
}
