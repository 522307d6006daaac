use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{RpcError, RpcResult};
use super::{Provider, TransactionReceipt, TransactionRequest};

#[derive(Debug, Clone)]
pub(crate) enum GasScript {
    Gas(u64),
    Revert(&'static str),
}

type CallHandler = Box<dyn Fn(&TransactionRequest) -> RpcResult<Bytes> + Send + Sync>;
type EstimateHandler = Box<dyn Fn(&TransactionRequest) -> Option<GasScript> + Send + Sync>;

/// 按脚本应答的测试 provider，记录所有收到的请求。
#[derive(Default)]
pub(crate) struct MockProvider {
    chain_id: u64,
    estimate_delay: Duration,
    send_delay: Duration,
    estimates: HashMap<[u8; 4], GasScript>,
    estimate_handler: Option<EstimateHandler>,
    call_handler: Option<CallHandler>,
    sign_response: Option<Result<Bytes, (i64, String)>>,
    send_error: Option<(i64, String)>,
    receipt_status: Option<u64>,
    pub(crate) calls: Mutex<Vec<TransactionRequest>>,
    pub(crate) estimated: Mutex<Vec<TransactionRequest>>,
    pub(crate) sent: Mutex<Vec<TransactionRequest>>,
    pub(crate) sign_requests: Mutex<Vec<(Address, String)>>,
}

impl MockProvider {
    pub(crate) fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Self::default()
        }
    }

    /// 每次 gas 估算在应答前等待的时长。
    pub(crate) fn with_estimate_delay(mut self, delay: Duration) -> Self {
        self.estimate_delay = delay;
        self
    }

    pub(crate) fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub(crate) fn with_estimate(mut self, selector: [u8; 4], script: GasScript) -> Self {
        self.estimates.insert(selector, script);
        self
    }

    /// 按完整请求决定估算结果，返回 `None` 时退回按选择器配置的脚本。
    pub(crate) fn with_estimate_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TransactionRequest) -> Option<GasScript> + Send + Sync + 'static,
    {
        self.estimate_handler = Some(Box::new(handler));
        self
    }

    pub(crate) fn with_call_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TransactionRequest) -> RpcResult<Bytes> + Send + Sync + 'static,
    {
        self.call_handler = Some(Box::new(handler));
        self
    }

    pub(crate) fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.sign_response = Some(Ok(Bytes::from(signature)));
        self
    }

    pub(crate) fn with_sign_rejection(mut self, code: i64, message: &str) -> Self {
        self.sign_response = Some(Err((code, message.to_string())));
        self
    }

    pub(crate) fn with_send_error(mut self, code: i64, message: &str) -> Self {
        self.send_error = Some((code, message.to_string()));
        self
    }

    pub(crate) fn with_receipt_status(mut self, status: u64) -> Self {
        self.receipt_status = Some(status);
        self
    }

    pub(crate) fn sent_selectors(&self) -> Vec<[u8; 4]> {
        self.sent
            .lock()
            .iter()
            .filter_map(TransactionRequest::selector)
            .collect()
    }

    fn hash_for(index: usize) -> B256 {
        B256::with_last_byte(index as u8 + 1)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(self.chain_id)
    }

    async fn accounts(&self) -> RpcResult<Vec<Address>> {
        Ok(Vec::new())
    }

    async fn call(&self, request: &TransactionRequest) -> RpcResult<Bytes> {
        self.calls.lock().push(request.clone());
        match &self.call_handler {
            Some(handler) => handler(request),
            None => Err(RpcError::fatal("mock provider has no call handler")),
        }
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> RpcResult<U256> {
        self.estimated.lock().push(request.clone());
        if !self.estimate_delay.is_zero() {
            tokio::time::sleep(self.estimate_delay).await;
        }
        let script = self
            .estimate_handler
            .as_ref()
            .and_then(|handler| handler(request))
            .or_else(|| {
                request
                    .selector()
                    .and_then(|selector| self.estimates.get(&selector).cloned())
            })
            .unwrap_or(GasScript::Revert("execution reverted"));
        match script {
            GasScript::Gas(gas) => Ok(U256::from(gas)),
            GasScript::Revert(reason) => Err(RpcError::Response {
                code: 3,
                message: reason.to_string(),
                data: None,
            }),
        }
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> RpcResult<B256> {
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        let mut sent = self.sent.lock();
        sent.push(request.clone());
        if let Some((code, message)) = &self.send_error {
            return Err(RpcError::Response {
                code: *code,
                message: message.clone(),
                data: None,
            });
        }
        Ok(Self::hash_for(sent.len() - 1))
    }

    async fn sign_typed_data_v4(&self, signer: Address, typed_data: &str) -> RpcResult<Bytes> {
        self.sign_requests
            .lock()
            .push((signer, typed_data.to_string()));
        match &self.sign_response {
            Some(Ok(signature)) => Ok(signature.clone()),
            Some(Err((code, message))) => Err(RpcError::Response {
                code: *code,
                message: message.clone(),
                data: None,
            }),
            None => Err(RpcError::fatal("mock provider cannot sign")),
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> RpcResult<Option<TransactionReceipt>> {
        let known = (0..self.sent.lock().len()).any(|index| Self::hash_for(index) == hash);
        if !known {
            return Ok(None);
        }
        Ok(Some(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U256::from(1u8)),
            gas_used: Some(U256::from(21_000u64)),
            status: Some(U256::from(self.receipt_status.unwrap_or(1))),
        }))
    }
}
