//! 把多次只读合约调用合并为一次 `aggregate` 调用。
//!
//! 每个子调用由 `SolCall` 类型描述：编码时使用它的选择器与参数，解码时使用同一个
//! 类型的返回值定义。结果与请求按位置一一对应。

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use thiserror::Error;
use tracing::debug;

use crate::contracts::IMulticall;
use crate::monitoring::events;
use crate::rpc::{Provider, RpcError, TransactionRequest};

#[derive(Debug, Error)]
pub enum MulticallError {
    #[error("multicall 聚合调用失败: {0}")]
    Rpc(#[from] RpcError),
    #[error("无法解码 aggregate 返回值: {0}")]
    Aggregate(#[source] alloy_sol_types::Error),
    #[error("第 {index} 个子调用 `{signature}` 返回值解码失败: {source}")]
    Decode {
        index: usize,
        signature: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },
    #[error("返回结果数量不匹配: 请求 {expected} 个，返回 {actual} 个")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("第 {index} 个结果属于 `{actual}`，不能按 `{expected}` 解码")]
    HandleMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("第 {index} 个句柄来自批次 {handle_batch}，不属于批次 {results_batch}")]
    ForeignHandle {
        index: usize,
        handle_batch: u64,
        results_batch: u64,
    },
}

pub type MulticallResult<T> = Result<T, MulticallError>;

/// 指向批次中某个子调用结果的句柄，类型参数即编码时使用的调用类型。
pub struct CallHandle<C> {
    batch: u64,
    index: usize,
    _call: PhantomData<fn() -> C>,
}

impl<C> Clone for CallHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CallHandle<C> {}

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct CallBatch {
    id: u64,
    calls: Vec<IMulticall::Call>,
    signatures: Vec<&'static str>,
}

impl Default for CallBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CallBatch {
    pub fn new() -> Self {
        Self {
            id: NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed),
            calls: Vec::new(),
            signatures: Vec::new(),
        }
    }

    pub fn add<C: SolCall>(&mut self, target: Address, call: &C) -> CallHandle<C> {
        let index = self.calls.len();
        self.calls.push(IMulticall::Call {
            target,
            callData: Bytes::from(call.abi_encode()),
        });
        self.signatures.push(C::SIGNATURE);
        CallHandle {
            batch: self.id,
            index,
            _call: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[derive(Debug)]
pub struct BatchResults {
    batch: u64,
    block_number: U256,
    return_data: Vec<Bytes>,
    signatures: Vec<&'static str>,
}

impl BatchResults {
    pub fn block_number(&self) -> U256 {
        self.block_number
    }

    pub fn len(&self) -> usize {
        self.return_data.len()
    }

    pub fn decode<C: SolCall>(&self, handle: CallHandle<C>) -> MulticallResult<C::Return> {
        let index = handle.index;
        let (Some(raw), Some(&signature)) =
            (self.return_data.get(index), self.signatures.get(index))
        else {
            return Err(MulticallError::LengthMismatch {
                expected: index + 1,
                actual: self.return_data.len(),
            });
        };
        if signature != C::SIGNATURE {
            return Err(MulticallError::HandleMismatch {
                index,
                expected: C::SIGNATURE,
                actual: signature,
            });
        }
        if handle.batch != self.batch {
            return Err(MulticallError::ForeignHandle {
                index,
                handle_batch: handle.batch,
                results_batch: self.batch,
            });
        }
        C::abi_decode_returns(raw).map_err(|source| MulticallError::Decode {
            index,
            signature,
            source,
        })
    }
}

#[derive(Clone)]
pub struct Multicall {
    provider: Arc<dyn Provider>,
    address: Address,
}

impl Multicall {
    pub fn new(provider: Arc<dyn Provider>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// 提交整个批次；聚合调用失败时整体失败，不做部分重试。
    pub async fn execute(&self, batch: CallBatch) -> MulticallResult<BatchResults> {
        if batch.is_empty() {
            return Ok(BatchResults {
                batch: batch.id,
                block_number: U256::ZERO,
                return_data: Vec::new(),
                signatures: Vec::new(),
            });
        }

        let expected = batch.len();
        let CallBatch {
            id,
            calls,
            signatures,
        } = batch;
        let calldata = IMulticall::aggregateCall { calls }.abi_encode();
        let request = TransactionRequest::call(self.address, calldata);

        let started = Instant::now();
        let raw = match self.provider.call(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                events::multicall_batch(expected, started.elapsed(), false);
                return Err(err.into());
            }
        };

        let decoded = IMulticall::aggregateCall::abi_decode_returns(&raw)
            .map_err(MulticallError::Aggregate)?;
        events::multicall_batch(expected, started.elapsed(), true);

        if decoded.returnData.len() != expected {
            return Err(MulticallError::LengthMismatch {
                expected,
                actual: decoded.returnData.len(),
            });
        }

        debug!(
            target: "multicall",
            multicall = %self.address,
            block = %decoded.blockNumber,
            size = expected,
            "aggregate call decoded"
        );

        Ok(BatchResults {
            batch: id,
            block_number: decoded.blockNumber,
            return_data: decoded.returnData,
            signatures,
        })
    }

    /// 同一函数作用于多个合约地址的批量调用。
    #[allow(dead_code)]
    pub async fn aggregate_calls<C: SolCall>(
        &self,
        calls: &[(Address, C)],
    ) -> MulticallResult<Vec<C::Return>> {
        let mut batch = CallBatch::new();
        let handles: Vec<CallHandle<C>> = calls
            .iter()
            .map(|(target, call)| batch.add(*target, call))
            .collect();
        let results = self.execute(batch).await?;
        handles
            .into_iter()
            .map(|handle| results.decode(handle))
            .collect()
    }
}
