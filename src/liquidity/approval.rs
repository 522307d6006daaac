//! LP 代币对路由合约的链上授权状态。

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use thiserror::Error;
use tracing::{debug, warn};

use super::math::calculate_gas_margin;
use crate::context::AppContext;
use crate::contracts::IDefinixPair;
use crate::monitoring::events;
use crate::rpc::{RpcError, TransactionRequest};
use crate::transactions::{TransactionKind, TransactionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Unknown,
    NotApproved,
    Pending,
    Approved,
}

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("当前授权状态为 {0:?}，无需发起授权")]
    InvalidState(ApprovalState),
    #[error("缺少依赖: {0}")]
    MissingDependency(&'static str),
    #[error("读取授权额度失败: {0}")]
    Allowance(#[source] RpcError),
    #[error("授权额度解码失败: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error("授权 gas 估算失败: {0}")]
    Estimate(#[source] RpcError),
    #[error("授权交易提交失败: {0}")]
    Submission(#[source] RpcError),
    #[error("查询授权回执失败: {0}")]
    Receipt(#[source] RpcError),
    #[error("授权交易 {hash} 在 {attempts} 次查询后仍未确认")]
    Timeout { hash: B256, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

/// 跟踪某个 (owner, spender) 的 LP 授权额度与待确认的授权交易。
#[derive(Clone)]
pub struct ApprovalTracker {
    ctx: AppContext,
    token: Address,
    symbol: String,
    owner: Address,
    spender: Address,
    gas_margin_bps: u32,
    amount: Option<U256>,
    allowance: Option<U256>,
    pending: Option<B256>,
    approved_value: Option<U256>,
}

impl ApprovalTracker {
    pub fn new(
        ctx: AppContext,
        token: Address,
        symbol: impl Into<String>,
        owner: Address,
        spender: Address,
        gas_margin_bps: u32,
    ) -> Self {
        Self {
            ctx,
            token,
            symbol: symbol.into(),
            owner,
            spender,
            gas_margin_bps,
            amount: None,
            allowance: None,
            pending: None,
            approved_value: None,
        }
    }

    pub fn set_amount(&mut self, amount: Option<U256>) {
        self.amount = amount;
    }

    pub fn state(&self) -> ApprovalState {
        let (Some(amount), Some(allowance)) = (self.amount, self.allowance) else {
            return ApprovalState::Unknown;
        };
        if allowance >= amount {
            ApprovalState::Approved
        } else if self.pending.is_some() {
            ApprovalState::Pending
        } else {
            ApprovalState::NotApproved
        }
    }

    /// 重新读取链上 allowance。
    pub async fn refresh(&mut self) -> Result<ApprovalState, ApprovalError> {
        let data = IDefinixPair::allowanceCall {
            owner: self.owner,
            spender: self.spender,
        }
        .abi_encode();
        let raw = self
            .ctx
            .provider
            .call(&TransactionRequest::call(self.token, data))
            .await
            .map_err(ApprovalError::Allowance)?;
        let allowance = IDefinixPair::allowanceCall::abi_decode_returns(&raw)?;
        debug!(
            target: "liquidity::approval",
            token = %self.token,
            owner = %self.owner,
            spender = %self.spender,
            allowance = %allowance,
            "allowance 已刷新"
        );
        self.allowance = Some(allowance);
        Ok(self.state())
    }

    /// 先尝试无限额授权，估算失败时退回精确数量。
    pub async fn approve(&mut self) -> Result<B256, ApprovalError> {
        let state = self.state();
        if state != ApprovalState::NotApproved {
            return Err(ApprovalError::InvalidState(state));
        }
        let amount = self
            .amount
            .ok_or(ApprovalError::MissingDependency("approval amount"))?;

        let provider = &self.ctx.provider;
        let (value, exact, gas) = match provider
            .estimate_gas(&self.approve_request(U256::MAX))
            .await
        {
            Ok(gas) => (U256::MAX, false, gas),
            Err(err) => {
                warn!(
                    target: "liquidity::approval",
                    token = %self.token,
                    error = %err,
                    "无限额授权估算失败，改用精确数量"
                );
                let gas = provider
                    .estimate_gas(&self.approve_request(amount))
                    .await
                    .map_err(ApprovalError::Estimate)?;
                (amount, true, gas)
            }
        };

        let request = self
            .approve_request(value)
            .with_gas(calculate_gas_margin(gas, self.gas_margin_bps));
        let hash = provider
            .send_transaction(&request)
            .await
            .map_err(ApprovalError::Submission)?;

        self.ctx.transactions.add(
            hash,
            TransactionKind::Approval,
            format!("Approve {}", self.symbol),
        );
        events::approval_submitted(&self.token, &self.spender, &hash, exact);
        self.pending = Some(hash);
        self.approved_value = Some(value);
        Ok(hash)
    }

    /// 轮询待确认的授权交易回执。成功后状态变为 `Approved`，回滚后回到 `NotApproved`。
    pub async fn wait_for_confirmation(
        &mut self,
        policy: ConfirmationPolicy,
    ) -> Result<ApprovalState, ApprovalError> {
        let Some(hash) = self.pending else {
            return Ok(self.state());
        };

        for attempt in 1..=policy.max_attempts {
            let receipt = self
                .ctx
                .provider
                .transaction_receipt(hash)
                .await
                .map_err(ApprovalError::Receipt)?;

            if let Some(receipt) = receipt {
                let success = receipt.succeeded();
                debug!(
                    target: "liquidity::approval",
                    hash = %receipt.transaction_hash,
                    block = ?receipt.block_number,
                    gas_used = ?receipt.gas_used,
                    "授权交易回执"
                );
                events::approval_confirmed(&hash, success, attempt);
                self.pending = None;
                if success {
                    self.ctx.transactions.mark(&hash, TransactionStatus::Confirmed);
                    self.allowance = self.approved_value.take().or(self.allowance);
                } else {
                    self.ctx.transactions.mark(&hash, TransactionStatus::Failed);
                    self.approved_value = None;
                }
                return Ok(self.state());
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.poll_interval).await;
            }
        }

        Err(ApprovalError::Timeout {
            hash,
            attempts: policy.max_attempts,
        })
    }

    fn approve_request(&self, value: U256) -> TransactionRequest {
        let data = IDefinixPair::approveCall {
            spender: self.spender,
            value,
        }
        .abi_encode();
        TransactionRequest::call(self.token, data).with_from(self.owner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rpc::mock::{GasScript, MockProvider};
    use alloy_sol_types::SolValue;

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn router() -> Address {
        Address::repeat_byte(0x02)
    }

    fn pair() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn policy() -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::ZERO,
            max_attempts: 3,
        }
    }

    fn allowance_provider(allowance: u64) -> MockProvider {
        MockProvider::new(1).with_call_handler(move |request| {
            let call = IDefinixPair::allowanceCall::abi_decode(&request.data)
                .map_err(RpcError::fatal)?;
            assert_eq!(call.spender, router());
            Ok(U256::from(allowance).abi_encode().into())
        })
    }

    fn tracker(provider: MockProvider) -> (Arc<MockProvider>, ApprovalTracker) {
        let provider = Arc::new(provider);
        let ctx = AppContext::new(provider.clone(), Some(owner()), 1);
        let tracker = ApprovalTracker::new(ctx, pair(), "DEFINIX-LP", owner(), router(), 2_000);
        (provider, tracker)
    }

    fn approve_value(request: &TransactionRequest) -> U256 {
        IDefinixPair::approveCall::abi_decode(&request.data)
            .expect("approve calldata")
            .value
    }

    #[tokio::test(flavor = "current_thread")]
    async fn state_follows_allowance_and_amount() {
        let (_, mut tracker) = tracker(allowance_provider(100));
        assert_eq!(tracker.state(), ApprovalState::Unknown);

        tracker.set_amount(Some(U256::from(50u64)));
        assert_eq!(tracker.refresh().await.unwrap(), ApprovalState::Approved);

        tracker.set_amount(Some(U256::from(500u64)));
        assert_eq!(tracker.state(), ApprovalState::NotApproved);

        tracker.set_amount(None);
        assert_eq!(tracker.state(), ApprovalState::Unknown);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn approve_prefers_max_allowance() {
        let (provider, mut tracker) = tracker(
            allowance_provider(0)
                .with_estimate(IDefinixPair::approveCall::SELECTOR, GasScript::Gas(50_000)),
        );
        tracker.set_amount(Some(U256::from(500u64)));
        tracker.refresh().await.unwrap();

        let hash = tracker.approve().await.unwrap();
        assert_eq!(tracker.state(), ApprovalState::Pending);

        let sent = provider.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(approve_value(&sent[0]), U256::MAX);
        assert_eq!(sent[0].gas, Some(U256::from(60_000u64)));
        assert_eq!(sent[0].from, Some(owner()));

        let record = tracker.ctx.transactions.get(&hash).unwrap();
        assert_eq!(record.summary, "Approve DEFINIX-LP");
        assert_eq!(record.kind, TransactionKind::Approval);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn approve_falls_back_to_exact_amount() {
        let (provider, mut tracker) = tracker(allowance_provider(0).with_estimate_handler(
            |request| {
                let value = approve_value(request);
                if value == U256::MAX {
                    Some(GasScript::Revert("max approval not allowed"))
                } else {
                    Some(GasScript::Gas(40_000))
                }
            },
        ));
        tracker.set_amount(Some(U256::from(500u64)));
        tracker.refresh().await.unwrap();

        tracker.approve().await.unwrap();
        assert_eq!(provider.estimated.lock().len(), 2);
        let sent = provider.sent.lock().clone();
        assert_eq!(approve_value(&sent[0]), U256::from(500u64));
        assert_eq!(sent[0].gas, Some(U256::from(48_000u64)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn approve_is_refused_unless_not_approved() {
        let (provider, mut tracker) = tracker(allowance_provider(1_000));
        tracker.set_amount(Some(U256::from(500u64)));
        tracker.refresh().await.unwrap();

        let err = tracker.approve().await.unwrap_err();
        assert!(matches!(
            err,
            ApprovalError::InvalidState(ApprovalState::Approved)
        ));
        assert!(provider.sent.lock().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn confirmation_moves_pending_to_approved() {
        let (_, mut tracker) = tracker(
            allowance_provider(0)
                .with_estimate(IDefinixPair::approveCall::SELECTOR, GasScript::Gas(50_000)),
        );
        tracker.set_amount(Some(U256::from(500u64)));
        tracker.refresh().await.unwrap();
        let hash = tracker.approve().await.unwrap();

        let state = tracker.wait_for_confirmation(policy()).await.unwrap();
        assert_eq!(state, ApprovalState::Approved);
        assert_eq!(tracker.pending, None);
        assert_eq!(
            tracker.ctx.transactions.get(&hash).unwrap().status,
            TransactionStatus::Confirmed
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reverted_approval_returns_to_not_approved() {
        let (_, mut tracker) = tracker(
            allowance_provider(0)
                .with_estimate(IDefinixPair::approveCall::SELECTOR, GasScript::Gas(50_000))
                .with_receipt_status(0),
        );
        tracker.set_amount(Some(U256::from(500u64)));
        tracker.refresh().await.unwrap();
        let hash = tracker.approve().await.unwrap();

        let state = tracker.wait_for_confirmation(policy()).await.unwrap();
        assert_eq!(state, ApprovalState::NotApproved);
        assert_eq!(
            tracker.ctx.transactions.get(&hash).unwrap().status,
            TransactionStatus::Failed
        );
    }
}
