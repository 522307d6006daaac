//! 移除流动性的授权与提交流程。
//!
//! 授权优先走链上 allowance；没有授权时可以先请求 permit 签名，签名失败（用户主动取消除外）
//! 自动退回链上授权。提交前并发估算全部候选方法的 gas，按候选顺序选第一个估算成功的方法。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, U256};
use futures::future::join_all;
use tracing::{info, warn};

use super::approval::{ApprovalState, ApprovalTracker, ConfirmationPolicy};
use super::burn::{BurnAmounts, BurnError, BurnField, PoolSnapshot, RemovalIntent, derive_burn};
use super::error::{RemovalError, RemovalResult};
use super::math::{calculate_gas_margin, format_significant, min_amount_out};
use super::method::{
    AuthorizationKind, CurrencyShape, RemovalArgs, RemovalCall, candidate_methods,
};
use super::permit::{PermitError, PermitRequest, PermitSignature, fetch_nonce, sign_permit};
use crate::context::AppContext;
use crate::monitoring::events;
use crate::rpc::TransactionRequest;
use crate::transactions::TransactionKind;

const SUMMARY_DIGITS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RemovalSettings {
    pub router: Address,
    pub slippage_bps: u16,
    pub deadline_secs: u64,
    pub gas_margin_bps: u32,
    pub prefer_permit: bool,
    /// permit 域名中的 `name`，需与 LP 合约一致。
    pub lp_token_name: String,
    pub user_rejection_codes: Vec<i64>,
    pub confirmation: ConfirmationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    AlreadyApproved,
    Signed,
    ApprovalSubmitted(B256),
    /// 用户在钱包中取消了签名，不再回退到链上授权。
    Rejected,
}

pub struct RemovalSession {
    ctx: AppContext,
    settings: RemovalSettings,
    pool: PoolSnapshot,
    approval: Option<ApprovalTracker>,
    field: BurnField,
    typed_value: String,
    signature: Option<PermitSignature>,
    attempting: bool,
    tx_hash: Option<B256>,
    error_message: Option<String>,
}

impl RemovalSession {
    pub fn new(ctx: AppContext, settings: RemovalSettings, pool: PoolSnapshot) -> Self {
        let approval = ctx.account.map(|owner| {
            ApprovalTracker::new(
                ctx.clone(),
                pool.pair,
                pool.lp_symbol.clone(),
                owner,
                settings.router,
                settings.gas_margin_bps,
            )
        });
        let mut session = Self {
            ctx,
            settings,
            pool,
            approval,
            field: BurnField::LiquidityPercent,
            typed_value: "0".to_string(),
            signature: None,
            attempting: false,
            tx_hash: None,
            error_message: None,
        };
        session.sync_approval_amount();
        session
    }

    pub fn pool(&self) -> &PoolSnapshot {
        &self.pool
    }

    /// 任何输入变化都会作废已有的 permit 签名。
    pub fn on_user_input(&mut self, field: BurnField, value: impl Into<String>) {
        self.signature = None;
        self.field = field;
        self.typed_value = value.into();
        self.sync_approval_amount();
    }

    pub fn dismiss(&mut self) {
        self.signature = None;
        self.error_message = None;
        if self.tx_hash.take().is_some() {
            self.on_user_input(BurnField::LiquidityPercent, "0");
        }
    }

    pub fn burn_amounts(&self) -> Result<BurnAmounts, BurnError> {
        derive_burn(&self.pool, self.field, &self.typed_value)
    }

    pub fn intent(&self) -> Result<RemovalIntent, BurnError> {
        let amounts = self.burn_amounts()?;
        Ok(RemovalIntent::new(
            &self.pool,
            &amounts,
            self.settings.slippage_bps,
            self.settings.deadline_secs,
        ))
    }

    pub fn approval_state(&self) -> ApprovalState {
        self.approval
            .as_ref()
            .map_or(ApprovalState::Unknown, ApprovalTracker::state)
    }

    pub fn signature(&self) -> Option<&PermitSignature> {
        self.signature.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        self.approval_state() == ApprovalState::Approved || self.signature.is_some()
    }

    pub fn tx_hash(&self) -> Option<B256> {
        self.tx_hash
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub async fn refresh_approval(&mut self) -> RemovalResult<ApprovalState> {
        let tracker = self
            .approval
            .as_mut()
            .ok_or(RemovalError::MissingDependency("account"))?;
        Ok(tracker.refresh().await?)
    }

    pub async fn wait_for_approval(&mut self) -> RemovalResult<ApprovalState> {
        let policy = self.settings.confirmation;
        let tracker = self
            .approval
            .as_mut()
            .ok_or(RemovalError::MissingDependency("account"))?;
        Ok(tracker.wait_for_confirmation(policy).await?)
    }

    /// 获取授权：优先请求 permit 签名，失败时回退到链上 approve。
    pub async fn attempt_to_approve(&mut self) -> RemovalResult<AuthorizationOutcome> {
        let account = self
            .ctx
            .account
            .ok_or(RemovalError::MissingDependency("account"))?;
        let liquidity = self.liquidity_to_remove()?;
        if self.approval_state() == ApprovalState::Approved {
            return Ok(AuthorizationOutcome::AlreadyApproved);
        }

        if self.settings.prefer_permit {
            match self.request_permit(account, liquidity).await {
                Ok(signature) => {
                    events::permit_outcome(&account, "signed");
                    self.signature = Some(signature);
                    return Ok(AuthorizationOutcome::Signed);
                }
                Err(err) if err.is_user_rejection(&self.settings.user_rejection_codes) => {
                    events::permit_outcome(&account, "rejected");
                    info!(
                        target: "liquidity::orchestrator",
                        error = %err,
                        "用户取消了 permit 签名"
                    );
                    return Ok(AuthorizationOutcome::Rejected);
                }
                Err(err) => {
                    events::permit_outcome(&account, "fallback");
                    warn!(
                        target: "liquidity::orchestrator",
                        error = %err,
                        "permit 签名失败，回退到链上授权"
                    );
                }
            }
        }

        let tracker = self
            .approval
            .as_mut()
            .ok_or(RemovalError::MissingDependency("account"))?;
        if tracker.state() == ApprovalState::Unknown {
            tracker.refresh().await?;
        }
        if tracker.state() == ApprovalState::Approved {
            return Ok(AuthorizationOutcome::AlreadyApproved);
        }
        let hash = tracker.approve().await?;
        Ok(AuthorizationOutcome::ApprovalSubmitted(hash))
    }

    /// 构造候选方法、并发估算 gas、提交第一个可行的方法。不做自动重试。
    pub async fn remove(&mut self) -> RemovalResult<B256> {
        let account = self
            .ctx
            .account
            .ok_or(RemovalError::MissingDependency("account"))?;
        let amounts = self.burn_amounts().map_err(missing_amount)?;
        if amounts.amount_a.is_zero() || amounts.amount_b.is_zero() {
            return Err(RemovalError::MissingDependency("currency amounts"));
        }

        let authorization = if self.approval_state() == ApprovalState::Approved {
            AuthorizationKind::Approved
        } else if self.signature.is_some() {
            AuthorizationKind::Permit
        } else {
            return Err(RemovalError::Unauthorized);
        };
        let permit = match authorization {
            AuthorizationKind::Permit => self.signature.as_ref(),
            AuthorizationKind::Approved => None,
        };

        let shape = CurrencyShape::of(&self.pool.currency_a, &self.pool.currency_b);
        let args = RemovalArgs {
            shape,
            token_a: self.pool.token_a.address,
            token_b: self.pool.token_b.address,
            liquidity: amounts.liquidity,
            amount_a_min: min_amount_out(amounts.amount_a, self.settings.slippage_bps),
            amount_b_min: min_amount_out(amounts.amount_b, self.settings.slippage_bps),
            to: account,
            deadline: U256::from(deadline_from_now(self.settings.deadline_secs)),
        };
        let calls = candidate_methods(authorization, shape)
            .iter()
            .map(|kind| RemovalCall::build(*kind, &args, permit))
            .collect::<RemovalResult<Vec<_>>>()?;

        let router = self.settings.router;
        let gas_margin_bps = self.settings.gas_margin_bps;
        let provider = &*self.ctx.provider;
        let estimates = join_all(calls.iter().enumerate().map(|(index, call)| {
            let request = TransactionRequest::call(router, call.calldata()).with_from(account);
            let method = call.kind().name();
            async move {
                match provider.estimate_gas(&request).await {
                    Ok(estimate) => {
                        let gas_limit = calculate_gas_margin(estimate, gas_margin_bps);
                        events::gas_estimate_succeeded(index, method, gas_limit);
                        Some(gas_limit)
                    }
                    Err(err) => {
                        events::gas_estimate_failed(index, method, &err.to_string());
                        None
                    }
                }
            }
        }))
        .await;

        let candidates = calls.len();
        let Some((call, gas_limit)) = calls
            .into_iter()
            .zip(estimates)
            .find_map(|(call, gas_limit)| gas_limit.map(|gas_limit| (call, gas_limit)))
        else {
            events::removal_would_fail(candidates);
            return Err(RemovalError::WouldFail);
        };

        let method = call.kind().name();
        let request = TransactionRequest::call(router, call.calldata())
            .with_from(account)
            .with_gas(gas_limit);

        let attempt = AttemptGuard::start(&mut self.attempting);
        let submitted = provider.send_transaction(&request).await;
        drop(attempt);

        match submitted {
            Ok(hash) => {
                events::removal_submitted(method, &hash, gas_limit);
                self.error_message = None;
                self.ctx
                    .transactions
                    .add(hash, TransactionKind::Removal, self.summary(&amounts));
                self.tx_hash = Some(hash);
                Ok(hash)
            }
            Err(err) => {
                let message = err.user_message();
                events::removal_rejected(method, &message);
                self.error_message = Some(message.clone());
                Err(RemovalError::Submission(message))
            }
        }
    }

    pub fn summary(&self, amounts: &BurnAmounts) -> String {
        format!(
            "Remove {} {} and {} {}",
            format_significant(
                amounts.amount_a,
                self.pool.currency_a.decimals(),
                SUMMARY_DIGITS
            ),
            self.pool.currency_a.symbol(),
            format_significant(
                amounts.amount_b,
                self.pool.currency_b.decimals(),
                SUMMARY_DIGITS
            ),
            self.pool.currency_b.symbol(),
        )
    }

    async fn request_permit(
        &self,
        owner: Address,
        liquidity: U256,
    ) -> Result<PermitSignature, PermitError> {
        let provider = &*self.ctx.provider;
        let nonce = fetch_nonce(provider, self.pool.pair, owner).await?;
        let request = PermitRequest {
            token_name: self.settings.lp_token_name.clone(),
            chain_id: self.ctx.chain_id,
            pair: self.pool.pair,
            owner,
            spender: self.settings.router,
            value: liquidity,
            nonce,
            deadline: deadline_from_now(self.settings.deadline_secs),
        };
        sign_permit(provider, &request).await
    }

    fn liquidity_to_remove(&self) -> RemovalResult<U256> {
        Ok(self.burn_amounts().map_err(missing_amount)?.liquidity)
    }

    fn sync_approval_amount(&mut self) {
        let liquidity = self.burn_amounts().ok().map(|amounts| amounts.liquidity);
        if let Some(tracker) = self.approval.as_mut() {
            tracker.set_amount(liquidity);
        }
    }
}

/// 提交期间置位 `attempting`；future 在 await 中被丢弃时同样复位。
struct AttemptGuard<'a>(&'a mut bool);

impl<'a> AttemptGuard<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn missing_amount(err: BurnError) -> RemovalError {
    match err {
        BurnError::EnterAmount => RemovalError::MissingDependency("liquidity amount"),
        other => RemovalError::Burn(other),
    }
}

/// `ceil(now) + offset`，单位秒。
fn deadline_from_now(offset_secs: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let secs = if now.subsec_nanos() > 0 {
        now.as_secs() + 1
    } else {
        now.as_secs()
    };
    secs.saturating_add(offset_secs)
}
