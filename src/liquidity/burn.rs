use alloy_primitives::{Address, U256};
use thiserror::Error;

use super::currency::{Currency, Token};
use super::math::{BIPS_BASE, liquidity_value, mul_div, parse_amount};

/// LP 代币精度。
pub const LIQUIDITY_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnField {
    LiquidityPercent,
    Liquidity,
    CurrencyA,
    CurrencyB,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BurnError {
    #[error("请输入数量")]
    EnterAmount,
    #[error("输入无效: {0}")]
    InvalidInput(String),
    #[error("LP 余额不足")]
    InsufficientBalance,
    #[error("交易对没有流动性")]
    NoLiquidity,
}

/// 交易对在某一时刻的状态，储备已按 A/B 顺序排列。
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    pub pair: Address,
    pub lp_symbol: String,
    pub currency_a: Currency,
    pub currency_b: Currency,
    pub token_a: Token,
    pub token_b: Token,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total_supply: U256,
    pub user_liquidity: U256,
}

impl PoolSnapshot {
    /// 用户全部 LP 对应的两侧数量。
    pub fn position(&self) -> Option<(U256, U256)> {
        Some((
            liquidity_value(self.user_liquidity, self.reserve_a, self.total_supply)?,
            liquidity_value(self.user_liquidity, self.reserve_b, self.total_supply)?,
        ))
    }

    pub fn pool_share_bps(&self) -> Option<U256> {
        mul_div(self.user_liquidity, U256::from(BIPS_BASE), self.total_supply)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnAmounts {
    /// 移除比例，单位为基点（10000 = 100%）。
    pub percent_bps: u32,
    pub liquidity: U256,
    pub amount_a: U256,
    pub amount_b: U256,
}

/// 一次移除流动性的意图，每次重新评估时由输入与最新储备推导，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalIntent {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub percent_bps: u32,
    pub amount_a: U256,
    pub amount_b: U256,
    pub slippage_bps: u16,
    pub deadline_offset_secs: u64,
}

impl RemovalIntent {
    pub fn new(
        snapshot: &PoolSnapshot,
        amounts: &BurnAmounts,
        slippage_bps: u16,
        deadline_offset_secs: u64,
    ) -> Self {
        Self {
            token_a: snapshot.token_a.address,
            token_b: snapshot.token_b.address,
            liquidity: amounts.liquidity,
            percent_bps: amounts.percent_bps,
            amount_a: amounts.amount_a,
            amount_b: amounts.amount_b,
            slippage_bps,
            deadline_offset_secs,
        }
    }
}

/// 根据用户输入推导本次移除的 LP 数量与两侧预期到账数量。
pub fn derive_burn(
    snapshot: &PoolSnapshot,
    field: BurnField,
    typed: &str,
) -> Result<BurnAmounts, BurnError> {
    if snapshot.total_supply.is_zero() {
        return Err(BurnError::NoLiquidity);
    }
    if typed.trim().is_empty() {
        return Err(BurnError::EnterAmount);
    }

    let liquidity = match field {
        BurnField::LiquidityPercent => {
            let percent: u32 = typed
                .trim()
                .parse()
                .map_err(|_| BurnError::InvalidInput(typed.to_string()))?;
            if percent > 100 {
                return Err(BurnError::InvalidInput(typed.to_string()));
            }
            mul_div(
                snapshot.user_liquidity,
                U256::from(percent),
                U256::from(100u8),
            )
            .ok_or(BurnError::NoLiquidity)?
        }
        BurnField::Liquidity => parse_amount(typed, LIQUIDITY_DECIMALS)
            .ok_or_else(|| BurnError::InvalidInput(typed.to_string()))?,
        BurnField::CurrencyA => {
            let amount = parse_amount(typed, snapshot.currency_a.decimals())
                .ok_or_else(|| BurnError::InvalidInput(typed.to_string()))?;
            mul_div(amount, snapshot.total_supply, snapshot.reserve_a)
                .ok_or(BurnError::NoLiquidity)?
        }
        BurnField::CurrencyB => {
            let amount = parse_amount(typed, snapshot.currency_b.decimals())
                .ok_or_else(|| BurnError::InvalidInput(typed.to_string()))?;
            mul_div(amount, snapshot.total_supply, snapshot.reserve_b)
                .ok_or(BurnError::NoLiquidity)?
        }
    };

    if liquidity.is_zero() {
        return Err(BurnError::EnterAmount);
    }
    if liquidity > snapshot.user_liquidity {
        return Err(BurnError::InsufficientBalance);
    }

    let percent_bps = mul_div(liquidity, U256::from(BIPS_BASE), snapshot.user_liquidity)
        .map(|value| value.saturating_to::<u32>())
        .ok_or(BurnError::InsufficientBalance)?;
    let amount_a = liquidity_value(liquidity, snapshot.reserve_a, snapshot.total_supply)
        .ok_or(BurnError::NoLiquidity)?;
    let amount_b = liquidity_value(liquidity, snapshot.reserve_b, snapshot.total_supply)
        .ok_or(BurnError::NoLiquidity)?;

    Ok(BurnAmounts {
        percent_bps,
        liquidity,
        amount_a,
        amount_b,
    })
}
