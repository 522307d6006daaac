use std::str::FromStr;

use alloy_primitives::U256;
use alloy_primitives::utils::{format_units, parse_units};
use rust_decimal::Decimal;

pub const BIPS_BASE: u64 = 10_000;

/// `floor(amount * numerator / BIPS_BASE)`，numerator 不超过 BIPS_BASE 时不会溢出。
fn scale_bips(amount: U256, numerator: u64) -> U256 {
    let base = U256::from(BIPS_BASE);
    let numerator = U256::from(numerator);
    let quotient = amount / base;
    let remainder = amount % base;
    quotient
        .saturating_mul(numerator)
        .saturating_add(remainder * numerator / base)
}

/// 返回 `(最小可接受数量, 最大可接受数量)`。
pub fn calculate_slippage_amount(amount: U256, slippage_bps: u16) -> (U256, U256) {
    let slippage = u64::from(slippage_bps).min(BIPS_BASE);
    (
        scale_bips(amount, BIPS_BASE - slippage),
        scale_bips(amount, BIPS_BASE + slippage),
    )
}

pub fn min_amount_out(amount: U256, slippage_bps: u16) -> U256 {
    calculate_slippage_amount(amount, slippage_bps).0
}

/// 在 gas 估算值上加安全余量。
pub fn calculate_gas_margin(estimate: U256, margin_bps: u32) -> U256 {
    scale_bips(estimate, BIPS_BASE + u64::from(margin_bps))
}

pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    a.checked_mul(b)?.checked_div(denominator)
}

/// 份额对应的储备数量：`liquidity * reserve / total_supply`。
pub fn liquidity_value(liquidity: U256, reserve: U256, total_supply: U256) -> Option<U256> {
    mul_div(liquidity, reserve, total_supply)
}

pub fn parse_amount(value: &str, decimals: u8) -> Option<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    parse_units(trimmed, decimals)
        .ok()
        .map(|parsed| parsed.get_absolute())
}

/// 按有效数字格式化链上数量，用于交易摘要。
pub fn format_significant(amount: U256, decimals: u8, digits: u32) -> String {
    let Ok(formatted) = format_units(amount, decimals) else {
        return amount.to_string();
    };
    let trimmed = trim_fraction(&formatted);
    match Decimal::from_str(trimmed)
        .ok()
        .and_then(|value| value.round_sf(digits))
    {
        Some(rounded) => rounded.normalize().to_string(),
        None => trimmed.to_string(),
    }
}

fn trim_fraction(value: &str) -> &str {
    if value.contains('.') {
        value.trim_end_matches('0').trim_end_matches('.')
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_bps_of_one_thousand_is_nine_hundred_ninety_five() {
        assert_eq!(min_amount_out(U256::from(1_000u64), 50), U256::from(995u64));
        let (min, max) = calculate_slippage_amount(U256::from(1_000u64), 50);
        assert_eq!(min, U256::from(995u64));
        assert_eq!(max, U256::from(1_005u64));
    }

    #[test]
    fn min_amount_matches_truncated_formula_for_every_slippage() {
        let amounts = [
            U256::from(1u64),
            U256::from(999u64),
            U256::from(1_000u64),
            U256::from(123_456_789u64),
            U256::from(10u64).pow(U256::from(24u64)) + U256::from(7u64),
        ];
        for amount in amounts {
            for slippage in (0u16..10_000).step_by(7).chain([9_999]) {
                let expected = amount * U256::from(BIPS_BASE - u64::from(slippage))
                    / U256::from(BIPS_BASE);
                let min = min_amount_out(amount, slippage);
                assert_eq!(min, expected, "amount={amount} slippage={slippage}");
                assert!(min <= amount);
                if slippage == 0 {
                    assert_eq!(min, amount);
                } else {
                    assert!(min < amount);
                }
            }
        }
    }

    #[test]
    fn nonzero_slippage_strictly_lowers_large_amounts() {
        let amount = U256::MAX;
        assert_eq!(min_amount_out(amount, 0), amount);
        assert!(min_amount_out(amount, 1) < amount);
    }

    #[test]
    fn gas_margin_adds_twenty_percent() {
        assert_eq!(
            calculate_gas_margin(U256::from(100_000u64), 2_000),
            U256::from(120_000u64)
        );
        assert_eq!(calculate_gas_margin(U256::from(7u64), 2_000), U256::from(8u64));
    }

    #[test]
    fn liquidity_value_is_proportional_share() {
        let value = liquidity_value(
            U256::from(250u64),
            U256::from(4_000u64),
            U256::from(1_000u64),
        );
        assert_eq!(value, Some(U256::from(1_000u64)));
        assert_eq!(
            liquidity_value(U256::from(1u64), U256::from(1u64), U256::ZERO),
            None
        );
    }

    #[test]
    fn parse_amount_handles_decimals() {
        assert_eq!(
            parse_amount("1.5", 18),
            Some(U256::from(1_500_000_000_000_000_000u64))
        );
        assert_eq!(parse_amount("42", 0), Some(U256::from(42u64)));
        assert_eq!(parse_amount("", 18), None);
        assert_eq!(parse_amount("abc", 18), None);
        assert_eq!(parse_amount("-1", 18), None);
    }

    #[test]
    fn format_significant_rounds_to_requested_digits() {
        let amount = U256::from(1_234_567_000_000_000_000u64);
        assert_eq!(format_significant(amount, 18, 3), "1.23");
        assert_eq!(format_significant(U256::from(995u64), 0, 3), "995");
        assert_eq!(format_significant(U256::from(120_000u64), 6, 3), "0.12");
    }
}
