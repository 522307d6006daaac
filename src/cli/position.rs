use anyhow::{Result, anyhow};
use tracing::debug;

use crate::cli::args::PairArgs;
use crate::cli::context::{build_app_context, build_multicall, build_pool_locator};
use crate::config::LpburnConfig;
use crate::liquidity::burn::LIQUIDITY_DECIMALS;
use crate::liquidity::{PoolSnapshot, load_pool};
use crate::liquidity::math::format_significant;

const DISPLAY_DIGITS: u32 = 6;

pub async fn handle_position(config: &LpburnConfig, args: PairArgs) -> Result<()> {
    let ctx = build_app_context(config).await?;
    let account = ctx
        .account
        .ok_or_else(|| anyhow!("没有可用账户：请配置 global.account 或 LPBURN_ACCOUNT"))?;
    let multicall = build_multicall(config, &ctx)?;
    let locator = build_pool_locator(config)?;
    debug!(
        target: "cli",
        multicall = %multicall.address(),
        factory = %locator.factory,
        "查询头寸"
    );

    let snapshot = load_pool(&multicall, &locator, args.token_a, args.token_b, account).await?;
    for line in render_position(&snapshot) {
        println!("{line}");
    }
    Ok(())
}

fn render_position(snapshot: &PoolSnapshot) -> Vec<String> {
    let symbol_a = snapshot.currency_a.symbol();
    let symbol_b = snapshot.currency_b.symbol();
    let decimals_a = snapshot.currency_a.decimals();
    let decimals_b = snapshot.currency_b.decimals();

    let mut lines = vec![
        format!("交易对 {symbol_a}/{symbol_b}: {}", snapshot.pair),
        format!(
            "储备: {} {symbol_a} / {} {symbol_b}",
            format_significant(snapshot.reserve_a, decimals_a, DISPLAY_DIGITS),
            format_significant(snapshot.reserve_b, decimals_b, DISPLAY_DIGITS),
        ),
        format!(
            "LP 总量: {} {}",
            format_significant(snapshot.total_supply, LIQUIDITY_DECIMALS, DISPLAY_DIGITS),
            snapshot.lp_symbol
        ),
        format!(
            "持有 LP: {} {}",
            format_significant(snapshot.user_liquidity, LIQUIDITY_DECIMALS, DISPLAY_DIGITS),
            snapshot.lp_symbol
        ),
    ];
    for (currency, token) in [
        (&snapshot.currency_a, &snapshot.token_a),
        (&snapshot.currency_b, &snapshot.token_b),
    ] {
        if currency.is_native() {
            let wrapped = currency.wrapped(token);
            lines.push(format!(
                "{} 以 {} ({}) 结算",
                currency.symbol(),
                wrapped.symbol,
                wrapped.address
            ));
        }
    }

    if let (Some((amount_a, amount_b)), Some(share_bps)) =
        (snapshot.position(), snapshot.pool_share_bps())
    {
        lines.push(format!(
            "可取回: {} {symbol_a} + {} {symbol_b}",
            format_significant(amount_a, decimals_a, DISPLAY_DIGITS),
            format_significant(amount_b, decimals_b, DISPLAY_DIGITS),
        ));
        lines.push(format!(
            "池子份额: {}%",
            format_significant(share_bps, 2, DISPLAY_DIGITS)
        ));
    } else {
        lines.push("交易对尚无流动性".to_string());
    }
    lines
}
