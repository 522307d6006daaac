use anyhow::{Result, anyhow, bail};
use tracing::info;

use crate::cli::args::RemoveCmd;
use crate::cli::context::{
    build_app_context, build_multicall, build_pool_locator, build_removal_settings,
};
use crate::config::LpburnConfig;
use crate::liquidity::{
    ApprovalState, AuthorizationOutcome, RemovalSession, load_pool,
};
use crate::transactions::TransactionKind;

pub async fn handle_remove(config: &LpburnConfig, cmd: RemoveCmd) -> Result<()> {
    let ctx = build_app_context(config).await?;
    let account = ctx
        .account
        .ok_or_else(|| anyhow!("没有可用账户：请配置 global.account 或 LPBURN_ACCOUNT"))?;
    let multicall = build_multicall(config, &ctx)?;
    let locator = build_pool_locator(config)?;

    let mut settings = build_removal_settings(config)?;
    if let Some(slippage_bps) = cmd.slippage_bps {
        if slippage_bps >= 10_000 {
            bail!("--slippage-bps 必须小于 10000");
        }
        settings.slippage_bps = slippage_bps;
    }
    if let Some(deadline_secs) = cmd.deadline_secs {
        settings.deadline_secs = deadline_secs;
    }
    if cmd.no_permit || cmd.approve_only {
        settings.prefer_permit = false;
    }

    let pool = load_pool(
        &multicall,
        &locator,
        cmd.pair.token_a,
        cmd.pair.token_b,
        account,
    )
    .await?;
    let transactions = ctx.transactions.clone();
    let mut session = RemovalSession::new(ctx, settings, pool);

    let Some((field, value)) = cmd.burn_input() else {
        bail!("需要 --percent、--liquidity、--amount-a 或 --amount-b 之一");
    };
    session.on_user_input(field, value);

    let amounts = session.burn_amounts()?;
    let intent = session.intent()?;
    println!("{}", session.summary(&amounts));
    info!(
        target: "cli",
        pair = %session.pool().pair,
        liquidity = %intent.liquidity,
        percent_bps = intent.percent_bps,
        slippage_bps = intent.slippage_bps,
        deadline_secs = intent.deadline_offset_secs,
        "移除意图已生成"
    );

    session.refresh_approval().await?;
    if !session.can_submit() {
        match session.attempt_to_approve().await? {
            AuthorizationOutcome::AlreadyApproved => {}
            AuthorizationOutcome::Signed => {
                if let Some(signature) = session.signature() {
                    println!("已获得 permit 签名，截止时间 {}", signature.deadline);
                }
            }
            AuthorizationOutcome::ApprovalSubmitted(hash) => {
                println!("授权交易已提交 {hash}，等待确认...");
                let state = session.wait_for_approval().await?;
                if state != ApprovalState::Approved {
                    bail!("授权交易未成功，当前状态 {state:?}");
                }
                println!("授权已确认");
            }
            AuthorizationOutcome::Rejected => bail!("用户取消了签名"),
        }
    }

    if cmd.approve_only {
        println!("授权状态: {:?}", session.approval_state());
        return Ok(());
    }

    match session.remove().await {
        Ok(_) => {
            if let Some(record) = session.tx_hash().and_then(|hash| transactions.get(&hash)) {
                println!("移除交易已提交 {}: {}", record.hash, record.summary);
            }
            for record in transactions.pending(TransactionKind::Approval) {
                let waited = record.submitted_at.elapsed().unwrap_or_default().as_secs();
                println!(
                    "  仍未确认的 [{}] {} {}（已等待 {waited}s）",
                    record.kind.as_str(),
                    record.hash,
                    record.summary
                );
            }
            info!(
                target: "cli",
                recorded = transactions.records().len(),
                "本次会话交易记录"
            );
            Ok(())
        }
        Err(err) => {
            let message = session
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            session.dismiss();
            Err(anyhow!(err).context(message))
        }
    }
}
