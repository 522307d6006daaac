use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use time::{UtcOffset, macros::format_description};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use crate::config::{ConfigError, LoggingProfile, LpburnConfig, load_config, required};
use crate::context::AppContext;
use crate::liquidity::{ConfirmationPolicy, PoolLocator, RemovalSettings};
use crate::multicall::Multicall;
use crate::rpc::{HttpProvider, Provider};

/// 初始化 tracing，兼顾 JSON 与文本输出模式。
pub fn init_tracing(config: &crate::config::LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if matches!(config.profile, LoggingProfile::Lean) {
        const QUIET_TARGETS: &[(&str, &str)] = &[
            ("hyper", "warn"),
            ("hyper_util::client::legacy", "warn"),
            ("reqwest", "info"),
            ("rpc", "info"),
        ];
        for (module, level) in QUIET_TARGETS {
            if !config.level.contains(module) {
                if let Ok(directive) = format!("{module}={level}").parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
    }

    if matches!(config.profile, LoggingProfile::Verbose) {
        const VERBOSE_TARGETS: &[(&str, &str)] = &[
            ("multicall", "debug"),
            ("liquidity::pool", "debug"),
            ("liquidity::permit", "debug"),
            ("liquidity::approval", "debug"),
            ("monitoring::multicall", "info"),
        ];
        for (module, level) in VERBOSE_TARGETS {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    let offset_timer = OffsetTime::new(offset, time_format);

    let base = fmt()
        .with_timer(offset_timer)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true);

    if config.json {
        base.json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        base.with_env_filter(filter)
            .event_format(fmt::format().compact())
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

/// 加载主配置；用于 `lpburn --config` 的入口。
pub fn load_configuration(path: Option<PathBuf>) -> Result<LpburnConfig, ConfigError> {
    load_config(path)
}

pub fn init_configs(args: crate::cli::args::InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;

    let target_path = output_dir.join("lpburn.toml");
    if target_path.exists() && !args.force {
        println!(
            "跳过 {}（文件已存在，如需覆盖请加 --force）",
            target_path.display()
        );
        return Ok(());
    }

    fs::write(
        &target_path,
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/lpburn.toml")),
    )?;
    println!("已写入 {}", target_path.display());
    Ok(())
}

/// 连接钱包侧节点，确定链 ID 与发送账户。
pub async fn build_app_context(config: &LpburnConfig) -> Result<AppContext> {
    let raw_url = config.global.rpc_url().ok_or_else(|| {
        anyhow!("未配置 RPC：请在 lpburn.toml 的 global.rpc_url 或环境变量 LPBURN_RPC_URL 中设置")
    })?;
    let url = Url::parse(raw_url).with_context(|| format!("RPC 地址无效 {raw_url}"))?;
    let provider = HttpProvider::new(&url, Duration::from_millis(config.global.request_timeout_ms))
        .context("创建 RPC 客户端失败")?;

    let chain_id = provider
        .chain_id()
        .await
        .context("读取 chainId 失败")?;
    let account = match config.global.account {
        Some(account) => Some(account),
        None => provider
            .accounts()
            .await
            .context("读取 eth_accounts 失败")?
            .into_iter()
            .next(),
    };

    match account {
        Some(account) => info!(
            target: "cli",
            rpc = %provider.url(),
            chain_id,
            account = %account,
            "已连接节点"
        ),
        None => warn!(
            target: "cli",
            rpc = %provider.url(),
            chain_id,
            "节点未返回任何账户，只能执行只读命令"
        ),
    }

    Ok(AppContext::new(Arc::new(provider), account, chain_id))
}

pub fn build_multicall(config: &LpburnConfig, ctx: &AppContext) -> Result<Multicall> {
    let address = required(config.contracts.multicall, "contracts.multicall")?;
    Ok(Multicall::new(ctx.provider.clone(), address))
}

pub fn build_pool_locator(config: &LpburnConfig) -> Result<PoolLocator> {
    let contracts = &config.contracts;
    Ok(PoolLocator {
        factory: required(contracts.factory, "contracts.factory")?,
        init_code_hash: required(contracts.init_code_hash, "contracts.init_code_hash")?,
        wrapped_native: required(contracts.wrapped_native, "contracts.wrapped_native")?,
        native_symbol: contracts.native_symbol.clone(),
    })
}

pub fn build_removal_settings(config: &LpburnConfig) -> Result<RemovalSettings> {
    let removal = &config.removal;
    Ok(RemovalSettings {
        router: required(config.contracts.router, "contracts.router")?,
        slippage_bps: removal.slippage_bps,
        deadline_secs: removal.deadline_secs,
        gas_margin_bps: removal.gas_margin_bps,
        prefer_permit: removal.prefer_permit,
        lp_token_name: config.contracts.lp_token_name.clone(),
        user_rejection_codes: removal.user_rejection_codes.clone(),
        confirmation: ConfirmationPolicy {
            poll_interval: Duration::from_millis(removal.confirmation.poll_interval_ms),
            max_attempts: removal.confirmation.max_attempts,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};

    #[test]
    fn removal_settings_require_router() {
        let mut config = LpburnConfig::default();
        let err = build_removal_settings(&config).unwrap_err();
        assert!(err.to_string().contains("contracts.router"));

        config.contracts.router = Some(Address::repeat_byte(0x02));
        config.removal.confirmation.poll_interval_ms = 250;
        let settings = build_removal_settings(&config).unwrap();
        assert_eq!(settings.router, Address::repeat_byte(0x02));
        assert_eq!(settings.gas_margin_bps, 2_000);
        assert_eq!(settings.lp_token_name, "Definix LPs");
        assert_eq!(settings.confirmation.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn pool_locator_uses_configured_native_symbol() {
        let mut config = LpburnConfig::default();
        assert!(build_pool_locator(&config).is_err());

        config.contracts.factory = Some(Address::repeat_byte(0xfa));
        config.contracts.init_code_hash = Some(B256::repeat_byte(0x42));
        config.contracts.wrapped_native = Some(Address::repeat_byte(0x77));
        config.contracts.native_symbol = "KLAY".to_string();
        let locator = build_pool_locator(&config).unwrap();
        assert_eq!(locator.native_symbol, "KLAY");
        assert_eq!(locator.wrapped_native, Address::repeat_byte(0x77));
    }

    #[test]
    fn init_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = || crate::cli::args::InitCmd {
            output: Some(dir.path().to_path_buf()),
            force: false,
        };
        init_configs(cmd()).unwrap();
        let path = dir.path().join("lpburn.toml");
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[removal]"));

        fs::write(&path, "# edited").unwrap();
        init_configs(cmd()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# edited");
    }
}
