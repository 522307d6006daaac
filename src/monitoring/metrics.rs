use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

use crate::config::PrometheusConfig;

static EXPORTER: OnceCell<SocketAddr> = OnceCell::new();
static PROMETHEUS_ENABLED: AtomicBool = AtomicBool::new(false);

/// 按配置安装 Prometheus exporter，未启用时返回 `None`。重复调用复用第一次的监听地址。
pub fn try_init_prometheus(config: &PrometheusConfig) -> Result<Option<SocketAddr>> {
    if !config.enable {
        return Ok(None);
    }
    let listen = config.listen.trim();
    let addr = EXPORTER.get_or_try_init(|| -> Result<SocketAddr> {
        let addr: SocketAddr = listen
            .parse()
            .with_context(|| format!("invalid prometheus listen address: {listen}"))?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install prometheus exporter")?;
        describe_metrics();
        PROMETHEUS_ENABLED.store(true, Ordering::Relaxed);
        Ok(addr)
    })?;
    Ok(Some(*addr))
}

pub fn prometheus_enabled() -> bool {
    PROMETHEUS_ENABLED.load(Ordering::Relaxed)
}

fn describe_metrics() {
    describe_counter!(
        "lpburn_gas_estimate_total",
        "移除方法 gas 估算次数，按方法与结果区分"
    );
    describe_counter!("lpburn_removal_submitted_total", "已提交的移除交易");
    describe_counter!("lpburn_removal_rejected_total", "提交被拒绝的移除交易");
    describe_counter!(
        "lpburn_removal_would_fail_total",
        "全部候选估算失败而放弃提交的次数"
    );
    describe_counter!("lpburn_permit_total", "permit 签名请求结果");
    describe_counter!("lpburn_approval_submitted_total", "已提交的授权交易");
    describe_counter!("lpburn_approval_receipt_total", "授权交易回执结果");
    describe_counter!("lpburn_multicall_batch_total", "multicall 聚合调用次数");
    describe_histogram!("lpburn_multicall_batch_size", "单次 multicall 的子调用数量");
    describe_histogram!("lpburn_multicall_latency_ms", "multicall 聚合调用耗时");
}
