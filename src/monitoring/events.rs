use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tracing::{error, info, warn};

use super::metrics::prometheus_enabled;
use metrics::{counter, histogram};

pub fn multicall_batch(size: usize, elapsed: Duration, success: bool) {
    info!(
        target: "monitoring::multicall",
        event = "aggregate",
        size,
        success,
        elapsed_ms = elapsed.as_millis() as u64,
        "multicall batch finished"
    );

    if prometheus_enabled() {
        let result = if success { "ok" } else { "error" };
        counter!("lpburn_multicall_batch_total", "result" => result).increment(1);
        histogram!("lpburn_multicall_batch_size").record(size as f64);
        histogram!("lpburn_multicall_latency_ms").record(elapsed.as_secs_f64() * 1_000.0);
    }
}

pub fn gas_estimate_succeeded(index: usize, method: &'static str, gas_limit: U256) {
    info!(
        target: "monitoring::removal",
        event = "estimate_gas",
        index,
        method,
        gas_limit = %gas_limit,
        "gas estimate succeeded"
    );

    if prometheus_enabled() {
        counter!(
            "lpburn_gas_estimate_total",
            "method" => method,
            "result" => "ok"
        )
        .increment(1);
    }
}

pub fn gas_estimate_failed(index: usize, method: &'static str, reason: &str) {
    warn!(
        target: "monitoring::removal",
        event = "estimate_gas",
        index,
        method,
        reason,
        "estimateGas failed"
    );

    if prometheus_enabled() {
        counter!(
            "lpburn_gas_estimate_total",
            "method" => method,
            "result" => "error"
        )
        .increment(1);
    }
}

pub fn removal_would_fail(candidates: usize) {
    error!(
        target: "monitoring::removal",
        event = "would_fail",
        candidates,
        "all gas estimates failed, transaction would fail"
    );

    if prometheus_enabled() {
        counter!("lpburn_removal_would_fail_total").increment(1);
    }
}

pub fn removal_submitted(method: &'static str, hash: &B256, gas_limit: U256) {
    info!(
        target: "monitoring::removal",
        event = "submitted",
        method,
        hash = %hash,
        gas_limit = %gas_limit,
        "remove liquidity transaction submitted"
    );

    if prometheus_enabled() {
        counter!("lpburn_removal_submitted_total", "method" => method).increment(1);
    }
}

pub fn removal_rejected(method: &'static str, reason: &str) {
    error!(
        target: "monitoring::removal",
        event = "rejected",
        method,
        reason,
        "remove liquidity transaction rejected"
    );

    if prometheus_enabled() {
        counter!("lpburn_removal_rejected_total", "method" => method).increment(1);
    }
}

pub fn permit_outcome(owner: &Address, outcome: &'static str) {
    info!(
        target: "monitoring::authorization",
        event = "permit",
        owner = %owner,
        outcome,
        "permit signature request finished"
    );

    if prometheus_enabled() {
        counter!("lpburn_permit_total", "outcome" => outcome).increment(1);
    }
}

pub fn approval_submitted(token: &Address, spender: &Address, hash: &B256, exact: bool) {
    info!(
        target: "monitoring::authorization",
        event = "approve",
        token = %token,
        spender = %spender,
        hash = %hash,
        exact,
        "approval transaction submitted"
    );

    if prometheus_enabled() {
        let mode = if exact { "exact" } else { "max" };
        counter!("lpburn_approval_submitted_total", "mode" => mode).increment(1);
    }
}

pub fn approval_confirmed(hash: &B256, success: bool, attempts: u32) {
    info!(
        target: "monitoring::authorization",
        event = "approve_receipt",
        hash = %hash,
        success,
        attempts,
        "approval transaction receipt received"
    );

    if prometheus_enabled() {
        let result = if success { "confirmed" } else { "reverted" };
        counter!("lpburn_approval_receipt_total", "result" => result).increment(1);
    }
}
