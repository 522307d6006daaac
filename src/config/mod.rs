pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

use self::types as cfg;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_logging_profile() -> cfg::LoggingProfile {
    cfg::LoggingProfile::Lean
}

pub(crate) fn default_timezone_offset_hours() -> i8 {
    0
}

pub(crate) fn default_native_symbol() -> String {
    "ETH".to_string()
}

pub(crate) fn default_lp_token_name() -> String {
    "Definix LPs".to_string()
}

pub(crate) fn default_slippage_bps() -> u16 {
    50
}

pub(crate) fn default_deadline_secs() -> u64 {
    1_200
}

pub(crate) fn default_gas_margin_bps() -> u32 {
    2_000
}

/// EIP-1193 user rejected request.
pub(crate) fn default_user_rejection_codes() -> Vec<i64> {
    vec![4001]
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    2_000
}

pub(crate) fn default_max_attempts() -> u32 {
    60
}

pub(crate) fn default_prometheus_listen() -> String {
    "0.0.0.0:9898".to_string()
}

impl Default for cfg::GlobalConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            account: None,
            request_timeout_ms: default_request_timeout_ms(),
            logging: cfg::LoggingConfig::default(),
        }
    }
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: default_logging_profile(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl Default for cfg::ContractsConfig {
    fn default() -> Self {
        Self {
            router: None,
            factory: None,
            init_code_hash: None,
            wrapped_native: None,
            multicall: None,
            native_symbol: default_native_symbol(),
            lp_token_name: default_lp_token_name(),
        }
    }
}

impl Default for cfg::RemovalConfig {
    fn default() -> Self {
        Self {
            slippage_bps: default_slippage_bps(),
            deadline_secs: default_deadline_secs(),
            gas_margin_bps: default_gas_margin_bps(),
            prefer_permit: true,
            user_rejection_codes: default_user_rejection_codes(),
            confirmation: cfg::ConfirmationConfig::default(),
        }
    }
}

impl Default for cfg::ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for cfg::PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: default_prometheus_listen(),
        }
    }
}
