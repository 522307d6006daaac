use alloy_primitives::{Address, B256};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LpburnConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub removal: RemovalConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// 发送交易的账户；缺省时使用节点 `eth_accounts` 的第一个账户。
    #[serde(default)]
    pub account: Option<Address>,
    #[serde(default = "super::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GlobalConfig {
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoggingProfile {
    #[default]
    Lean,
    Verbose,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "super::default_logging_profile")]
    pub profile: LoggingProfile,
    #[serde(default = "super::default_timezone_offset_hours")]
    pub timezone_offset_hours: i8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub router: Option<Address>,
    #[serde(default)]
    pub factory: Option<Address>,
    #[serde(default)]
    pub init_code_hash: Option<B256>,
    #[serde(default)]
    pub wrapped_native: Option<Address>,
    #[serde(default)]
    pub multicall: Option<Address>,
    #[serde(default = "super::default_native_symbol")]
    pub native_symbol: String,
    /// LP 合约 EIP-712 域名中的 `name`。
    #[serde(default = "super::default_lp_token_name")]
    pub lp_token_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovalConfig {
    #[serde(default = "super::default_slippage_bps")]
    pub slippage_bps: u16,
    #[serde(default = "super::default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "super::default_gas_margin_bps")]
    pub gas_margin_bps: u32,
    #[serde(default = "super::default_true")]
    pub prefer_permit: bool,
    /// 视为用户主动取消签名的钱包错误码，命中时不回退到链上授权。
    #[serde(default = "super::default_user_rejection_codes")]
    pub user_rejection_codes: Vec<i64>,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "super::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "super::default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "super::default_prometheus_listen")]
    pub listen: String,
}
