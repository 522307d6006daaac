use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy_primitives::Address;
use thiserror::Error;

use super::LpburnConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["lpburn.toml", "config/lpburn.toml"];

pub const ENV_RPC_URL: &str = "LPBURN_RPC_URL";
pub const ENV_ACCOUNT: &str = "LPBURN_ACCOUNT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("missing required config value `{0}`")]
    Missing(&'static str),
}

/// 指定路径时必须存在；未指定时依次查找默认路径，都不存在则使用默认配置。
/// 最后应用环境变量覆盖并校验。
pub fn load_config(path: Option<PathBuf>) -> Result<LpburnConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(&path)?,
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
            .map(|candidate| read_file(&candidate))
            .transpose()?
            .unwrap_or_default(),
    };

    apply_overrides(&mut config, |key| env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<LpburnConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn apply_overrides<F>(config: &mut LpburnConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(url) = read(ENV_RPC_URL) {
        config.global.rpc_url = Some(url);
    }
    if let Some(account) = read(ENV_ACCOUNT) {
        let parsed = Address::from_str(&account).map_err(|err| ConfigError::Invalid {
            field: "global.account",
            reason: format!("{ENV_ACCOUNT}={account}: {err}"),
        })?;
        config.global.account = Some(parsed);
    }
    Ok(())
}

pub(crate) fn validate(config: &LpburnConfig) -> Result<(), ConfigError> {
    let removal = &config.removal;
    if removal.slippage_bps >= 10_000 {
        return Err(ConfigError::Invalid {
            field: "removal.slippage_bps",
            reason: format!("{} must be below 10000", removal.slippage_bps),
        });
    }
    if removal.confirmation.max_attempts == 0 {
        return Err(ConfigError::Invalid {
            field: "removal.confirmation.max_attempts",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.contracts.lp_token_name.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "contracts.lp_token_name",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(field))
}
