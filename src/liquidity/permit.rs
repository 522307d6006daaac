//! LP 代币的 EIP-712 permit 签名。

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::contracts::IDefinixPair;
use crate::rpc::{Provider, RpcError, TransactionRequest};

pub const PERMIT_VERSION: &str = "1";

#[derive(Debug, Error)]
pub enum PermitError {
    #[error("签名长度无效: {0} 字节")]
    InvalidLength(usize),
    #[error("签名 v 值无效: {0}")]
    InvalidRecoveryId(u8),
    #[error("读取 permit nonce 失败: {0}")]
    Nonce(#[source] RpcError),
    #[error("permit nonce 解码失败: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error("钱包签名失败: {0}")]
    Sign(#[source] RpcError),
    #[error("typed data 序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PermitError {
    /// 钱包返回的错误码是否属于用户主动取消。
    pub fn is_user_rejection(&self, rejection_codes: &[i64]) -> bool {
        match self {
            PermitError::Sign(err) => err
                .code()
                .is_some_and(|code| rejection_codes.contains(&code)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub deadline: U256,
}

#[derive(Debug, Clone)]
pub struct PermitRequest {
    pub token_name: String,
    pub chain_id: u64,
    pub pair: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: u64,
}

impl PermitRequest {
    /// `eth_signTypedData_v4` 所需的 JSON，nonce 为十六进制字符串，deadline 为数字。
    pub fn typed_data(&self) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                "Permit": [
                    { "name": "owner", "type": "address" },
                    { "name": "spender", "type": "address" },
                    { "name": "value", "type": "uint256" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "deadline", "type": "uint256" },
                ],
            },
            "domain": {
                "name": self.token_name,
                "version": PERMIT_VERSION,
                "chainId": self.chain_id,
                "verifyingContract": self.pair.to_checksum(None),
            },
            "primaryType": "Permit",
            "message": {
                "owner": self.owner.to_checksum(None),
                "spender": self.spender.to_checksum(None),
                "value": self.value.to_string(),
                "nonce": format!("{:#x}", self.nonce),
                "deadline": self.deadline,
            },
        })
    }
}

/// 拆分 65 字节 `r ++ s ++ v` 签名或 64 字节 EIP-2098 紧凑签名，v 统一为 27/28。
pub fn split_signature(raw: &[u8]) -> Result<(u8, B256, B256), PermitError> {
    match raw.len() {
        65 => {
            let r = B256::from_slice(&raw[..32]);
            let s = B256::from_slice(&raw[32..64]);
            let v = match raw[64] {
                v @ (0 | 1) => v + 27,
                v @ (27 | 28) => v,
                other => return Err(PermitError::InvalidRecoveryId(other)),
            };
            Ok((v, r, s))
        }
        64 => {
            let r = B256::from_slice(&raw[..32]);
            let mut s = B256::from_slice(&raw[32..]);
            let parity = s[0] >> 7;
            s[0] &= 0x7f;
            Ok((27 + parity, r, s))
        }
        other => Err(PermitError::InvalidLength(other)),
    }
}

pub async fn fetch_nonce(
    provider: &dyn Provider,
    pair: Address,
    owner: Address,
) -> Result<U256, PermitError> {
    let data = IDefinixPair::noncesCall { owner }.abi_encode();
    let raw = provider
        .call(&TransactionRequest::call(pair, data))
        .await
        .map_err(PermitError::Nonce)?;
    Ok(IDefinixPair::noncesCall::abi_decode_returns(&raw)?)
}

/// 请求钱包签名并拆分结果。
pub async fn sign_permit(
    provider: &dyn Provider,
    request: &PermitRequest,
) -> Result<PermitSignature, PermitError> {
    let typed_data = serde_json::to_string(&request.typed_data())?;
    debug!(
        target: "liquidity::permit",
        owner = %request.owner,
        pair = %request.pair,
        nonce = %request.nonce,
        deadline = request.deadline,
        "请求 permit 签名"
    );
    let raw = provider
        .sign_typed_data_v4(request.owner, &typed_data)
        .await
        .map_err(PermitError::Sign)?;
    let (v, r, s) = split_signature(&raw)?;
    Ok(PermitSignature {
        v,
        r,
        s,
        deadline: U256::from(request.deadline),
    })
}
