use std::fmt;

use reqwest::Error as ReqwestError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("网络请求失败: {0}")]
    Network(#[from] ReqwestError),
    #[error("JSON 解析失败: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("RPC 返回错误 {code}: {message}")]
    Response {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("RPC 响应缺少 result 字段: {method}")]
    MissingResult { method: &'static str },
    #[error("{0}")]
    Fatal(String),
}

impl RpcError {
    pub fn fatal(reason: impl fmt::Display) -> Self {
        Self::Fatal(reason.to_string())
    }

    /// JSON-RPC / EIP-1193 错误码；非节点返回的错误没有错误码。
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Response { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 面向用户展示的错误文本；节点附带的字符串 data 追加在 message 之后。
    pub fn user_message(&self) -> String {
        match self {
            RpcError::Response {
                message,
                data: Some(Value::String(detail)),
                ..
            } if !detail.is_empty() => format!("{message}: {detail}"),
            RpcError::Response { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
