use thiserror::Error;

use super::approval::ApprovalError;
use super::burn::BurnError;
use super::permit::PermitError;
use crate::multicall::MulticallError;
use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum RemovalError {
    #[error("缺少依赖: {0}")]
    MissingDependency(&'static str),
    #[error("既没有授权也没有 permit 签名，无法提交")]
    Unauthorized,
    #[error("交易对无效: {0}")]
    InvalidPair(String),
    #[error("所有候选方法的 gas 估算均失败，交易将会失败")]
    WouldFail,
    #[error("交易提交失败: {0}")]
    Submission(String),
    #[error(transparent)]
    Burn(#[from] BurnError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Permit(#[from] PermitError),
    #[error(transparent)]
    Multicall(#[from] MulticallError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

pub type RemovalResult<T> = Result<T, RemovalError>;
