use std::sync::Arc;

use alloy_primitives::Address;

use crate::rpc::Provider;
use crate::transactions::TransactionLog;

/// 运行期共享的依赖：provider、当前账户、链 ID 与交易记录。
#[derive(Clone)]
pub struct AppContext {
    pub provider: Arc<dyn Provider>,
    pub account: Option<Address>,
    pub chain_id: u64,
    pub transactions: TransactionLog,
}

impl AppContext {
    pub fn new(provider: Arc<dyn Provider>, account: Option<Address>, chain_id: u64) -> Self {
        Self {
            provider,
            account,
            chain_id,
            transactions: TransactionLog::new(),
        }
    }
}
