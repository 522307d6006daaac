use std::sync::Arc;
use std::time::SystemTime;

use alloy_primitives::B256;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Approval,
    Removal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Approval => "approval",
            TransactionKind::Removal => "removal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub hash: B256,
    pub kind: TransactionKind,
    pub summary: String,
    pub submitted_at: SystemTime,
    pub status: TransactionStatus,
}

/// 已提交交易的记录表，附带便于展示的摘要。
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    inner: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, hash: B256, kind: TransactionKind, summary: impl Into<String>) {
        self.inner.lock().push(TransactionRecord {
            hash,
            kind,
            summary: summary.into(),
            submitted_at: SystemTime::now(),
            status: TransactionStatus::Pending,
        });
    }

    /// 返回是否找到了对应的交易。
    pub fn mark(&self, hash: &B256, status: TransactionStatus) -> bool {
        let mut records = self.inner.lock();
        match records.iter_mut().find(|record| record.hash == *hash) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, hash: &B256) -> Option<TransactionRecord> {
        self.inner
            .lock()
            .iter()
            .find(|record| record.hash == *hash)
            .cloned()
    }

    pub fn records(&self) -> Vec<TransactionRecord> {
        self.inner.lock().clone()
    }

    pub fn pending(&self, kind: TransactionKind) -> Vec<TransactionRecord> {
        self.inner
            .lock()
            .iter()
            .filter(|record| record.kind == kind && record.status == TransactionStatus::Pending)
            .cloned()
            .collect()
    }
}
