use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};

use swapbox_common::{
    models::{
        token::Token,
        transaction::{Receipt, TransactionInfo, TransactionRecord},
    },
    traits::TransactionLog,
    Address, TxHash,
};
use tracing::{debug, warn};

/// Process local transaction log keyed by hash.
///
/// Records stay pending until [`InMemoryTransactionLog::finalize`] attaches a receipt.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    /// Records with their insertion sequence number.
    records: RwLock<HashMap<TxHash, (u64, TransactionRecord)>>,
    sequence: AtomicU64,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a receipt to a recorded transaction. Returns false for unknown hashes.
    pub fn finalize(&self, hash: &TxHash, receipt: Receipt) -> bool {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(hash) {
            Some((_, record)) => {
                debug!(%hash, success = receipt.success, "TransactionFinalized");
                record.receipt = Some(receipt);
                true
            }
            None => {
                warn!(%hash, "FinalizeUnknownTransaction");
                false
            }
        }
    }

    pub fn get(&self, hash: &TxHash) -> Option<TransactionRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hash)
            .map(|(_, record)| record.clone())
    }

    /// All records in insertion order.
    pub fn all(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<_> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|(seq, _)| *seq);
        records
            .into_iter()
            .map(|(_, record)| record)
            .collect()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn record(&self, record: TransactionRecord) {
        debug!(
            hash = %record.hash,
            kind = %record.info.transaction_type(),
            "TransactionRecorded"
        );
        let seq = self
            .sequence
            .fetch_add(1, Ordering::SeqCst);
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.hash, (seq, record));
    }

    fn pending_approval(&self, token: &Token, spender: Address) -> Option<TxHash> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|(_, record)| {
                record.is_pending() &&
                    matches!(
                        &record.info,
                        TransactionInfo::Approval { token: t, spender: s }
                            if t == token && *s == spender
                    )
            })
            .map(|(_, record)| record.hash)
    }
}
