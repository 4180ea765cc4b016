use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::{
    token::{CurrencyAmount, Token},
    trade::TradeType,
    Address, TxHash,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransactionType {
    Approval,
    Swap,
}

/// What a logged transaction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum TransactionInfo {
    Approval {
        token: Token,
        spender: Address,
    },
    Swap {
        trade_type: TradeType,
        input: CurrencyAmount,
        output: CurrencyAmount,
    },
}

impl TransactionInfo {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionInfo::Approval { .. } => TransactionType::Approval,
            TransactionInfo::Swap { .. } => TransactionType::Swap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub block_number: u64,
    pub success: bool,
}

/// An entry of the append-only transaction log, keyed by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub info: TransactionInfo,
    pub added_at: NaiveDateTime,
    /// Set once the transaction is mined; a record without receipt is pending.
    pub receipt: Option<Receipt>,
}

impl TransactionRecord {
    pub fn new(hash: TxHash, info: TransactionInfo) -> Self {
        Self { hash, info, added_at: chrono::Utc::now().naive_utc(), receipt: None }
    }

    pub fn is_pending(&self) -> bool {
        self.receipt.is_none()
    }
}

/// An approval transaction broadcast by the allowance service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTransaction {
    pub hash: TxHash,
    pub token: Token,
    pub spender: Address,
}

impl From<ApprovalTransaction> for TransactionRecord {
    fn from(value: ApprovalTransaction) -> Self {
        TransactionRecord::new(
            value.hash,
            TransactionInfo::Approval { token: value.token, spender: value.spender },
        )
    }
}

/// The wallet's answer to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub hash: TxHash,
    pub from: Option<Address>,
    pub nonce: Option<u64>,
}

impl TransactionResponse {
    pub fn new(hash: TxHash) -> Self {
        Self { hash, from: None, nonce: None }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Chain;

    #[test]
    fn test_approval_transaction_into_pending_record() {
        let token = Token::new(Address::repeat_byte(1), "USDC", 6, Chain::Ethereum);
        let record: TransactionRecord = ApprovalTransaction {
            hash: TxHash::repeat_byte(3),
            token: token.clone(),
            spender: Address::repeat_byte(7),
        }
        .into();

        assert!(record.is_pending());
        assert_eq!(record.info.transaction_type(), TransactionType::Approval);
        assert_eq!(
            record.info,
            TransactionInfo::Approval { token, spender: Address::repeat_byte(7) }
        );
    }

    #[test]
    fn test_info_serializes_with_type_tag() {
        let info = TransactionInfo::Approval {
            token: Token::new(Address::repeat_byte(1), "USDC", 6, Chain::Ethereum),
            spender: Address::repeat_byte(7),
        };

        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["type"], "APPROVAL");
    }
}
