use std::sync::Arc;

use swapbox_common::{
    models::{
        permit::PermitSignature, token::Token, trade::Trade, transaction::ApprovalTransaction,
    },
    traits::{AllowanceTracker, TransactionLog},
    Address, ApprovalState, Percent, TxHash,
};
use tracing::{debug, info, warn};

/// Determines whether a trade's spender may pull its input amount and submits approvals.
pub struct ApprovalResolver {
    allowances: Arc<dyn AllowanceTracker>,
    transactions: Arc<dyn TransactionLog>,
}

impl ApprovalResolver {
    pub fn new(
        allowances: Arc<dyn AllowanceTracker>,
        transactions: Arc<dyn TransactionLog>,
    ) -> Self {
        Self { allowances, transactions }
    }

    /// Derives the approval state of `trade` for `owner`.
    ///
    /// A held permit signed by `owner` and covering the trade counts as approval. Expiry is the
    /// caller's concern. Without a trade or owner, or while the allowance is not known yet, the
    /// state is `Unknown`.
    pub fn resolve(
        &self,
        trade: Option<&Trade>,
        slippage: Percent,
        owner: Option<Address>,
        permit: Option<&PermitSignature>,
    ) -> ApprovalState {
        let Some(trade) = trade else {
            return ApprovalState::Unknown;
        };
        let Some(token) = trade.input_token() else {
            // native currency is spent directly
            return ApprovalState::Approved;
        };
        let Some(owner) = owner else {
            return ApprovalState::Unknown;
        };
        if permit.is_some_and(|p| p.covers(trade, slippage, owner)) {
            return ApprovalState::Approved;
        }
        let Some(allowance) = self
            .allowances
            .allowance(token, owner, trade.spender())
        else {
            return ApprovalState::Unknown;
        };

        let required = trade.maximum_amount_in(slippage).raw;
        if allowance >= required {
            ApprovalState::Approved
        } else if self.is_pending(token, trade.spender()) {
            ApprovalState::Pending
        } else {
            ApprovalState::NotApproved
        }
    }

    pub fn is_pending(&self, token: &Token, spender: Address) -> bool {
        self.pending_approval(token, spender)
            .is_some()
    }

    /// Hash of the outstanding approval for the token and spender, if any.
    pub fn pending_approval(&self, token: &Token, spender: Address) -> Option<TxHash> {
        self.transactions
            .pending_approval(token, spender)
    }

    /// Submits an approval of the trade's maximum input.
    ///
    /// Returns `None` without submitting while an approval for the same pair is pending, for
    /// native input, and when the wallet fails or the user rejects.
    pub async fn submit_approval(
        &self,
        trade: &Trade,
        slippage: Percent,
    ) -> Option<ApprovalTransaction> {
        let token = trade.input_token()?;
        if let Some(hash) = self.pending_approval(token, trade.spender()) {
            debug!(token = %token.symbol, %hash, "ApprovalAlreadyPending");
            return None;
        }

        match self
            .allowances
            .submit_approval(trade, slippage)
            .await
        {
            Ok(tx) => {
                info!(
                    token = %token.symbol,
                    spender = %tx.spender,
                    hash = %tx.hash,
                    "ApprovalSubmitted"
                );
                Some(tx)
            }
            Err(err) => {
                warn!(token = %token.symbol, error = %err, "ApprovalFailed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rstest::rstest;
    use swapbox_common::{
        models::{error::WalletError, token::Currency},
        testing::{account, legacy_router, permit_for, usdc, usdc_to_dai},
        traits::{MockAllowanceTracker, MockTransactionLog},
        Amount,
    };

    use super::*;

    const SLIPPAGE: Percent = Percent::from_bps(50);

    fn resolver(allowance: Option<u64>, pending: Option<TxHash>) -> ApprovalResolver {
        let mut allowances = MockAllowanceTracker::new();
        allowances
            .expect_allowance()
            .returning(move |_, _, _| allowance.map(|a| Amount::from(a) * usdc().one()));
        let mut transactions = MockTransactionLog::new();
        transactions
            .expect_pending_approval()
            .returning(move |_, _| pending);
        ApprovalResolver::new(Arc::new(allowances), Arc::new(transactions))
    }

    #[rstest]
    #[case::no_allowance(Some(0), None, ApprovalState::NotApproved)]
    #[case::short_allowance(Some(9), None, ApprovalState::NotApproved)]
    #[case::exact_allowance(Some(10), None, ApprovalState::Approved)]
    #[case::large_allowance(Some(1_000), None, ApprovalState::Approved)]
    #[case::pending(Some(0), Some(TxHash::repeat_byte(1)), ApprovalState::Pending)]
    #[case::sufficient_despite_pending(
        Some(10),
        Some(TxHash::repeat_byte(1)),
        ApprovalState::Approved
    )]
    #[case::unknown_allowance(None, None, ApprovalState::Unknown)]
    fn test_resolve(
        #[case] allowance: Option<u64>,
        #[case] pending: Option<TxHash>,
        #[case] expected: ApprovalState,
    ) {
        let trade = usdc_to_dai(10, legacy_router());

        let state =
            resolver(allowance, pending).resolve(Some(&trade), SLIPPAGE, Some(account()), None);

        assert_eq!(state, expected);
    }

    #[test]
    fn test_resolve_without_trade_or_owner() {
        let trade = usdc_to_dai(10, legacy_router());
        let resolver = resolver(Some(100), None);

        assert_eq!(resolver.resolve(None, SLIPPAGE, Some(account()), None), ApprovalState::Unknown);
        assert_eq!(resolver.resolve(Some(&trade), SLIPPAGE, None, None), ApprovalState::Unknown);
    }

    #[test]
    fn test_resolve_native_input_is_approved() {
        let mut trade = (*usdc_to_dai(10, legacy_router())).clone();
        trade.input.currency = Currency::Native(swapbox_common::Chain::Ethereum);

        let state = resolver(None, None).resolve(Some(&trade), SLIPPAGE, None, None);

        assert_eq!(state, ApprovalState::Approved);
    }

    #[test]
    fn test_resolve_covering_permit_is_approved() {
        let trade = usdc_to_dai(10, legacy_router());
        let permit = permit_for(&trade, SLIPPAGE);

        let state =
            resolver(Some(0), None).resolve(Some(&trade), SLIPPAGE, Some(account()), Some(&permit));

        assert_eq!(state, ApprovalState::Approved);
    }

    #[test]
    fn test_resolve_ignores_permit_of_other_owner() {
        let trade = usdc_to_dai(10, legacy_router());
        let permit = permit_for(&trade, SLIPPAGE);
        let other = Address::repeat_byte(0xbb);

        let state =
            resolver(Some(0), None).resolve(Some(&trade), SLIPPAGE, Some(other), Some(&permit));

        assert_eq!(state, ApprovalState::NotApproved);
    }

    #[tokio::test]
    async fn test_submit_approval_success() {
        let trade = usdc_to_dai(10, legacy_router());
        let mut allowances = MockAllowanceTracker::new();
        allowances
            .expect_submit_approval()
            .with(eq((*trade).clone()), eq(SLIPPAGE))
            .times(1)
            .returning(|_, _| {
                Ok(ApprovalTransaction {
                    hash: TxHash::repeat_byte(9),
                    token: usdc(),
                    spender: legacy_router(),
                })
            });
        let mut transactions = MockTransactionLog::new();
        transactions
            .expect_pending_approval()
            .returning(|_, _| None);
        let resolver = ApprovalResolver::new(Arc::new(allowances), Arc::new(transactions));

        let tx = resolver
            .submit_approval(&trade, SLIPPAGE)
            .await;

        assert_eq!(tx.map(|t| t.hash), Some(TxHash::repeat_byte(9)));
    }

    #[tokio::test]
    async fn test_submit_approval_rejected_is_silent() {
        let trade = usdc_to_dai(10, legacy_router());
        let mut allowances = MockAllowanceTracker::new();
        allowances
            .expect_submit_approval()
            .times(1)
            .returning(|_, _| Err(WalletError::UserRejected));
        let mut transactions = MockTransactionLog::new();
        transactions
            .expect_pending_approval()
            .returning(|_, _| None);
        let resolver = ApprovalResolver::new(Arc::new(allowances), Arc::new(transactions));

        assert_eq!(
            resolver
                .submit_approval(&trade, SLIPPAGE)
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_submit_approval_while_pending_does_not_resubmit() {
        let trade = usdc_to_dai(10, legacy_router());
        let mut allowances = MockAllowanceTracker::new();
        allowances
            .expect_submit_approval()
            .never();
        let mut transactions = MockTransactionLog::new();
        transactions
            .expect_pending_approval()
            .returning(|_, _| Some(TxHash::repeat_byte(1)));
        let resolver = ApprovalResolver::new(Arc::new(allowances), Arc::new(transactions));

        assert_eq!(
            resolver
                .submit_approval(&trade, SLIPPAGE)
                .await,
            None
        );
    }
}
