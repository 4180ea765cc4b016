use std::sync::Arc;

use swapbox_common::{
    models::{
        error::WalletError,
        permit::PermitSignature,
        trade::{SwapCall, Trade},
        transaction::TransactionResponse,
    },
    traits::SwapSender,
    Address, Amount, Percent,
};
use tracing::{debug, info};

/// Builds swap submissions bound to a trade, slippage, account, permit and deadline.
pub struct SwapSubmitter {
    sender: Arc<dyn SwapSender>,
}

/// A swap ready to be sent. Consumed on submission, so each prepared swap is sent at most once.
pub struct PreparedSwap {
    call: SwapCall,
    sender: Arc<dyn SwapSender>,
}

impl SwapSubmitter {
    pub fn new(sender: Arc<dyn SwapSender>) -> Self {
        Self { sender }
    }

    /// Returns `None` when there is no trade or no account: the swap is not ready yet.
    ///
    /// A missing deadline does not block preparation; the router enforces its own expiry.
    pub fn prepare(
        &self,
        trade: Option<Arc<Trade>>,
        slippage: Percent,
        account: Option<Address>,
        permit: Option<PermitSignature>,
        deadline: Option<Amount>,
    ) -> Option<PreparedSwap> {
        let (Some(trade), Some(account)) = (trade, account) else {
            debug!("SwapNotReady");
            return None;
        };
        let call = SwapCall {
            amount_in_max: trade.maximum_amount_in(slippage),
            amount_out_min: trade.minimum_amount_out(slippage),
            trade,
            account,
            slippage,
            permit,
            deadline,
        };
        Some(PreparedSwap { call, sender: self.sender.clone() })
    }
}

impl PreparedSwap {
    pub fn call(&self) -> &SwapCall {
        &self.call
    }

    /// Performs exactly one submission attempt.
    pub async fn submit(self) -> Result<TransactionResponse, WalletError> {
        info!(
            trade = %self.call.trade,
            slippage = %self.call.slippage,
            permit = self.call.permit.is_some(),
            deadline = ?self.call.deadline,
            "SubmittingSwap"
        );
        self.sender.send_swap(self.call).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::function;
    use swapbox_common::{
        testing::{account, legacy_router, permit_for, usdc_to_dai},
        traits::MockSwapSender,
        TxHash,
    };

    use super::*;

    const SLIPPAGE: Percent = Percent::from_bps(50);

    #[test]
    fn test_not_ready_without_trade_or_account() {
        let submitter = SwapSubmitter::new(Arc::new(MockSwapSender::new()));
        let trade = usdc_to_dai(10, legacy_router());

        assert!(submitter
            .prepare(None, SLIPPAGE, Some(account()), None, None)
            .is_none());
        assert!(submitter
            .prepare(Some(trade), SLIPPAGE, None, None, None)
            .is_none());
    }

    #[test]
    fn test_prepare_binds_inputs() {
        let submitter = SwapSubmitter::new(Arc::new(MockSwapSender::new()));
        let trade = usdc_to_dai(10, legacy_router());
        let permit = permit_for(&trade, SLIPPAGE);
        let deadline = Some(Amount::from(1_700_001_800u64));

        let prepared = submitter
            .prepare(Some(trade.clone()), SLIPPAGE, Some(account()), Some(permit.clone()), deadline)
            .unwrap();

        let call = prepared.call();
        assert!(Trade::same(&call.trade, &trade));
        assert_eq!(call.account, account());
        assert_eq!(call.permit, Some(permit));
        assert_eq!(call.deadline, deadline);
        assert_eq!(call.amount_in_max, trade.input);
        assert_eq!(call.amount_out_min, trade.minimum_amount_out(SLIPPAGE));
    }

    #[test]
    fn test_missing_deadline_still_prepares() {
        let submitter = SwapSubmitter::new(Arc::new(MockSwapSender::new()));
        let trade = usdc_to_dai(10, legacy_router());

        let prepared = submitter.prepare(Some(trade), SLIPPAGE, Some(account()), None, None);

        assert_eq!(prepared.map(|p| p.call().deadline), Some(None));
    }

    #[tokio::test]
    async fn test_submit_sends_once() {
        let mut sender = MockSwapSender::new();
        sender
            .expect_send_swap()
            .with(function(|call: &SwapCall| call.account == account()))
            .times(1)
            .returning(|_| Ok(TransactionResponse::new(TxHash::repeat_byte(4))));
        let submitter = SwapSubmitter::new(Arc::new(sender));
        let trade = usdc_to_dai(10, legacy_router());

        let response = submitter
            .prepare(Some(trade), SLIPPAGE, Some(account()), None, None)
            .unwrap()
            .submit()
            .await
            .unwrap();

        assert_eq!(response.hash, TxHash::repeat_byte(4));
    }

    #[tokio::test]
    async fn test_submit_surfaces_rejection() {
        let mut sender = MockSwapSender::new();
        sender
            .expect_send_swap()
            .times(1)
            .returning(|_| Err(WalletError::UserRejected));
        let submitter = SwapSubmitter::new(Arc::new(sender));
        let trade = usdc_to_dai(10, legacy_router());

        let result = submitter
            .prepare(Some(trade), SLIPPAGE, Some(account()), None, None)
            .unwrap()
            .submit()
            .await;

        assert_eq!(result, Err(WalletError::UserRejected));
    }
}
