use std::sync::Arc;

use swapbox_common::{
    models::{permit::PermitSignature, trade::Trade},
    traits::PermitSigner,
    Address, Amount, Percent,
};
use tracing::{debug, info, warn};

/// Obtains off-chain permits in place of on-chain approvals.
///
/// Never fails: an absent signature is the normal outcome for tokens without permit support,
/// for declined signing requests and for signatures that do not cover the trade.
pub struct PermitAcquirer {
    signer: Arc<dyn PermitSigner>,
}

impl PermitAcquirer {
    pub fn new(signer: Arc<dyn PermitSigner>) -> Self {
        Self { signer }
    }

    pub async fn acquire(
        &self,
        trade: &Trade,
        slippage: Percent,
        owner: Address,
        deadline: Option<Amount>,
    ) -> Option<PermitSignature> {
        let token = trade.input_token()?;
        match self
            .signer
            .sign_permit(trade, slippage, deadline)
            .await
        {
            Ok(Some(signature)) if signature.covers(trade, slippage, owner) => {
                info!(
                    token = %token.symbol,
                    spender = %signature.spender,
                    deadline = ?deadline,
                    "PermitSigned"
                );
                Some(signature)
            }
            Ok(Some(signature)) => {
                warn!(
                    token = %token.symbol,
                    signed_owner = %signature.owner,
                    signed_spender = %signature.spender,
                    signed_amount = %signature.amount,
                    "PermitDoesNotCoverTrade"
                );
                None
            }
            Ok(None) => {
                debug!(token = %token.symbol, "PermitUnavailable");
                None
            }
            Err(err) if err.is_user_rejection() => {
                info!(token = %token.symbol, "PermitDeclined");
                None
            }
            Err(err) => {
                warn!(token = %token.symbol, error = %err, "PermitFailed");
                None
            }
        }
    }
}
