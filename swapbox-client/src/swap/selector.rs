use std::sync::Arc;

use swapbox_common::{
    models::{token::Token, trade::Trade},
    traits::TradeProvider,
    Address,
};
use tracing::trace;

/// The trade the orchestrator acts on, and whether it is the permit capable variant.
#[derive(Debug, Clone)]
pub struct SelectedTrade {
    pub trade: Arc<Trade>,
    pub optimized: bool,
}

/// Chooses between `base` and its permit optimized variant.
///
/// While an approval for the base trade's spender is pending the user is committed to that
/// route, so the base trade is kept. Otherwise the optimized variant wins whenever the trade
/// provider can build one. Holds no state; call it on every derivation.
pub fn select_optimized_trade(
    base: Option<Arc<Trade>>,
    trades: &dyn TradeProvider,
    is_pending: impl Fn(&Token, Address) -> bool,
) -> Option<SelectedTrade> {
    let base = base?;
    let pending = base
        .input_token()
        .is_some_and(|token| is_pending(token, base.spender()));
    if pending {
        trace!(spender = %base.spender(), "KeepBaseTradeWhileApprovalPending");
        return Some(SelectedTrade { trade: base, optimized: false });
    }

    match trades.optimized_trade(&base) {
        Some(trade) => Some(SelectedTrade { trade, optimized: true }),
        None => Some(SelectedTrade { trade: base, optimized: false }),
    }
}
