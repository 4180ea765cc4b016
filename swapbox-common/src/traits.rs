//! Contracts of the services the swap orchestrator consumes.
//!
//! Plain getters return the service's latest known value and never block; they are polled on
//! every derivation. Only wallet interactions (approval, permit signing, swap submission) are
//! async.
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    error::WalletError,
    permit::PermitSignature,
    token::{Currency, CurrencyAmount, Token},
    trade::{SwapCall, Trade},
    transaction::{ApprovalTransaction, TransactionRecord, TransactionResponse},
    Address, Amount, Chain, Percent, TxHash,
};

/// Trade and pricing service.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait TradeProvider: Send + Sync {
    /// The currently quoted trade, if the user's inputs produce one.
    fn live_trade(&self) -> Option<Arc<Trade>>;

    /// A variant of `base` routed through a permit capable router, if one can be built.
    fn optimized_trade(&self, base: &Trade) -> Option<Arc<Trade>>;

    /// The connected account's balance of `currency`.
    fn balance(&self, currency: &Currency) -> Option<CurrencyAmount>;

    fn allowed_slippage(&self) -> Percent;
}

/// Wallet connectivity.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait WalletProvider: Send + Sync {
    fn account(&self) -> Option<Address>;

    fn chain(&self) -> Option<Chain>;
}

/// On-chain allowance tracking.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait AllowanceTracker: Send + Sync {
    /// The amount `spender` may currently pull from `owner`'s `token` balance, `None` while
    /// unknown.
    fn allowance(&self, token: &Token, owner: Address, spender: Address) -> Option<Amount>;

    /// Broadcasts an approval of the trade's maximum input amount to the trade's spender.
    ///
    /// Implementations must not broadcast a second approval while one for the same pair is
    /// still in flight.
    async fn submit_approval(
        &self,
        trade: &Trade,
        slippage: Percent,
    ) -> Result<ApprovalTransaction, WalletError>;
}

/// Off-chain permit signing.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait PermitSigner: Send + Sync {
    /// Asks the wallet to sign a permit for the trade's input token, spender and maximum input.
    ///
    /// Returns `Ok(None)` when the token does not implement permits or a precondition such as the
    /// nonce is unavailable.
    async fn sign_permit(
        &self,
        trade: &Trade,
        slippage: Percent,
        deadline: Option<Amount>,
    ) -> Result<Option<PermitSignature>, WalletError>;
}

/// Chain time oracle.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait ChainClock: Send + Sync {
    /// Timestamp of the latest known block, in seconds.
    fn block_timestamp(&self) -> Option<Amount>;
}

/// Append-only transaction log.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait TransactionLog: Send + Sync {
    fn record(&self, record: TransactionRecord);

    /// Hash of the unconfirmed approval of `token` for `spender`, if any.
    fn pending_approval(&self, token: &Token, spender: Address) -> Option<TxHash>;
}

/// Wallet/RPC swap submission.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait SwapSender: Send + Sync {
    /// Submits exactly one swap transaction. Implementations must not retry.
    async fn send_swap(&self, call: SwapCall) -> Result<TransactionResponse, WalletError>;
}
