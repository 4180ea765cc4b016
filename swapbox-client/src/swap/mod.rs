//! The swap submission orchestrator.
//!
//! Everything the user sees (selected trade, approval state, primary action, deadline) is derived
//! from the services on every call. The only state owned here is the review snapshot, a held
//! permit signature and the session.
pub mod action;
pub mod approval;
pub mod deadline;
pub mod permit;
pub mod selector;
pub mod submitter;

use std::sync::Arc;

use serde::Serialize;
use swapbox_common::{
    models::{
        error::WalletError,
        permit::PermitSignature,
        trade::Trade,
        transaction::{TransactionInfo, TransactionRecord},
    },
    traits::{
        AllowanceTracker, ChainClock, PermitSigner, SwapSender, TradeProvider, TransactionLog,
        WalletProvider,
    },
    Amount, ApprovalState, Percent, TxHash,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use self::{
    action::{derive_action_spec, ActionInputs, ActionSpec, REVIEW_SWAP_LABEL},
    approval::ApprovalResolver,
    deadline::compute_deadline,
    permit::PermitAcquirer,
    selector::{select_optimized_trade, SelectedTrade},
    submitter::SwapSubmitter,
};
use crate::session::{SettingsError, SwapSession};

/// Misuse of the orchestrator's transitions. Wallet failures are never reported this way.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No live trade to review")]
    NoLiveTrade,
    #[error("The swap action is disabled")]
    ActionDisabled,
    #[error("The input token must be approved before review")]
    ApprovalRequired,
    #[error("No trade is under review")]
    NoActiveTrade,
}

/// The services the orchestrator consumes.
#[derive(Clone)]
pub struct SwapServices {
    pub trades: Arc<dyn TradeProvider>,
    pub wallet: Arc<dyn WalletProvider>,
    pub allowances: Arc<dyn AllowanceTracker>,
    pub signer: Arc<dyn PermitSigner>,
    pub clock: Arc<dyn ChainClock>,
    pub transactions: Arc<dyn TransactionLog>,
    pub sender: Arc<dyn SwapSender>,
}

/// Snapshot of the live trade taken when the user opened the review.
///
/// The trade object is frozen: later quotes never replace it, they only flag it as changed.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTrade {
    pub trade: Arc<Trade>,
    pub last_error: Option<WalletError>,
    pub failed_attempts: u32,
}

impl ActiveTrade {
    fn new(trade: Arc<Trade>) -> Self {
        Self { trade, last_error: None, failed_attempts: 0 }
    }
}

#[derive(Debug, Clone, Default)]
pub enum SwapPhase {
    #[default]
    Idle,
    Review(ActiveTrade),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// A permit signature was obtained; no on-chain approval is needed.
    Permitted,
    Submitted(TxHash),
    NotSubmitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Submitted(TxHash),
    Failed(WalletError),
    /// The swap could not be prepared, e.g. the wallet disconnected. Nothing was sent.
    NotReady,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct SwapView {
    pub action: ActionSpec,
    pub primary_label: &'static str,
    pub approval: ApprovalState,
    pub confirmation_open: bool,
    pub active_trade: Option<Arc<Trade>>,
    /// The live quote is no longer the trade under review.
    pub trade_changed: bool,
    pub last_error: Option<WalletError>,
    pub failed_attempts: u32,
    pub latest_tx_hash: Option<TxHash>,
    pub deadline: Option<Amount>,
}

pub struct SwapOrchestrator {
    trades: Arc<dyn TradeProvider>,
    wallet: Arc<dyn WalletProvider>,
    clock: Arc<dyn ChainClock>,
    transactions: Arc<dyn TransactionLog>,
    resolver: ApprovalResolver,
    permits: PermitAcquirer,
    submitter: SwapSubmitter,
    session: SwapSession,
    disabled: bool,
    phase: SwapPhase,
    permit: Option<PermitSignature>,
}

impl SwapOrchestrator {
    pub fn new(services: SwapServices, session: SwapSession) -> Self {
        Self {
            resolver: ApprovalResolver::new(services.allowances, services.transactions.clone()),
            permits: PermitAcquirer::new(services.signer),
            submitter: SwapSubmitter::new(services.sender),
            trades: services.trades,
            wallet: services.wallet,
            clock: services.clock,
            transactions: services.transactions,
            session,
            disabled: false,
            phase: SwapPhase::Idle,
            permit: None,
        }
    }

    pub fn session(&self) -> &SwapSession {
        &self.session
    }

    pub fn set_transaction_ttl(&mut self, ttl: u64) -> Result<(), SettingsError> {
        self.session.set_transaction_ttl(ttl)
    }

    /// Disables the primary action regardless of any other input.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn phase(&self) -> &SwapPhase {
        &self.phase
    }

    pub fn active_trade(&self) -> Option<&ActiveTrade> {
        match &self.phase {
            SwapPhase::Review(active) => Some(active),
            SwapPhase::Idle => None,
        }
    }

    pub fn held_permit(&self) -> Option<&PermitSignature> {
        self.permit.as_ref()
    }

    /// The held permit unless chain time has reached its deadline. Kept while time is unknown.
    fn unexpired_permit(&self) -> Option<&PermitSignature> {
        let now = self.clock.block_timestamp();
        self.permit
            .as_ref()
            .filter(|permit| !now.is_some_and(|now| permit.is_expired(now)))
    }

    fn slippage(&self) -> Percent {
        self.trades.allowed_slippage()
    }

    /// The trade an approval or swap would act on right now.
    pub fn selected_trade(&self) -> Option<SelectedTrade> {
        select_optimized_trade(self.trades.live_trade(), self.trades.as_ref(), |token, spender| {
            self.resolver
                .is_pending(token, spender)
        })
    }

    pub fn approval_state(&self) -> ApprovalState {
        self.approval_state_of(self.selected_trade().as_ref())
    }

    fn approval_state_of(&self, selected: Option<&SelectedTrade>) -> ApprovalState {
        self.resolver.resolve(
            selected.map(|s| s.trade.as_ref()),
            self.slippage(),
            self.wallet.account(),
            self.unexpired_permit(),
        )
    }

    pub fn action_spec(&self) -> ActionSpec {
        let selected = self.selected_trade();
        let trade = selected.as_ref().map(|s| s.trade.as_ref());
        let balance = trade.and_then(|t| self.trades.balance(t.input_currency()));
        let approval_hash = trade.and_then(|t| {
            t.input_token()
                .and_then(|token| self.resolver.pending_approval(token, t.spender()))
        });

        derive_action_spec(&ActionInputs {
            disabled: self.disabled,
            chain: self.wallet.chain(),
            account: self.wallet.account(),
            input_amount: trade.map(|t| &t.input),
            input_balance: balance.as_ref(),
            approval: self.approval_state_of(selected.as_ref()),
            approval_hash,
        })
    }

    pub fn deadline(&self) -> Option<Amount> {
        compute_deadline(
            self.clock.block_timestamp(),
            self.session
                .settings()
                .transaction_ttl(),
        )
    }

    /// Reconciles owned state with a new live quote.
    ///
    /// The review snapshot survives quote changes and is only dropped once no live trade exists.
    /// A held permit is dropped once it no longer authorises the selected trade for the connected
    /// account at the current chain time.
    pub fn on_trade_update(&mut self) {
        let live = self.trades.live_trade();
        if live.is_none() && matches!(self.phase, SwapPhase::Review(_)) {
            debug!("ActiveTradeCleared");
            self.phase = SwapPhase::Idle;
        }

        let Some(permit) = &self.permit else {
            return;
        };
        let expired = self.unexpired_permit().is_none();
        let owner_changed = self.wallet.account() != Some(permit.owner);
        let slippage = self.slippage();
        let uncovered = self
            .selected_trade()
            .is_some_and(|selected| !permit.covers(&selected.trade, slippage, permit.owner));
        if expired || owner_changed || uncovered {
            debug!(expired, owner_changed, uncovered, "PermitDiscarded");
            self.permit = None;
        }
    }

    /// Opens the confirmation surface on a snapshot of the live trade.
    pub fn request_review(&mut self) -> Result<(), OrchestratorError> {
        let live = self
            .trades
            .live_trade()
            .ok_or(OrchestratorError::NoLiveTrade)?;
        let spec = self.action_spec();
        if spec.disabled {
            return Err(OrchestratorError::ActionDisabled);
        }
        if spec.requests_approval() {
            return Err(OrchestratorError::ApprovalRequired);
        }

        debug!(trade = %live, "ReviewOpened");
        self.phase = SwapPhase::Review(ActiveTrade::new(live));
        Ok(())
    }

    /// Closes the confirmation surface. Transactions already sent are unaffected.
    pub fn cancel(&mut self) {
        if let SwapPhase::Review(active) = std::mem::take(&mut self.phase) {
            debug!(trade = %active.trade, attempts = active.failed_attempts, "ReviewCancelled");
        }
    }

    /// Grants the selected trade's spender access to the input token.
    ///
    /// Prefers a permit signature on the optimized route and falls back to an on-chain
    /// approval, which is recorded in the transaction log. Does nothing unless the approval
    /// state is `NotApproved`. A failed approval is only logged.
    #[instrument(skip(self))]
    pub async fn request_approval(&mut self) -> ApprovalOutcome {
        let selected = self.selected_trade();
        let state = self.approval_state_of(selected.as_ref());
        let Some(selected) = selected.filter(|_| state == ApprovalState::NotApproved) else {
            debug!(%state, "ApprovalNotRequired");
            return ApprovalOutcome::NotSubmitted;
        };
        let slippage = self.slippage();

        if let (true, Some(owner)) = (selected.optimized, self.wallet.account()) {
            let deadline = self.deadline();
            if let Some(signature) = self
                .permits
                .acquire(&selected.trade, slippage, owner, deadline)
                .await
            {
                self.permit = Some(signature);
                return ApprovalOutcome::Permitted;
            }
        }

        match self
            .resolver
            .submit_approval(&selected.trade, slippage)
            .await
        {
            Some(tx) => {
                let hash = tx.hash;
                self.transactions.record(tx.into());
                ApprovalOutcome::Submitted(hash)
            }
            None => ApprovalOutcome::NotSubmitted,
        }
    }

    /// Submits the currently selected trade once.
    ///
    /// Uses live slippage, account, permit and deadline rather than the snapshot's values. A held
    /// permit is reused only while unexpired and signed by the current account. On failure the
    /// snapshot stays open with the error attached so the user can retry.
    #[instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<ConfirmOutcome, OrchestratorError> {
        if !matches!(self.phase, SwapPhase::Review(_)) {
            return Err(OrchestratorError::NoActiveTrade);
        }

        let selected = self.selected_trade();
        let slippage = self.slippage();
        let deadline = self.deadline();
        let account = self.wallet.account();
        let permit = match (&selected, account) {
            (Some(s), Some(owner)) => {
                let held = self
                    .unexpired_permit()
                    .filter(|held| held.covers(&s.trade, slippage, owner))
                    .cloned();
                match held {
                    Some(held) => Some(held),
                    None if s.optimized => {
                        self.permits
                            .acquire(&s.trade, slippage, owner, deadline)
                            .await
                    }
                    None => None,
                }
            }
            _ => None,
        };
        // unused signatures stay valid for a retry
        self.permit = permit.clone();

        let Some(prepared) = self.submitter.prepare(
            selected.map(|s| s.trade),
            slippage,
            account,
            permit,
            deadline,
        ) else {
            return Ok(ConfirmOutcome::NotReady);
        };
        let trade = prepared.call().trade.clone();

        match prepared.submit().await {
            Ok(response) => {
                info!(hash = %response.hash, trade = %trade, "SwapSubmitted");
                self.transactions.record(TransactionRecord::new(
                    response.hash,
                    TransactionInfo::Swap {
                        trade_type: trade.trade_type,
                        input: trade.input.clone(),
                        output: trade.output.clone(),
                    },
                ));
                self.session
                    .set_display_tx_hash(response.hash);
                // the nonce is consumed
                self.permit = None;
                self.phase = SwapPhase::Idle;
                Ok(ConfirmOutcome::Submitted(response.hash))
            }
            Err(err) => {
                if err.is_user_rejection() {
                    info!("SwapRejected");
                } else {
                    warn!(error = %err, "SwapFailed");
                }
                if let SwapPhase::Review(active) = &mut self.phase {
                    active.last_error = Some(err.clone());
                    active.failed_attempts += 1;
                }
                Ok(ConfirmOutcome::Failed(err))
            }
        }
    }

    pub fn view(&self) -> SwapView {
        let active = self.active_trade();
        let trade_changed = active.is_some_and(|active| {
            self.trades
                .live_trade()
                .is_some_and(|live| !Trade::same(&live, &active.trade))
        });
        SwapView {
            action: self.action_spec(),
            primary_label: REVIEW_SWAP_LABEL,
            approval: self.approval_state(),
            confirmation_open: active.is_some(),
            active_trade: active.map(|a| a.trade.clone()),
            trade_changed,
            last_error: active.and_then(|a| a.last_error.clone()),
            failed_attempts: active.map_or(0, |a| a.failed_attempts),
            latest_tx_hash: self.session.display_tx_hash(),
            deadline: self.deadline(),
        }
    }
}
