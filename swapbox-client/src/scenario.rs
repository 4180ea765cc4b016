//! Scripted in-memory services driven by a JSON scenario, and a replay of the swap flow on top
//! of them.
use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use alloy_primitives::keccak256;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use swapbox_common::{
    models::{
        error::WalletError,
        permit::PermitSignature,
        token::{Currency, CurrencyAmount, Token},
        trade::{Route, SwapCall, Trade, TradeType},
        transaction::{ApprovalTransaction, Receipt, TransactionResponse},
    },
    traits::{
        AllowanceTracker, ChainClock, PermitSigner, SwapSender, TradeProvider, WalletProvider,
    },
    Address, Amount, Chain, Percent, TxHash,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    session::SwapSession,
    swap::{ApprovalOutcome, ConfirmOutcome, SwapOrchestrator, SwapServices, SwapView},
    transactions::InMemoryTransactionLog,
};

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scenario: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result the scripted wallet returns for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptedOutcome {
    #[default]
    Success,
    Failure {
        error: WalletError,
    },
}

fn default_slippage() -> Percent {
    Percent::from_bps(50)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChainRef {
    Id(u64),
    Name(Chain),
}

/// Accepts a chain by name (`"arbitrum"`) or by numeric id (`42161`).
fn chain_by_name_or_id<'de, D>(deserializer: D) -> Result<Chain, D::Error>
where
    D: Deserializer<'de>,
{
    match ChainRef::deserialize(deserializer)? {
        ChainRef::Name(chain) => Ok(chain),
        ChainRef::Id(id) => Chain::try_from(id).map_err(serde::de::Error::custom),
    }
}

fn default_trade_type() -> TradeType {
    TradeType::ExactInput
}

/// A swap situation to replay: market, wallet and the wallet's scripted answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, deserialize_with = "chain_by_name_or_id")]
    pub chain: Chain,
    pub account: Option<Address>,
    pub block_timestamp: Option<u64>,
    /// Allowed slippage in basis points, at most 10000.
    #[serde(rename = "slippage_bps", default = "default_slippage")]
    pub slippage: Percent,
    #[serde(default = "default_trade_type")]
    pub trade_type: TradeType,
    pub input: Currency,
    pub output: Currency,
    pub input_amount: u128,
    pub output_amount: u128,
    #[serde(default)]
    pub pools: Vec<Address>,
    /// Raw balance of the input currency, `None` while unknown.
    pub balance: Option<u128>,
    /// Raw allowance of every spender, `None` while unknown.
    pub allowance: Option<u128>,
    pub spender: Address,
    /// Spender of the permit capable route, if one exists.
    pub optimized_spender: Option<Address>,
    #[serde(default)]
    pub permit_supported: bool,
    #[serde(default)]
    pub approval: ScriptedOutcome,
    #[serde(default)]
    pub permit: ScriptedOutcome,
    /// Answers to consecutive swap submissions; submissions beyond the script succeed.
    #[serde(default)]
    pub swaps: Vec<ScriptedOutcome>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn trade(&self, spender: Address) -> Trade {
        Trade::new(
            self.trade_type,
            CurrencyAmount::from_raw(self.input.clone(), self.input_amount),
            CurrencyAmount::from_raw(self.output.clone(), self.output_amount),
            Route { pools: self.pools.clone(), spender },
        )
    }
}

/// Implements every service contract from a [`Scenario`].
///
/// Approvals stay pending until [`ScenarioServices::mine_pending_approvals`] is called, which
/// also raises the approved spender's allowance.
pub struct ScenarioServices {
    scenario: Scenario,
    base: Arc<Trade>,
    optimized: Option<Arc<Trade>>,
    log: Arc<InMemoryTransactionLog>,
    allowances: Mutex<HashMap<Address, Amount>>,
    pending_grants: Mutex<HashMap<TxHash, (Address, Amount)>>,
    swaps: Mutex<VecDeque<ScriptedOutcome>>,
    sequence: AtomicU64,
}

impl ScenarioServices {
    pub fn new(scenario: Scenario) -> Self {
        let base = Arc::new(scenario.trade(scenario.spender));
        let optimized = scenario
            .optimized_spender
            .map(|spender| Arc::new(scenario.trade(spender)));
        let swaps = scenario.swaps.iter().cloned().collect();
        Self {
            scenario,
            base,
            optimized,
            log: Arc::new(InMemoryTransactionLog::new()),
            allowances: Mutex::new(HashMap::new()),
            pending_grants: Mutex::new(HashMap::new()),
            swaps: Mutex::new(swaps),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn services(self: &Arc<Self>) -> SwapServices {
        SwapServices {
            trades: self.clone(),
            wallet: self.clone(),
            allowances: self.clone(),
            signer: self.clone(),
            clock: self.clone(),
            transactions: self.log.clone(),
            sender: self.clone(),
        }
    }

    pub fn transactions(&self) -> &InMemoryTransactionLog {
        &self.log
    }

    fn next(&self) -> u64 {
        self.sequence
            .fetch_add(1, Ordering::SeqCst)
    }

    fn next_hash(&self, kind: &str) -> TxHash {
        keccak256(format!("swapbox:{kind}:{n}", n = self.next()))
    }

    /// Confirms every pending approval and grants its amount to the spender.
    pub fn mine_pending_approvals(&self) -> usize {
        let grants: Vec<_> = self
            .pending_grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        let block_number = self.next();
        let mut allowances = self
            .allowances
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (hash, (spender, amount)) in &grants {
            self.log
                .finalize(hash, Receipt { block_number, success: true });
            allowances.insert(*spender, *amount);
        }
        debug!(count = grants.len(), block_number, "ApprovalsMined");
        grants.len()
    }
}

impl TradeProvider for ScenarioServices {
    fn live_trade(&self) -> Option<Arc<Trade>> {
        Some(self.base.clone())
    }

    fn optimized_trade(&self, _base: &Trade) -> Option<Arc<Trade>> {
        self.optimized.clone()
    }

    fn balance(&self, currency: &Currency) -> Option<CurrencyAmount> {
        if *currency != self.scenario.input {
            return None;
        }
        self.scenario
            .balance
            .map(|raw| CurrencyAmount::from_raw(currency.clone(), raw))
    }

    fn allowed_slippage(&self) -> Percent {
        self.scenario.slippage
    }
}

impl WalletProvider for ScenarioServices {
    fn account(&self) -> Option<Address> {
        self.scenario.account
    }

    fn chain(&self) -> Option<Chain> {
        Some(self.scenario.chain)
    }
}

impl ChainClock for ScenarioServices {
    fn block_timestamp(&self) -> Option<Amount> {
        self.scenario
            .block_timestamp
            .map(Amount::from)
    }
}

#[async_trait]
impl AllowanceTracker for ScenarioServices {
    fn allowance(&self, _token: &Token, _owner: Address, spender: Address) -> Option<Amount> {
        self.allowances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&spender)
            .copied()
            .or_else(|| {
                self.scenario
                    .allowance
                    .map(Amount::from)
            })
    }

    async fn submit_approval(
        &self,
        trade: &Trade,
        slippage: Percent,
    ) -> Result<ApprovalTransaction, WalletError> {
        if let ScriptedOutcome::Failure { error } = &self.scenario.approval {
            return Err(error.clone());
        }
        let token = trade
            .input_token()
            .ok_or_else(|| WalletError::Unsupported("native currency approval".to_string()))?;
        let hash = self.next_hash("approval");
        self.pending_grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash, (trade.spender(), trade.maximum_amount_in(slippage).raw));
        Ok(ApprovalTransaction { hash, token: token.clone(), spender: trade.spender() })
    }
}

#[async_trait]
impl PermitSigner for ScenarioServices {
    async fn sign_permit(
        &self,
        trade: &Trade,
        slippage: Percent,
        deadline: Option<Amount>,
    ) -> Result<Option<PermitSignature>, WalletError> {
        let (Some(owner), Some(token)) = (self.scenario.account, trade.input_token()) else {
            return Ok(None);
        };
        if !self.scenario.permit_supported {
            return Ok(None);
        }
        if let ScriptedOutcome::Failure { error } = &self.scenario.permit {
            return Err(error.clone());
        }
        let nonce = self.next();
        Ok(Some(PermitSignature {
            owner,
            spender: trade.spender(),
            token: token.address,
            amount: trade.maximum_amount_in(slippage).raw,
            nonce: Amount::from(nonce),
            deadline: deadline.unwrap_or(Amount::MAX),
            v: 27,
            r: keccak256(format!("swapbox:permit:r:{nonce}")),
            s: keccak256(format!("swapbox:permit:s:{nonce}")),
        }))
    }
}

#[async_trait]
impl SwapSender for ScenarioServices {
    async fn send_swap(&self, call: SwapCall) -> Result<TransactionResponse, WalletError> {
        let outcome = self
            .swaps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_default();
        match outcome {
            ScriptedOutcome::Success => {
                let nonce = self.next();
                Ok(TransactionResponse {
                    hash: self.next_hash("swap"),
                    from: Some(call.account),
                    nonce: Some(nonce),
                })
            }
            ScriptedOutcome::Failure { error } => Err(error),
        }
    }
}

/// A view captured after one step of the replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayStep {
    pub step: &'static str,
    pub view: SwapView,
}

/// Drives the orchestrator through approval, review and confirmation.
///
/// Stops early when the review cannot be opened or a confirmation is not retryable.
pub async fn replay(services: Arc<ScenarioServices>, config: &ClientConfig) -> Vec<ReplayStep> {
    let mut orchestrator =
        SwapOrchestrator::new(services.services(), SwapSession::new(config.settings().clone()));
    let mut steps = vec![ReplayStep { step: "initial", view: orchestrator.view() }];

    if config.approve_first() {
        let outcome = orchestrator.request_approval().await;
        info!(?outcome, "ApprovalRequested");
        steps.push(ReplayStep { step: "approval", view: orchestrator.view() });
        if let ApprovalOutcome::Submitted(_) = outcome {
            services.mine_pending_approvals();
            orchestrator.on_trade_update();
            steps.push(ReplayStep { step: "approval_mined", view: orchestrator.view() });
        }
    }

    if let Err(err) = orchestrator.request_review() {
        warn!(error = %err, "ReviewUnavailable");
        return steps;
    }
    steps.push(ReplayStep { step: "review", view: orchestrator.view() });

    for attempt in 1..=config.confirm_attempts() {
        let outcome = orchestrator
            .confirm()
            .await
            .map_err(|err| {
                warn!(attempt, error = %err, "ConfirmRejected");
                err
            });
        steps.push(ReplayStep { step: "confirm", view: orchestrator.view() });
        if !matches!(outcome, Ok(ConfirmOutcome::Failed(_))) {
            break;
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swapbox_common::{
        models::transaction::TransactionType,
        testing::{account, legacy_router, permit_router, usdc},
        traits::TransactionLog,
        ApprovalState,
    };

    use super::*;

    fn scenario() -> Scenario {
        serde_json::from_value(serde_json::json!({
            "account": account(),
            "block_timestamp": 1_700_000_000u64,
            "input": { "token": usdc() },
            "output": { "native": "ethereum" },
            "input_amount": 10_000_000u64,
            "output_amount": 5_000_000_000_000_000u64,
            "balance": 20_000_000u64,
            "allowance": 0,
            "spender": legacy_router(),
        }))
        .unwrap()
    }

    #[test]
    fn test_scenario_defaults() {
        let scenario = scenario();

        assert_eq!(scenario.chain, Chain::Ethereum);
        assert_eq!(scenario.slippage, Percent::from_bps(50));
        assert_eq!(scenario.trade_type, TradeType::ExactInput);
        assert!(!scenario.permit_supported);
        assert_eq!(scenario.approval, ScriptedOutcome::Success);
        assert!(scenario.swaps.is_empty());
    }

    fn scenario_with(field: &str, value: serde_json::Value) -> Result<Scenario, serde_json::Error> {
        let mut raw = serde_json::to_value(scenario()).unwrap();
        raw[field] = value;
        serde_json::from_value(raw)
    }

    #[test]
    fn test_chain_by_name_or_id() {
        let by_id = scenario_with("chain", serde_json::json!(42161)).unwrap();
        let by_name = scenario_with("chain", serde_json::json!("arbitrum")).unwrap();

        assert_eq!(by_id.chain, Chain::Arbitrum);
        assert_eq!(by_name.chain, Chain::Arbitrum);
        assert!(scenario_with("chain", serde_json::json!(5)).is_err());
    }

    #[test]
    fn test_slippage_out_of_range_is_rejected() {
        let huge = u64::from(u32::MAX - 9_999);

        assert!(scenario_with("slippage_bps", serde_json::json!(huge)).is_err());
        assert_eq!(
            scenario_with("slippage_bps", serde_json::json!(10_000))
                .unwrap()
                .slippage,
            Percent::from_bps(10_000)
        );
    }

    #[test]
    fn test_load_reports_invalid_slippage() {
        let path = std::env::temp_dir().join("swapbox-invalid-slippage.json");
        let mut raw = serde_json::to_value(scenario()).unwrap();
        raw["slippage_bps"] = serde_json::json!(20_000);
        fs::write(&path, raw.to_string()).unwrap();

        let result = Scenario::load(&path);

        assert!(matches!(result, Err(ScenarioError::Json(_))));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_scripted_failure_format() {
        let outcome: ScriptedOutcome = serde_json::from_str(
            r#"{"outcome": "failure", "error": {"kind": "user_rejected"}}"#,
        )
        .unwrap();

        assert_eq!(outcome, ScriptedOutcome::Failure { error: WalletError::UserRejected });
    }

    #[tokio::test]
    async fn test_approvals_pending_until_mined() {
        let services = Arc::new(ScenarioServices::new(scenario()));
        let trade = services.live_trade().unwrap();

        let tx = services
            .submit_approval(&trade, Percent::from_bps(50))
            .await
            .unwrap();
        services
            .transactions()
            .record(tx.clone().into());

        let log = services.transactions();
        assert_eq!(log.pending_approval(&usdc(), legacy_router()), Some(tx.hash));
        assert_eq!(services.allowance(&usdc(), account(), legacy_router()), Some(Amount::ZERO));

        assert_eq!(services.mine_pending_approvals(), 1);

        assert_eq!(log.pending_approval(&usdc(), legacy_router()), None);
        assert_eq!(
            services.allowance(&usdc(), account(), legacy_router()),
            Some(Amount::from(10_000_000u64))
        );
    }

    #[tokio::test]
    async fn test_replay_approve_then_swap() {
        let services = Arc::new(ScenarioServices::new(scenario()));
        let config = ClientConfig::new(1800, 1)
            .unwrap()
            .with_approval(true);

        let steps = replay(services.clone(), &config)
            .await;

        let names: Vec<_> = steps.iter().map(|s| s.step).collect();
        assert_eq!(names, vec!["initial", "approval", "approval_mined", "review", "confirm"]);
        assert_eq!(steps[0].view.approval, ApprovalState::NotApproved);
        assert_eq!(steps[1].view.approval, ApprovalState::Pending);
        assert_eq!(steps[2].view.approval, ApprovalState::Approved);
        assert!(steps[4].view.latest_tx_hash.is_some());
        let kinds: Vec<_> = services
            .transactions()
            .all()
            .into_iter()
            .map(|r| r.info.transaction_type())
            .collect();
        assert_eq!(kinds, vec![TransactionType::Approval, TransactionType::Swap]);
    }

    #[tokio::test]
    async fn test_replay_permit_route_skips_approval() {
        let mut scenario = scenario();
        scenario.optimized_spender = Some(permit_router());
        scenario.permit_supported = true;
        let services = Arc::new(ScenarioServices::new(scenario));
        let config = ClientConfig::default().with_approval(true);

        let steps = replay(services.clone(), &config)
            .await;

        let names: Vec<_> = steps.iter().map(|s| s.step).collect();
        assert_eq!(names, vec!["initial", "approval", "review", "confirm"]);
        let kinds: Vec<_> = services
            .transactions()
            .all()
            .into_iter()
            .map(|r| r.info.transaction_type())
            .collect();
        assert_eq!(kinds, vec![TransactionType::Swap]);
    }

    #[tokio::test]
    async fn test_replay_retries_failed_swaps() {
        let mut scenario = scenario();
        scenario.allowance = Some(u128::MAX);
        scenario.swaps = vec![
            ScriptedOutcome::Failure { error: WalletError::UserRejected },
            ScriptedOutcome::Failure { error: WalletError::Rpc("timeout".to_string()) },
        ];
        let services = Arc::new(ScenarioServices::new(scenario));
        let config = ClientConfig::new(1800, 3).unwrap();

        let steps = replay(services, &config).await;

        let confirms: Vec<_> = steps
            .iter()
            .filter(|s| s.step == "confirm")
            .collect();
        assert_eq!(confirms.len(), 3);
        assert_eq!(confirms[1].view.failed_attempts, 2);
        assert!(confirms[1].view.confirmation_open);
        assert!(!confirms[2].view.confirmation_open);
        assert!(confirms[2].view.latest_tx_hash.is_some());
    }

    #[tokio::test]
    async fn test_replay_stops_when_review_unavailable() {
        let mut scenario = scenario();
        scenario.balance = Some(5_000_000);
        let services = Arc::new(ScenarioServices::new(scenario));

        let steps = replay(services, &ClientConfig::default()).await;

        assert_eq!(steps.len(), 1);
        assert!(steps[0].view.action.disabled);
    }
}
