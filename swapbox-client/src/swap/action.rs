//! The primary action presented to the user, derived from approval state and balance.
use serde::Serialize;
use swapbox_common::{models::token::CurrencyAmount, Address, ApprovalState, Chain, TxHash};

/// Label of the primary action when no update replaces it.
pub const REVIEW_SWAP_LABEL: &str = "Review swap";
pub const APPROVE_LABEL: &str = "Approve";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIcon {
    Spinner,
}

/// Replaces the primary action with an explanatory message and an alternative action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionUpdate {
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ActionIcon>,
    /// Explorer link of the transaction the message refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// View model of the primary action. The default value is the enabled "Review swap" action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionSpec {
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<ActionUpdate>,
}

impl ActionSpec {
    pub fn disabled() -> Self {
        Self { disabled: true, update: None }
    }

    /// Whether the primary action currently triggers an approval instead of a review.
    pub fn requests_approval(&self) -> bool {
        self.update
            .as_ref()
            .is_some_and(|u| u.action == APPROVE_LABEL)
    }
}

/// Inputs of [`derive_action_spec`], all read from the services at derivation time.
#[derive(Debug, Clone, Default)]
pub struct ActionInputs<'a> {
    /// Set by the embedding caller, e.g. while the inputs are being edited.
    pub disabled: bool,
    pub chain: Option<Chain>,
    pub account: Option<Address>,
    pub input_amount: Option<&'a CurrencyAmount>,
    pub input_balance: Option<&'a CurrencyAmount>,
    pub approval: ApprovalState,
    pub approval_hash: Option<TxHash>,
}

/// Balance check: an unknown amount or balance, or one in a different currency, never counts as
/// sufficient.
fn has_sufficient_balance(
    amount: Option<&CurrencyAmount>,
    balance: Option<&CurrencyAmount>,
) -> bool {
    match (amount, balance) {
        (Some(amount), Some(balance)) => amount
            .checked_cmp(balance)
            .is_some_and(|ord| ord.is_le()),
        _ => false,
    }
}

pub fn derive_action_spec(inputs: &ActionInputs<'_>) -> ActionSpec {
    let (Some(chain), Some(_)) = (inputs.chain, inputs.account) else {
        return ActionSpec::disabled();
    };
    if inputs.disabled || !has_sufficient_balance(inputs.input_amount, inputs.input_balance) {
        return ActionSpec::disabled();
    }

    match inputs.approval {
        ApprovalState::Pending => ActionSpec {
            disabled: true,
            update: Some(ActionUpdate {
                message: "Approval pending".to_string(),
                action: APPROVE_LABEL.to_string(),
                icon: Some(ActionIcon::Spinner),
                link: inputs
                    .approval_hash
                    .map(|hash| chain.transaction_url(&hash)),
            }),
        },
        ApprovalState::NotApproved => {
            let symbol = inputs
                .input_amount
                .map(|amount| amount.currency.symbol())
                .unwrap_or_default();
            ActionSpec {
                disabled: false,
                update: Some(ActionUpdate {
                    message: format!("Approve {symbol} first"),
                    action: APPROVE_LABEL.to_string(),
                    icon: None,
                    link: None,
                }),
            }
        }
        ApprovalState::Approved | ApprovalState::Unknown => ActionSpec::default(),
    }
}
