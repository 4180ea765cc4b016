//! Trades as produced by the pricing service, and the swap call built from them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    permit::PermitSignature,
    token::{Currency, CurrencyAmount, Token},
    Address, Amount, Percent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// The input amount is fixed, the output amount may slip.
    ExactInput,
    /// The output amount is fixed, the input amount may slip.
    ExactOutput,
}

/// The path a trade takes and the router contract that executes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Pools traversed, in order.
    pub pools: Vec<Address>,
    /// Router that pulls the input amount from the user; the approval spender.
    pub spender: Address,
}

/// An immutable description of a proposed exchange.
///
/// Trades are shared as `Arc<Trade>`; identity is pointer identity, see [`Trade::same`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trade {
    pub trade_type: TradeType,
    pub input: CurrencyAmount,
    pub output: CurrencyAmount,
    pub route: Route,
}

impl Trade {
    pub fn new(
        trade_type: TradeType,
        input: CurrencyAmount,
        output: CurrencyAmount,
        route: Route,
    ) -> Self {
        Self { trade_type, input, output, route }
    }

    pub fn input_currency(&self) -> &Currency {
        &self.input.currency
    }

    /// The input token, `None` when the trade spends the native currency.
    pub fn input_token(&self) -> Option<&Token> {
        self.input.currency.as_token()
    }

    pub fn spender(&self) -> Address {
        self.route.spender
    }

    /// The most the user may have to pay given the slippage tolerance. This is also the allowance
    /// the spender needs.
    pub fn maximum_amount_in(&self, slippage: Percent) -> CurrencyAmount {
        match self.trade_type {
            TradeType::ExactInput => self.input.clone(),
            TradeType::ExactOutput => {
                let raw = self
                    .input
                    .raw
                    .saturating_mul(slippage_factor(slippage)) /
                    Amount::from(Percent::BPS_DENOMINATOR);
                CurrencyAmount::new(self.input.currency.clone(), raw)
            }
        }
    }

    /// The least the user may receive given the slippage tolerance.
    pub fn minimum_amount_out(&self, slippage: Percent) -> CurrencyAmount {
        match self.trade_type {
            TradeType::ExactOutput => self.output.clone(),
            TradeType::ExactInput => {
                let raw = self
                    .output
                    .raw
                    .saturating_mul(Amount::from(Percent::BPS_DENOMINATOR)) /
                    slippage_factor(slippage);
                CurrencyAmount::new(self.output.currency.clone(), raw)
            }
        }
    }

    /// Identity comparison: whether both handles point at the same trade object.
    pub fn same(a: &Arc<Trade>, b: &Arc<Trade>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// `1 + slippage`, scaled by the basis point denominator. Never zero.
fn slippage_factor(slippage: Percent) -> Amount {
    Amount::from(Percent::BPS_DENOMINATOR) + Amount::from(slippage.bps())
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} via {:#x}", self.input, self.output, self.route.spender)
    }
}

/// Everything the wallet needs to submit one swap transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapCall {
    pub trade: Arc<Trade>,
    pub account: Address,
    pub slippage: Percent,
    pub amount_in_max: CurrencyAmount,
    pub amount_out_min: CurrencyAmount,
    pub permit: Option<PermitSignature>,
    /// Absolute expiry enforced by the router; `None` lets the router decide.
    pub deadline: Option<Amount>,
}
