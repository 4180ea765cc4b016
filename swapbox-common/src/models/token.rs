use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use super::{Address, Amount, Chain};

/// An ERC-20 token.
///
/// Tokens are identified by their address only; symbol and decimals are informational.
#[derive(Debug, Clone, Deserialize, Serialize, Eq)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub chain: Chain,
}

impl Token {
    pub fn new(address: Address, symbol: &str, decimals: u8, chain: Chain) -> Self {
        Self { address, symbol: symbol.to_string(), decimals, chain }
    }

    /// Get one whole token in its smallest unit.
    pub fn one(&self) -> Amount {
        Amount::from(10u64).pow(Amount::from(self.decimals))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

/// Either the chain's native currency or an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Native(Chain),
    Token(Token),
}

impl Currency {
    pub fn symbol(&self) -> &str {
        match self {
            Currency::Native(chain) => chain.native_symbol(),
            Currency::Token(token) => &token.symbol,
        }
    }

    /// The token behind this currency, `None` for the native currency which needs no approval.
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Currency::Native(_) => None,
            Currency::Token(token) => Some(token),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A raw amount of a currency, in the currency's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub raw: Amount,
}

impl CurrencyAmount {
    pub fn new(currency: Currency, raw: Amount) -> Self {
        Self { currency, raw }
    }

    pub fn from_raw(currency: Currency, raw: u128) -> Self {
        Self { currency, raw: Amount::from(raw) }
    }

    /// Compares two amounts. Amounts of different currencies are not comparable.
    pub fn checked_cmp(&self, other: &CurrencyAmount) -> Option<Ordering> {
        (self.currency == other.currency).then(|| self.raw.cmp(&other.raw))
    }
}

impl Display for CurrencyAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.raw, self.currency)
    }
}
