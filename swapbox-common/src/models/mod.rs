pub mod error;
pub mod permit;
pub mod token;
pub mod trade;
pub mod transaction;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Address literal type to uniquely identify accounts, tokens and router contracts.
pub type Address = alloy_primitives::Address;

/// Transaction hash literal type to uniquely identify a transaction in the
/// chain and likely across chains.
pub type TxHash = alloy_primitives::B256;

/// Raw token amounts, allowances, timestamps and deadlines are all 256 bit integers on chain.
pub type Amount = alloy_primitives::U256;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Chain {
    #[default]
    Ethereum,
    Optimism,
    Arbitrum,
    Polygon,
    Base,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unsupported chain id: {0}")]
pub struct UnsupportedChainId(pub u64);

impl Chain {
    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Optimism => 10,
            Chain::Arbitrum => 42161,
            Chain::Polygon => 137,
            Chain::Base => 8453,
        }
    }

    /// Base url of the chain's block explorer, always ending with a slash.
    pub fn explorer(&self) -> &'static str {
        match self {
            Chain::Ethereum => "https://etherscan.io/",
            Chain::Optimism => "https://optimistic.etherscan.io/",
            Chain::Arbitrum => "https://arbiscan.io/",
            Chain::Polygon => "https://polygonscan.com/",
            Chain::Base => "https://basescan.org/",
        }
    }

    /// Explorer link for a transaction on this chain.
    pub fn transaction_url(&self, hash: &TxHash) -> String {
        format!("{explorer}tx/{hash}", explorer = self.explorer())
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Polygon => "MATIC",
            _ => "ETH",
        }
    }
}

impl TryFrom<u64> for Chain {
    type Error = UnsupportedChainId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Chain::Ethereum),
            10 => Ok(Chain::Optimism),
            42161 => Ok(Chain::Arbitrum),
            137 => Ok(Chain::Polygon),
            8453 => Ok(Chain::Base),
            other => Err(UnsupportedChainId(other)),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Percentage out of range: {0} bps exceeds {max} bps", max = Percent::BPS_DENOMINATOR)]
pub struct InvalidPercent(pub u32);

/// A percentage expressed in basis points (1/100th of a percent), at most 100%.
///
/// Used for the user's slippage tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percent {
    bps: u32,
}

impl Percent {
    pub const BPS_DENOMINATOR: u32 = 10_000;

    /// Saturates at 100%. Use `Percent::try_from` for untrusted input.
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::BPS_DENOMINATOR {
            Self { bps: Self::BPS_DENOMINATOR }
        } else {
            Self { bps }
        }
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }
}

impl TryFrom<u32> for Percent {
    type Error = InvalidPercent;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        if bps > Self::BPS_DENOMINATOR {
            return Err(InvalidPercent(bps));
        }
        Ok(Self { bps })
    }
}

impl From<Percent> for u32 {
    fn from(value: Percent) -> Self {
        value.bps
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.bps / 100, self.bps % 100)
    }
}

/// Whether the spender may pull the trade's input amount from the user's balance.
///
/// Always derived from the current allowance, the transaction log and any held permit; never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Unknown,
    NotApproved,
    Pending,
    Approved,
}
