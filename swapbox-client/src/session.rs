//! User settings and per-session display state, owned by the orchestrator and passed explicitly.
use serde::{Deserialize, Serialize};
use swapbox_common::TxHash;
use thiserror::Error;

/// Default transaction time-to-live: 30 minutes.
pub const DEFAULT_TRANSACTION_TTL: u64 = 30 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Transaction ttl must be a positive number of seconds")]
    InvalidTtl,
    #[error("At least one confirm attempt is required")]
    InvalidAttempts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSettings {
    /// Seconds a submitted swap stays valid, counted from the latest block timestamp.
    transaction_ttl: u64,
}

impl SwapSettings {
    pub fn new(transaction_ttl: u64) -> Result<Self, SettingsError> {
        if transaction_ttl == 0 {
            return Err(SettingsError::InvalidTtl);
        }
        Ok(Self { transaction_ttl })
    }

    pub fn transaction_ttl(&self) -> u64 {
        self.transaction_ttl
    }
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self { transaction_ttl: DEFAULT_TRANSACTION_TTL }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SwapSession {
    settings: SwapSettings,
    display_tx_hash: Option<TxHash>,
}

impl SwapSession {
    pub fn new(settings: SwapSettings) -> Self {
        Self { settings, display_tx_hash: None }
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    pub fn set_transaction_ttl(&mut self, ttl: u64) -> Result<(), SettingsError> {
        self.settings = SwapSettings::new(ttl)?;
        Ok(())
    }

    /// Hash of the most recently submitted swap.
    pub fn display_tx_hash(&self) -> Option<TxHash> {
        self.display_tx_hash
    }

    pub fn set_display_tx_hash(&mut self, hash: TxHash) {
        self.display_tx_hash = Some(hash);
    }
}
