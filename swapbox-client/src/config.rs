use crate::session::{SettingsError, SwapSettings};

/// Validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    settings: SwapSettings,
    confirm_attempts: u32,
    approve_first: bool,
}

impl ClientConfig {
    pub fn new(transaction_ttl: u64, confirm_attempts: u32) -> Result<Self, SettingsError> {
        if confirm_attempts == 0 {
            return Err(SettingsError::InvalidAttempts);
        }
        Ok(Self {
            settings: SwapSettings::new(transaction_ttl)?,
            confirm_attempts,
            approve_first: false,
        })
    }

    /// Request an approval before opening the review.
    pub fn with_approval(mut self, approve_first: bool) -> Self {
        self.approve_first = approve_first;
        self
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    /// Upper bound of confirm calls while the review stays open after failures.
    pub fn confirm_attempts(&self) -> u32 {
        self.confirm_attempts
    }

    pub fn approve_first(&self) -> bool {
        self.approve_first
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { settings: SwapSettings::default(), confirm_attempts: 1, approve_first: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let config = ClientConfig::new(600, 3)
            .unwrap()
            .with_approval(true);

        assert_eq!(config.settings().transaction_ttl(), 600);
        assert_eq!(config.confirm_attempts(), 3);
        assert!(config.approve_first());
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(ClientConfig::new(0, 1), Err(SettingsError::InvalidTtl));
        assert_eq!(ClientConfig::new(1800, 0), Err(SettingsError::InvalidAttempts));
    }
}
