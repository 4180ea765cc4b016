use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the wallet or the RPC node when signing or submitting.
///
/// None of these are fatal to the session; callers catch them per attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum WalletError {
    #[error("User rejected the request")]
    UserRejected,

    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl WalletError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }
}
