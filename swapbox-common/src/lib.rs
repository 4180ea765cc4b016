//! Shared models and service contracts for the swapbox swap orchestrator.
pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod traits;

pub use models::{Address, Amount, ApprovalState, Chain, Percent, TxHash};
