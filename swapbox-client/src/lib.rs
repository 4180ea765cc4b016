//! Swap submission orchestration: approval, permit, deadline and swap sequencing behind a
//! single primary action.
pub mod cli;
pub mod config;
pub mod scenario;
pub mod session;
pub mod swap;
pub mod transactions;

pub use config::ClientConfig;
pub use session::{SwapSession, SwapSettings};
pub use swap::{ConfirmOutcome, SwapOrchestrator, SwapServices, SwapView};
pub use transactions::InMemoryTransactionLog;
