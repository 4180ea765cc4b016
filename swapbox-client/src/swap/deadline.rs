use swapbox_common::Amount;

/// Absolute swap expiry: the latest block timestamp plus the user's ttl.
///
/// `None` iff the block timestamp is unknown.
pub fn compute_deadline(block_timestamp: Option<Amount>, ttl_seconds: u64) -> Option<Amount> {
    block_timestamp.map(|ts| ts.saturating_add(Amount::from(ttl_seconds)))
}
