use serde::{Deserialize, Serialize};

use super::{trade::Trade, Address, Amount, Percent};

/// An off-chain signed permit (EIP-2612 style) granting `spender` an allowance of `amount` over
/// `token` on behalf of `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitSignature {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub amount: Amount,
    pub nonce: Amount,
    pub deadline: Amount,
    pub v: u8,
    pub r: alloy_primitives::B256,
    pub s: alloy_primitives::B256,
}

impl PermitSignature {
    /// Whether this permit authorises the given trade's spender to pull the trade's maximum
    /// input amount from `owner`.
    pub fn covers(&self, trade: &Trade, slippage: Percent, owner: Address) -> bool {
        let Some(token) = trade.input_token() else {
            return false;
        };
        self.owner == owner &&
            token.address == self.token &&
            trade.spender() == self.spender &&
            self.amount >=
                trade
                    .maximum_amount_in(slippage)
                    .raw
    }

    /// The token rejects the signature from the block whose timestamp reaches the deadline.
    pub fn is_expired(&self, now: Amount) -> bool {
        now >= self.deadline
    }
}
