//! Fixtures shared by unit and integration tests.
use std::sync::Arc;

use alloy_primitives::{address, B256};

use crate::models::{
    permit::PermitSignature,
    token::{Currency, CurrencyAmount, Token},
    trade::{Route, Trade, TradeType},
    Address, Amount, Chain, Percent,
};

pub fn usdc() -> Token {
    Token::new(address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "USDC", 6, Chain::Ethereum)
}

pub fn dai() -> Token {
    Token::new(address!("6b175474e89094c44da98b954eedeac495271d0f"), "DAI", 18, Chain::Ethereum)
}

pub fn account() -> Address {
    Address::repeat_byte(0xaa)
}

/// Router without permit support.
pub fn legacy_router() -> Address {
    Address::repeat_byte(0x71)
}

/// Router accepting permit signatures.
pub fn permit_router() -> Address {
    Address::repeat_byte(0x72)
}

pub fn usdc_amount(whole: u64) -> CurrencyAmount {
    CurrencyAmount::new(Currency::Token(usdc()), Amount::from(whole) * usdc().one())
}

/// An exact input USDC -> DAI trade at parity, executed by `spender`.
pub fn usdc_to_dai(whole_usdc: u64, spender: Address) -> Arc<Trade> {
    Arc::new(Trade::new(
        TradeType::ExactInput,
        usdc_amount(whole_usdc),
        CurrencyAmount::new(Currency::Token(dai()), Amount::from(whole_usdc) * dai().one()),
        Route { pools: vec![Address::repeat_byte(0x90)], spender },
    ))
}

/// A signature covering the trade's maximum input at the given slippage.
pub fn permit_for(trade: &Trade, slippage: Percent) -> PermitSignature {
    PermitSignature {
        owner: account(),
        spender: trade.spender(),
        token: trade
            .input_token()
            .map(|t| t.address)
            .unwrap_or_default(),
        amount: trade.maximum_amount_in(slippage).raw,
        nonce: Amount::ZERO,
        deadline: Amount::from(1_700_001_800u64),
        v: 28,
        r: B256::repeat_byte(0x11),
        s: B256::repeat_byte(0x22),
    }
}
