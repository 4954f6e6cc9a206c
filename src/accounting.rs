//! Sales accounting: fee splitting and price quotes
//!
//! Pure integer math over u128 base units. All multiplications are checked;
//! an overflowing computation fails the enclosing operation instead of
//! wrapping.

use crate::types::{Amount, BPS_DENOMINATOR, ONE_TOKEN};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Outcome of splitting a payment between fee and treasury
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Portion forwarded to the fee recipient
    pub fee: Amount,
    /// Portion accrued to the treasury
    pub treasury: Amount,
}

/// Split a payment by a basis-point fee rate
///
/// The fee truncates toward zero; the treasury portion is the remainder, so
/// truncation dust always stays with the treasury and
/// `fee + treasury == payment` holds exactly.
pub fn split(payment: Amount, fee_bps: u32) -> Result<FeeSplit> {
    let fee = payment
        .checked_mul(fee_bps as Amount)
        .ok_or(Error::ArithmeticOverflow("fee split"))?
        / BPS_DENOMINATOR;
    Ok(FeeSplit {
        fee,
        treasury: payment - fee,
    })
}

/// Tokens received for a payment at the configured price per whole token
pub fn quote_tokens_for_payment(payment: Amount, price: Amount) -> Result<Amount> {
    if price == 0 {
        return Err(Error::PriceZero);
    }
    let tokens = payment
        .checked_mul(ONE_TOKEN)
        .ok_or(Error::ArithmeticOverflow("token quote"))?
        / price;
    if tokens == 0 {
        return Err(Error::InsufficientPayment);
    }
    Ok(tokens)
}

/// Payment value of a token amount at the configured price per whole token
pub fn quote_payment_for_tokens(amount: Amount, price: Amount) -> Result<Amount> {
    Ok(amount
        .checked_mul(price)
        .ok_or(Error::ArithmeticOverflow("payment quote"))?
        / ONE_TOKEN)
}
