//! # Price and Escalation Arithmetic
//!
//! Pure functions over 256-bit amounts. All divisions floor; every operation
//! is checked and names itself in the overflow error.

use bpo_core::amount::checked_add;
use bpo_core::{mul_div_floor, ArithmeticError, U256};

/// `amount1 * scale / amount2`.
pub fn price(amount1: U256, amount2: U256, scale: U256) -> Result<U256, ArithmeticError> {
    mul_div_floor(amount1, scale, amount2, "price")
}

/// The asset1 stake the next dispute must post.
///
/// Below the halt threshold the stake grows by `multiplier_percent`;
/// at or above it, by exactly one unit.
pub fn required_amount1(
    old_amount1: U256,
    multiplier_percent: u64,
    halt_threshold: U256,
) -> Result<U256, ArithmeticError> {
    if halt_threshold > old_amount1 {
        mul_div_floor(
            old_amount1,
            U256::from(multiplier_percent),
            U256::from(100u64),
            "escalation",
        )
    } else {
        checked_add(old_amount1, U256::from(1u64), "halted escalation")
    }
}

/// Closed interval of prices a dispute may not land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub lower: U256,
    pub upper: U256,
}

impl PriceBand {
    /// `[max(old - old*rate/precision, 0), old + old*rate/precision]`.
    pub fn around(old_price: U256, fee_rate: u64, precision: U256) -> Result<Self, ArithmeticError> {
        let half_width = mul_div_floor(old_price, U256::from(fee_rate), precision, "price band")?;
        Ok(Self {
            lower: old_price.saturating_sub(half_width),
            upper: checked_add(old_price, half_width, "price band upper")?,
        })
    }

    /// Whether `price` lies strictly outside the band.
    pub fn excludes(&self, price: U256) -> bool {
        price < self.lower || price > self.upper
    }
}

/// Fees charged on the swapped asset of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapFees {
    /// Paid to the displaced reporter.
    pub fee: U256,
    /// Accrued to the treasury.
    pub protocol_fee: U256,
}

impl SwapFees {
    pub fn on(
        old_amount: U256,
        fee_rate: u64,
        protocol_fee_rate: u64,
        precision: U256,
    ) -> Result<Self, ArithmeticError> {
        Ok(Self {
            fee: mul_div_floor(old_amount, U256::from(fee_rate), precision, "swap fee")?,
            protocol_fee: mul_div_floor(
                old_amount,
                U256::from(protocol_fee_rate),
                precision,
                "protocol fee",
            )?,
        })
    }
}
