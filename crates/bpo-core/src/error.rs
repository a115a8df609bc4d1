//! # Core Errors
//!
//! Arithmetic errors name the operation that failed. Parse errors carry the
//! offending input verbatim.

use thiserror::Error;

/// Failure of a foundational operation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    /// An amount string could not be parsed.
    #[error("invalid amount: \"{0}\"")]
    InvalidAmount(String),

    /// An identifier string could not be parsed.
    #[error("invalid identifier: \"{0}\"")]
    InvalidIdentifier(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// A float reached a hash preimage.
    #[error("float {0} in hash preimage; amounts must be U256")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Checked 256-bit arithmetic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    /// A multiplication or addition exceeded 2^256 - 1.
    #[error("overflow in {operation}")]
    Overflow {
        /// The operation that overflowed (e.g. "mul_div", "add").
        operation: &'static str,
    },

    /// A subtraction went below zero.
    #[error("underflow in {operation}")]
    Underflow {
        /// The operation that underflowed.
        operation: &'static str,
    },

    /// Division by zero.
    #[error("division by zero in {operation}")]
    DivisionByZero {
        /// The operation that divided by zero.
        operation: &'static str,
    },
}
