//! # Custody Error Types
//!
//! Every variant names the asset or account involved and, for balance
//! failures, both the required and available amounts so an operator can
//! tell a missing approval from an empty wallet.

use bpo_core::{AccountId, ArithmeticError, AssetId, U256};
use thiserror::Error;

/// Failures reported by an [`AssetLedger`](crate::ledger::AssetLedger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Source account does not hold enough of the asset.
    #[error("{account} holds {available} of {asset}, needs {required}")]
    InsufficientBalance {
        asset: AssetId,
        account: AccountId,
        required: U256,
        available: U256,
    },

    /// Spender has not been approved for enough of the owner's asset.
    #[error("{spender} may pull {available} of {asset} from {owner}, needs {required}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        required: U256,
        available: U256,
    },

    /// The ledger refuses to move funds to or from this account.
    #[error("{account} is frozen for {asset}")]
    Frozen { asset: AssetId, account: AccountId },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Failures reported by a [`NativeBank`](crate::native::NativeBank).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeTransferError {
    /// Recipient refused the direct payment.
    #[error("{to} rejected native payment of {amount}")]
    Rejected { to: AccountId, amount: U256 },

    /// The wrapped-native fallback sink is not accepting credits.
    #[error("wrapped-native sink unavailable for {to}")]
    FallbackUnavailable { to: AccountId },

    #[error("{account} holds {available} native, needs {required}")]
    InsufficientFunds {
        account: AccountId,
        required: U256,
        available: U256,
    },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Top-level custody error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("asset transfer failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("native transfer failed: {0}")]
    Native(#[from] NativeTransferError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Fee treasury failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    /// Only the owner may change the fee recipient.
    #[error("{caller} is not the treasury owner ({owner})")]
    Unauthorized { caller: AccountId, owner: AccountId },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}
