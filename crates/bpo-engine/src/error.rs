//! # Oracle Error Types
//!
//! Every failure is all-or-nothing: no state or funds change when an entry
//! point returns `Err`. Each variant carries the report and the values that
//! failed the check, and classifies into an [`ErrorKind`] for programmatic
//! handling.

use bpo_core::{AccountId, ArithmeticError, AssetId, CanonicalizationError, ReportId, U256};
use bpo_custody::{CustodyError, TreasuryError};
use bpo_state::{PhaseError, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad creation or report parameters.
    ConfigValidation,
    /// Operation attempted in the wrong lifecycle state.
    StateConflict,
    /// Outside the required window, or a second report in one tick.
    TimingViolation,
    /// Hash or expected-amount mismatch.
    IntegrityMismatch,
    /// Escalation amount or price band violated.
    BoundsViolation,
    /// A strict value transfer failed.
    TransferFailure,
    /// Not enough budget headroom for a guaranteed callback stipend.
    GasProvisioningFailure,
    /// Caller lacks the privilege for this operation.
    AccessControl,
}

#[derive(Error, Debug)]
pub enum OracleError {
    /// Creation payment too small.
    #[error("creation payment {provided} must exceed {floor} ({what})")]
    InsufficientBond {
        provided: U256,
        floor: U256,
        what: &'static str,
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown report {0}")]
    UnknownReport(ReportId),

    #[error("{report} already has a reporter")]
    AlreadyReported { report: ReportId },

    #[error("{report} has no reporter")]
    NoReporter { report: ReportId },

    #[error("{report} is already settled or distributed")]
    AlreadySettled { report: ReportId },

    #[error("{report} is not settled")]
    NotSettled { report: ReportId },

    #[error("re-entrant call into {operation}")]
    Reentrancy { operation: &'static str },

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("{report}: {reason} (now {now}, boundary {boundary})")]
    Timing {
        report: ReportId,
        reason: &'static str,
        now: u64,
        boundary: u64,
    },

    #[error("{report}: integrity hash mismatch")]
    HashMismatch { report: ReportId },

    #[error("{report}: expected amount2 {expected}, stored {actual}")]
    StaleAmount {
        report: ReportId,
        expected: U256,
        actual: U256,
    },

    #[error("{report}: {asset} is not in the report's pair")]
    AssetNotInPair { report: ReportId, asset: AssetId },

    #[error("{report}: escalation requires amount1 {required}, got {provided}")]
    Escalation {
        report: ReportId,
        required: U256,
        provided: U256,
    },

    #[error("{report}: new amount2 must be non-zero")]
    ZeroAmount { report: ReportId },

    #[error("{report}: price {price} inside band [{lower}, {upper}]")]
    PriceWithinBand {
        report: ReportId,
        price: U256,
        lower: U256,
        upper: U256,
    },

    #[error(transparent)]
    Transfer(#[from] CustodyError),

    #[error("callback needs {required} gas after reserve, {available} available")]
    GasProvisioning { required: u64, available: u64 },

    #[error("{caller} is not authorized (owner {owner})")]
    Unauthorized { caller: AccountId, owner: AccountId },

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error("integrity hash: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl OracleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBond { .. } | Self::InvalidParameters(_) | Self::Config(_) => {
                ErrorKind::ConfigValidation
            }
            Self::UnknownReport(_)
            | Self::AlreadyReported { .. }
            | Self::NoReporter { .. }
            | Self::AlreadySettled { .. }
            | Self::NotSettled { .. }
            | Self::Reentrancy { .. }
            | Self::Phase(_) => ErrorKind::StateConflict,
            Self::Timing { .. } => ErrorKind::TimingViolation,
            Self::HashMismatch { .. } | Self::StaleAmount { .. } | Self::Canonicalization(_) => {
                ErrorKind::IntegrityMismatch
            }
            Self::AssetNotInPair { .. }
            | Self::Escalation { .. }
            | Self::ZeroAmount { .. }
            | Self::PriceWithinBand { .. }
            | Self::Arithmetic(_) => ErrorKind::BoundsViolation,
            Self::Transfer(_) => ErrorKind::TransferFailure,
            Self::GasProvisioning { .. } => ErrorKind::GasProvisioningFailure,
            Self::Unauthorized { .. } => ErrorKind::AccessControl,
        }
    }
}

impl From<RegistryError> for OracleError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownReport(id) => Self::UnknownReport(id),
        }
    }
}

impl From<TreasuryError> for OracleError {
    fn from(err: TreasuryError) -> Self {
        match err {
            TreasuryError::Unauthorized { caller, owner } => Self::Unauthorized { caller, owner },
            TreasuryError::Arithmetic(e) => Self::Arithmetic(e),
        }
    }
}
