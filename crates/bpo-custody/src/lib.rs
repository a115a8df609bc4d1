//! # bpo-custody: Escrow and Fee Custody
//!
//! Everything that moves value on behalf of the oracle.
//!
//! - **Ledger** (`ledger.rs`): the [`AssetLedger`] host seam with atomic
//!   batch application, plus an in-memory implementation.
//! - **Native** (`native.rs`): the [`NativeBank`] host seam with a
//!   wrapped-native fallback route, plus an in-memory implementation.
//! - **Custodian** (`custodian.rs`): escrow account, [`TransferPlan`]
//!   assembly, strict and best-effort native payments.
//! - **Treasury** (`treasury.rs`): protocol fee pools and the owner-gated
//!   fee recipient.

pub mod custodian;
pub mod error;
pub mod ledger;
pub mod native;
pub mod treasury;

pub use custodian::{Custodian, NativeDelivery, TransferPlan};
pub use error::{CustodyError, LedgerError, NativeTransferError, TreasuryError};
pub use ledger::{AssetLedger, InMemoryAssetLedger, LedgerTransfer};
pub use native::{InMemoryNativeBank, NativeBank};
pub use treasury::FeeTreasury;
