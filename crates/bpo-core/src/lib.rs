//! # bpo-core: Foundational Types for the Bonded Price Oracle
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate builds on; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ReportId`, `AccountId`, and
//!    `AssetId` are distinct types. An asset address cannot be passed where a
//!    participant address is expected.
//!
//! 2. **256-bit amounts with checked arithmetic.** All value math goes through
//!    [`amount`], which returns `ArithmeticError` instead of wrapping.
//!
//! 3. **`CanonicalBytes` newtype.** Every integrity hash flows through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for digests.
//!
//! 4. **One time unit per report.** [`TimeUnit`] selects wall-clock seconds or
//!    count-based ticks, and [`Clock`] answers in either.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use alloy_primitives::U256;
pub use amount::{mul_div_floor, parse_amount, Amount, RATE_PRECISION, PRICE_SCALE};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{ArithmeticError, CanonicalizationError, CoreError};
pub use identity::{AccountId, AssetId, ReportId};
pub use temporal::{Clock, ManualClock, SystemClock, TimeUnit};
