//! # bpo-engine: Bonded Price Oracle Lifecycle
//!
//! A reporter bonds two asset amounts that imply an exchange rate. Anyone may
//! challenge that rate by posting an escalating bond at a materially
//! different rate. Once a report has stood unchallenged for the settlement
//! duration, the last rate becomes canonical and escrow is released.
//!
//! ## Modules
//!
//! - **Engine** (`engine.rs`): [`PriceOracle`] with `create`,
//!   `submit_initial`, `dispute`, `settle`, fee withdrawal and queries.
//! - **Pricing** (`pricing.rs`): price, escalation, band, and fee math.
//! - **Callback** (`callback.rs`): failure-isolated settlement notifications.
//! - **Events** (`events.rs`): the append-only event log.
//! - **Config** (`config.rs`): protocol constants and host limits.
//! - **Error** (`error.rs`): [`OracleError`] and its [`ErrorKind`] taxonomy.

pub mod callback;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod pricing;

pub use callback::{CallbackFault, CallbackOutcome, GasMeter, Notifiable, SettlementNotice};
pub use config::{ConfigError, OracleConfig};
pub use engine::{CallContext, DisputeRequest, InitialReport, PriceOracle};
pub use error::{ErrorKind, OracleError};
pub use events::{EventLog, OracleEvent, RewardRoute};
