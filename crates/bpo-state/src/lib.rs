//! # bpo-state: Report Records and Lifecycle
//!
//! Holds everything the oracle remembers about a report, independent of how
//! assets move or who is calling.
//!
//! - **Phase** (`phase.rs`): `Pending → Reported → Settled → Distributed`,
//!   with a direct `Reported → Distributed` edge for late settlement.
//!   Distributed is terminal.
//!
//! - **Report** (`report.rs`): immutable [`ReportConfig`], live
//!   [`ReportStatus`], [`ExtraData`], and the integrity commitment callers
//!   must echo back when reporting or disputing.
//!
//! - **Registry** (`registry.rs`): the arena of records with sequential ids,
//!   dispute history, and escrow totals.

pub mod phase;
pub mod registry;
pub mod report;

pub use phase::{PhaseError, ReportPhase};
pub use registry::{RegistryError, ReportRegistry};
pub use report::{
    integrity_hash, CallbackSpec, DisputeSnapshot, ExtraData, ReportConfig, ReportParams,
    ReportRecord, ReportStatus,
};
