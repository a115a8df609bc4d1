//! # Report Registry
//!
//! Arena of report records keyed by sequential [`ReportId`], plus the
//! per-report dispute history. Identifiers start at `1` and are never reused.

use std::collections::BTreeMap;

use bpo_core::amount::checked_add;
use bpo_core::{ArithmeticError, AssetId, ReportId, U256};
use thiserror::Error;

use crate::report::{DisputeSnapshot, ExtraData, ReportConfig, ReportRecord, ReportStatus};

/// Registry lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No report exists under this identifier.
    #[error("unknown report {0}")]
    UnknownReport(ReportId),
}

/// All reports known to one oracle instance.
#[derive(Debug, Clone)]
pub struct ReportRegistry {
    next_id: ReportId,
    reports: BTreeMap<ReportId, ReportRecord>,
    history: BTreeMap<ReportId, Vec<DisputeSnapshot>>,
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self {
            next_id: ReportId(1),
            reports: BTreeMap::new(),
            history: BTreeMap::new(),
        }
    }

    /// Identifier the next [`insert`](Self::insert) will assign.
    pub fn next_id(&self) -> ReportId {
        self.next_id
    }

    /// Store a new `Pending` report and return its identifier.
    pub fn insert(&mut self, config: ReportConfig, extra: ExtraData) -> ReportId {
        let id = self.next_id;
        self.next_id = id.next();
        self.reports.insert(
            id,
            ReportRecord {
                id,
                config,
                status: ReportStatus::pending(),
                extra,
            },
        );
        tracing::debug!(report = %id, "report registered");
        id
    }

    pub fn get(&self, id: ReportId) -> Option<&ReportRecord> {
        self.reports.get(&id)
    }

    pub fn require(&self, id: ReportId) -> Result<&ReportRecord, RegistryError> {
        self.reports.get(&id).ok_or(RegistryError::UnknownReport(id))
    }

    pub fn require_mut(&mut self, id: ReportId) -> Result<&mut ReportRecord, RegistryError> {
        self.reports
            .get_mut(&id)
            .ok_or(RegistryError::UnknownReport(id))
    }

    /// Put back a previously cloned record, undoing any mutation since.
    pub fn restore(&mut self, record: ReportRecord) {
        self.reports.insert(record.id, record);
    }

    /// Append a history entry.
    pub fn push_history(&mut self, id: ReportId, snapshot: DisputeSnapshot) {
        self.history.entry(id).or_default().push(snapshot);
    }

    /// History of a report; empty when tracking is off or nothing was reported.
    pub fn history(&self, id: ReportId) -> &[DisputeSnapshot] {
        self.history.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportRecord> {
        self.reports.values()
    }

    /// Total of `asset` held in escrow across undistributed reports.
    pub fn escrowed(&self, asset: &AssetId) -> Result<U256, ArithmeticError> {
        let mut total = U256::ZERO;
        for record in self.reports.values() {
            if !record.status.holds_escrow() {
                continue;
            }
            if record.config.asset1 == *asset {
                total = checked_add(total, record.status.current_amount1, "escrowed asset1")?;
            }
            if record.config.asset2 == *asset {
                total = checked_add(total, record.status.current_amount2, "escrowed asset2")?;
            }
        }
        Ok(total)
    }
}
