//! # Event Log
//!
//! Append-only record of every accepted operation. Each event carries the
//! effective parameters and computed values, enough for an observer to
//! rebuild a report's state without reading engine internals.

use std::collections::BTreeMap;

use bpo_core::{AccountId, AssetId, ContentDigest, ReportId, U256};
use bpo_state::{CallbackSpec, ReportConfig};
use serde::{Deserialize, Serialize};

/// Where a settled report's reporter reward went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardRoute {
    InitialReporter,
    NativePool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OracleEvent {
    Created {
        report_id: ReportId,
        creator: AccountId,
        config: ReportConfig,
        integrity_hash: ContentDigest,
        track_disputes: bool,
        keep_fee_on_dispute: bool,
        callback: Option<CallbackSpec>,
    },
    InitialReportSubmitted {
        report_id: ReportId,
        reporter: AccountId,
        payer: AccountId,
        amount1: U256,
        amount2: U256,
        price: U256,
        tick: u64,
    },
    Disputed {
        report_id: ReportId,
        disputer: AccountId,
        payer: AccountId,
        previous_reporter: AccountId,
        swapped_asset: AssetId,
        new_amount1: U256,
        new_amount2: U256,
        old_price: U256,
        new_price: U256,
        fee: U256,
        protocol_fee: U256,
        tick: u64,
        dispute_count: u64,
    },
    Settled {
        report_id: ReportId,
        price: U256,
        settlement_tick: u64,
    },
    CallbackExecuted {
        report_id: ReportId,
        target: AccountId,
        success: bool,
        gas_used: u64,
        fault: Option<String>,
    },
    Distributed {
        report_id: ReportId,
        settler: AccountId,
        settler_reward: U256,
        reporter_reward: U256,
        reward_route: RewardRoute,
        reporter: AccountId,
        amount1: U256,
        amount2: U256,
    },
    FeeRecipientUpdated {
        old: AccountId,
        new: AccountId,
    },
    /// `asset` is `None` for the native pool.
    FeesWithdrawn {
        asset: Option<AssetId>,
        recipient: AccountId,
        amount: U256,
    },
}

impl OracleEvent {
    /// Report this event belongs to, if any.
    pub fn report_id(&self) -> Option<ReportId> {
        match self {
            Self::Created { report_id, .. }
            | Self::InitialReportSubmitted { report_id, .. }
            | Self::Disputed { report_id, .. }
            | Self::Settled { report_id, .. }
            | Self::CallbackExecuted { report_id, .. }
            | Self::Distributed { report_id, .. } => Some(*report_id),
            Self::FeeRecipientUpdated { .. } | Self::FeesWithdrawn { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::InitialReportSubmitted { .. } => "initial_report_submitted",
            Self::Disputed { .. } => "disputed",
            Self::Settled { .. } => "settled",
            Self::CallbackExecuted { .. } => "callback_executed",
            Self::Distributed { .. } => "distributed",
            Self::FeeRecipientUpdated { .. } => "fee_recipient_updated",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
        }
    }
}

/// Append-only event log indexed by report.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<OracleEvent>,
    by_report: BTreeMap<ReportId, Vec<usize>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: OracleEvent) {
        tracing::trace!(event = event.name(), report = ?event.report_id(), "event");
        if let Some(id) = event.report_id() {
            self.by_report.entry(id).or_default().push(self.entries.len());
        }
        self.entries.push(event);
    }

    pub fn all(&self) -> &[OracleEvent] {
        &self.entries
    }

    pub fn for_report(&self, id: ReportId) -> Vec<OracleEvent> {
        self.by_report
            .get(&id)
            .map(|idx| idx.iter().map(|&i| self.entries[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Drop every entry from `len` onwards.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        for indices in self.by_report.values_mut() {
            indices.retain(|&i| i < len);
        }
        self.by_report.retain(|_, indices| !indices.is_empty());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
