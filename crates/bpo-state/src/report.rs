//! # Report Records
//!
//! A report is one price-discovery instance. Its record has three parts:
//!
//! - [`ReportConfig`]: immutable economics fixed at creation.
//! - [`ReportStatus`]: the live position: amounts, price, reporter, ticks,
//!   flags, and the [`ReportPhase`].
//! - [`ExtraData`]: integrity commitment, creator, dispute tracking, and the
//!   optional settlement callback.
//!
//! ## Security Invariant
//!
//! [`integrity_hash`] commits to every economically relevant field plus the
//! creator. Callers echo it back on `submit_initial` and `dispute`; a caller
//! who built their transaction against different parameters is rejected.

use bpo_core::{
    sha256_digest, AccountId, AssetId, CanonicalBytes, CanonicalizationError, ContentDigest,
    ReportId, TimeUnit, U256,
};
use serde::{Deserialize, Serialize};

use crate::phase::{PhaseError, ReportPhase};

/// Registered settlement consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackSpec {
    /// Account of the consumer to notify.
    pub target: AccountId,
    /// Four-byte selector prefixed to the encoded notification.
    pub selector: [u8; 4],
    /// Exact execution budget granted to the consumer.
    pub gas_limit: u64,
}

/// Parameters supplied by a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    pub asset1: AssetId,
    pub asset2: AssetId,
    /// Amount of asset1 the initial reporter must bond, exactly.
    pub exact_asset1_amount: U256,
    /// Swap fee and price-band half-width, parts per 1e7.
    pub fee_rate: u64,
    /// Pre-halt escalation factor in percent (e.g. 110 for 1.1x).
    pub escalation_multiplier_percent: u64,
    /// Time units a report must stand unchallenged before it can settle.
    pub settlement_duration: u64,
    /// Once asset1 stake reaches this level, escalation becomes `+1`.
    pub escalation_halt_threshold: U256,
    /// Time units after a report before it may be disputed.
    pub dispute_delay: u64,
    /// Protocol cut of each swap, parts per 1e7.
    pub protocol_fee_rate: u64,
    /// Native reward paid to whoever calls `settle`.
    pub settler_reward: U256,
    pub time_unit: TimeUnit,
    /// Record a history snapshot for each report and dispute.
    pub track_disputes: bool,
    pub callback: Option<CallbackSpec>,
    /// Pay the initial reporter's reward even when the report was disputed.
    pub keep_fee_on_dispute: bool,
}

/// Immutable configuration of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub asset1: AssetId,
    pub asset2: AssetId,
    pub exact_asset1_amount: U256,
    pub fee_rate: u64,
    pub escalation_multiplier_percent: u64,
    pub settlement_duration: u64,
    pub escalation_halt_threshold: U256,
    pub dispute_delay: u64,
    pub protocol_fee_rate: u64,
    pub settler_reward: U256,
    /// Creation payment minus the settler reward.
    pub reporter_reward: U256,
    pub creation_tick: u64,
    pub time_unit: TimeUnit,
}

impl ReportConfig {
    /// Build the stored configuration from creator parameters.
    pub fn from_params(params: &ReportParams, reporter_reward: U256, creation_tick: u64) -> Self {
        Self {
            asset1: params.asset1,
            asset2: params.asset2,
            exact_asset1_amount: params.exact_asset1_amount,
            fee_rate: params.fee_rate,
            escalation_multiplier_percent: params.escalation_multiplier_percent,
            settlement_duration: params.settlement_duration,
            escalation_halt_threshold: params.escalation_halt_threshold,
            dispute_delay: params.dispute_delay,
            protocol_fee_rate: params.protocol_fee_rate,
            settler_reward: params.settler_reward,
            reporter_reward,
            creation_tick,
            time_unit: params.time_unit,
        }
    }

    /// Whether `asset` is one of the report's pair.
    pub fn holds_asset(&self, asset: &AssetId) -> bool {
        *asset == self.asset1 || *asset == self.asset2
    }
}

/// Fields covered by the integrity hash.
#[derive(Serialize)]
struct IntegrityPreimage<'a> {
    domain: &'static str,
    asset1: &'a AssetId,
    asset2: &'a AssetId,
    exact_asset1_amount: &'a U256,
    fee_rate: u64,
    escalation_multiplier_percent: u64,
    settlement_duration: u64,
    escalation_halt_threshold: &'a U256,
    dispute_delay: u64,
    protocol_fee_rate: u64,
    settler_reward: &'a U256,
    reporter_reward: &'a U256,
    time_unit: TimeUnit,
    track_disputes: bool,
    keep_fee_on_dispute: bool,
    callback: Option<&'a CallbackSpec>,
    creator: &'a AccountId,
}

/// Compute the integrity commitment for a report.
pub fn integrity_hash(
    config: &ReportConfig,
    track_disputes: bool,
    keep_fee_on_dispute: bool,
    callback: Option<&CallbackSpec>,
    creator: &AccountId,
) -> Result<ContentDigest, CanonicalizationError> {
    let preimage = IntegrityPreimage {
        domain: "bpo.report.v1",
        asset1: &config.asset1,
        asset2: &config.asset2,
        exact_asset1_amount: &config.exact_asset1_amount,
        fee_rate: config.fee_rate,
        escalation_multiplier_percent: config.escalation_multiplier_percent,
        settlement_duration: config.settlement_duration,
        escalation_halt_threshold: &config.escalation_halt_threshold,
        dispute_delay: config.dispute_delay,
        protocol_fee_rate: config.protocol_fee_rate,
        settler_reward: &config.settler_reward,
        reporter_reward: &config.reporter_reward,
        time_unit: config.time_unit,
        track_disputes,
        keep_fee_on_dispute,
        callback,
        creator,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&preimage)?))
}

/// Live, mutable state of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatus {
    pub phase: ReportPhase,
    pub current_amount1: U256,
    pub current_amount2: U256,
    /// `current_amount1 * PRICE_SCALE / current_amount2`.
    pub price: U256,
    pub current_reporter: Option<AccountId>,
    pub initial_reporter: Option<AccountId>,
    /// Tick of the most recent accepted report or dispute.
    pub last_report_tick: u64,
    pub initial_report_tick: u64,
    pub settlement_tick: u64,
    pub is_settled: bool,
    pub dispute_occurred: bool,
    pub is_distributed: bool,
}

impl ReportStatus {
    /// Status of a freshly created report.
    pub fn pending() -> Self {
        Self {
            phase: ReportPhase::Pending,
            current_amount1: U256::ZERO,
            current_amount2: U256::ZERO,
            price: U256::ZERO,
            current_reporter: None,
            initial_reporter: None,
            last_report_tick: 0,
            initial_report_tick: 0,
            settlement_tick: 0,
            is_settled: false,
            dispute_occurred: false,
            is_distributed: false,
        }
    }

    /// Record the first report (`Pending → Reported`).
    pub fn record_initial(
        &mut self,
        reporter: AccountId,
        amount1: U256,
        amount2: U256,
        price: U256,
        tick: u64,
    ) -> Result<(), PhaseError> {
        self.phase = self.phase.try_transition(ReportPhase::Reported)?;
        self.current_amount1 = amount1;
        self.current_amount2 = amount2;
        self.price = price;
        self.current_reporter = Some(reporter);
        self.initial_reporter = Some(reporter);
        self.last_report_tick = tick;
        self.initial_report_tick = tick;
        Ok(())
    }

    /// Replace the position with an accepted dispute.
    pub fn record_dispute(
        &mut self,
        disputer: AccountId,
        amount1: U256,
        amount2: U256,
        price: U256,
        tick: u64,
    ) -> Result<(), PhaseError> {
        if self.phase != ReportPhase::Reported {
            return Err(PhaseError::WrongPhase {
                expected: ReportPhase::Reported,
                actual: self.phase,
            });
        }
        self.current_amount1 = amount1;
        self.current_amount2 = amount2;
        self.price = price;
        self.current_reporter = Some(disputer);
        self.last_report_tick = tick;
        self.dispute_occurred = true;
        Ok(())
    }

    /// Freeze the price (`Reported → Settled`).
    pub fn mark_settled(&mut self, tick: u64) -> Result<(), PhaseError> {
        self.phase = self.phase.try_transition(ReportPhase::Settled)?;
        self.is_settled = true;
        self.settlement_tick = tick;
        Ok(())
    }

    /// Release escrow (`→ Distributed`). Can happen exactly once.
    pub fn mark_distributed(&mut self) -> Result<(), PhaseError> {
        self.phase = self.phase.try_transition(ReportPhase::Distributed)?;
        self.is_distributed = true;
        Ok(())
    }

    /// Whether escrow for this report is still held.
    pub fn holds_escrow(&self) -> bool {
        self.current_reporter.is_some() && !self.is_distributed
    }
}

/// Metadata that is not part of the economic position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData {
    pub integrity_hash: ContentDigest,
    pub creator: AccountId,
    pub track_disputes: bool,
    /// Accepted disputes so far.
    pub dispute_count: u64,
    pub callback: Option<CallbackSpec>,
    pub keep_fee_on_dispute: bool,
}

/// One entry of a report's dispute history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeSnapshot {
    pub amount1: U256,
    pub amount2: U256,
    /// `None` for the initial report.
    pub swapped_asset: Option<AssetId>,
    pub reporter: AccountId,
    pub tick: u64,
}

/// A complete report record as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: ReportId,
    pub config: ReportConfig,
    pub status: ReportStatus,
    pub extra: ExtraData,
}
