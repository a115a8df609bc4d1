//! # Lifecycle Engine
//!
//! [`PriceOracle`] runs every report through
//! `create → submit_initial → dispute* → settle`.
//!
//! ## Execution Model
//!
//! Each mutating entry point follows the same shape:
//!
//! 1. **Validate** against a snapshot of the record.
//! 2. **Stage** the new status and treasury on copies.
//! 3. **Transfer** assets through an atomic [`TransferPlan`](bpo_custody::TransferPlan).
//! 4. **Commit** the staged copies and append events.
//!
//! A failure in steps 1–3 leaves state and funds untouched. Settlement is the
//! one exception to the ordering: effects are committed and the callback runs
//! before escrow is released, and a failed release restores the saved record.
//!
//! ## Concurrency
//!
//! State lives behind a [`ReentrantMutex`]. Other threads block; the same
//! thread re-entering a mutating entry point (from a consumer callback or a
//! ledger hook) fails fast with [`OracleError::Reentrancy`]. No `RefCell`
//! borrow is held across a call into the ledger, the bank, or a consumer, so
//! views stay readable from inside a callback.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use bpo_core::amount::{checked_add, checked_sub, checked_sum};
use bpo_core::{AccountId, AssetId, Clock, ContentDigest, ReportId, U256};
use bpo_custody::{Custodian, FeeTreasury, NativeDelivery};
use bpo_state::{
    integrity_hash, CallbackSpec, DisputeSnapshot, ExtraData, ReportConfig, ReportParams,
    ReportRecord, ReportRegistry, ReportStatus,
};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};

use crate::callback::{check_headroom, dispatch, Notifiable, SettlementNotice};
use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::events::{EventLog, OracleEvent, RewardRoute};
use crate::pricing::{price, required_amount1, PriceBand, SwapFees};

/// Who is calling, with what attached value and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    /// Native value attached to the call.
    pub value: U256,
    /// Execution budget; `None` uses the configured default.
    pub gas: Option<u64>,
}

impl CallContext {
    pub fn new(caller: AccountId) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            gas: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// Arguments of [`PriceOracle::submit_initial`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialReport {
    pub amount1: U256,
    pub amount2: U256,
    pub integrity_hash: ContentDigest,
    /// Beneficiary if different from the caller.
    pub reporter: Option<AccountId>,
}

/// Arguments of [`PriceOracle::dispute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeRequest {
    pub asset_to_swap: AssetId,
    pub new_amount1: U256,
    pub new_amount2: U256,
    /// Beneficiary if different from the caller.
    pub disputer: Option<AccountId>,
    /// The amount2 the caller saw; guards against racing another dispute.
    pub expected_amount2: U256,
    pub integrity_hash: ContentDigest,
}

#[derive(Debug)]
struct OracleState {
    registry: ReportRegistry,
    treasury: FeeTreasury,
    events: EventLog,
}

struct Inner {
    entered: Cell<bool>,
    state: RefCell<OracleState>,
}

/// Marks a mutating entry point as in progress on this thread.
struct Entry<'a> {
    guard: ReentrantMutexGuard<'a, Inner>,
}

impl Entry<'_> {
    fn state(&self) -> std::cell::Ref<'_, OracleState> {
        self.guard.state.borrow()
    }

    fn state_mut(&self) -> std::cell::RefMut<'_, OracleState> {
        self.guard.state.borrow_mut()
    }
}

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}

/// The bonded price oracle.
pub struct PriceOracle {
    config: OracleConfig,
    clock: Arc<dyn Clock>,
    custodian: Custodian,
    consumers: RwLock<HashMap<AccountId, Arc<dyn Notifiable>>>,
    inner: ReentrantMutex<Inner>,
}

impl std::fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceOracle")
            .field("config", &self.config)
            .field("custodian", &self.custodian)
            .finish_non_exhaustive()
    }
}

impl PriceOracle {
    /// Build an oracle. `owner` may change the fee recipient, which starts
    /// out as the owner.
    pub fn new(
        config: OracleConfig,
        clock: Arc<dyn Clock>,
        custodian: Custodian,
        owner: AccountId,
    ) -> Result<Self, OracleError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            custodian,
            consumers: RwLock::new(HashMap::new()),
            inner: ReentrantMutex::new(Inner {
                entered: Cell::new(false),
                state: RefCell::new(OracleState {
                    registry: ReportRegistry::new(),
                    treasury: FeeTreasury::new(owner, owner),
                    events: EventLog::new(),
                }),
            }),
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn custodian(&self) -> &Custodian {
        &self.custodian
    }

    /// Attach the consumer notified for callbacks targeting `target`.
    pub fn register_consumer(&self, target: AccountId, consumer: Arc<dyn Notifiable>) {
        self.consumers.write().insert(target, consumer);
    }

    pub fn unregister_consumer(&self, target: &AccountId) {
        self.consumers.write().remove(target);
    }

    fn enter(&self, operation: &'static str) -> Result<Entry<'_>, OracleError> {
        let guard = self.inner.lock();
        if guard.entered.replace(true) {
            tracing::warn!(operation, "re-entrant call rejected");
            return Err(OracleError::Reentrancy { operation });
        }
        Ok(Entry { guard })
    }

    fn view<R>(&self, f: impl FnOnce(&OracleState) -> R) -> R {
        let guard = self.inner.lock();
        let state = guard.state.borrow();
        f(&state)
    }

    // ── create ─────────────────────────────────────────────────────────

    /// Open a new report, escrowing the attached creation payment.
    pub fn create(&self, ctx: &CallContext, params: ReportParams) -> Result<ReportId, OracleError> {
        let entry = self.enter("create")?;
        self.create_inner(&entry, ctx, params)
            .inspect_err(|e| tracing::debug!(error = %e, "create rejected"))
    }

    fn create_inner(
        &self,
        entry: &Entry<'_>,
        ctx: &CallContext,
        params: ReportParams,
    ) -> Result<ReportId, OracleError> {
        let floor = U256::from(self.config.min_creation_value);
        if ctx.value <= floor {
            return Err(OracleError::InsufficientBond {
                provided: ctx.value,
                floor,
                what: "minimum creation value",
            });
        }
        if params.exact_asset1_amount.is_zero() {
            return Err(invalid("exact_asset1_amount must be non-zero"));
        }
        if params.asset1 == params.asset2 {
            return Err(invalid("asset1 and asset2 must differ"));
        }
        if params.settlement_duration < params.dispute_delay {
            return Err(invalid("settlement_duration must be at least dispute_delay"));
        }
        if ctx.value <= params.settler_reward {
            return Err(OracleError::InsufficientBond {
                provided: ctx.value,
                floor: params.settler_reward,
                what: "settler reward",
            });
        }
        self.validate_extras(&params)?;

        let reporter_reward = checked_sub(ctx.value, params.settler_reward, "reporter reward")?;
        let tick = self.clock.now(params.time_unit);
        let config = ReportConfig::from_params(&params, reporter_reward, tick);
        let hash = integrity_hash(
            &config,
            params.track_disputes,
            params.keep_fee_on_dispute,
            params.callback.as_ref(),
            &ctx.caller,
        )?;

        self.custodian.collect_native(&ctx.caller, ctx.value)?;

        let mut state = entry.state_mut();
        let extra = ExtraData {
            integrity_hash: hash,
            creator: ctx.caller,
            track_disputes: params.track_disputes,
            dispute_count: 0,
            callback: params.callback.clone(),
            keep_fee_on_dispute: params.keep_fee_on_dispute,
        };
        let id = state.registry.insert(config.clone(), extra);
        state.events.push(OracleEvent::Created {
            report_id: id,
            creator: ctx.caller,
            config,
            integrity_hash: hash,
            track_disputes: params.track_disputes,
            keep_fee_on_dispute: params.keep_fee_on_dispute,
            callback: params.callback,
        });
        tracing::info!(report_id = %id, creator = %ctx.caller, tick, "report created");
        Ok(id)
    }

    fn validate_extras(&self, params: &ReportParams) -> Result<(), OracleError> {
        if params.settlement_duration == 0 {
            return Err(invalid("settlement_duration must be non-zero"));
        }
        if params.escalation_multiplier_percent <= 100 {
            return Err(invalid("escalation_multiplier_percent must exceed 100"));
        }
        if params.fee_rate > self.config.rate_precision {
            return Err(invalid("fee_rate exceeds rate precision"));
        }
        if params.protocol_fee_rate > self.config.rate_precision {
            return Err(invalid("protocol_fee_rate exceeds rate precision"));
        }
        if let Some(cb) = &params.callback {
            if cb.gas_limit > self.config.max_callback_gas {
                return Err(OracleError::InvalidParameters(format!(
                    "callback gas limit {} exceeds maximum {}",
                    cb.gas_limit, self.config.max_callback_gas
                )));
            }
        }
        Ok(())
    }

    // ── submit_initial ─────────────────────────────────────────────────

    /// Become the first reporter, escrowing both amounts from the caller.
    pub fn submit_initial(
        &self,
        ctx: &CallContext,
        id: ReportId,
        report: InitialReport,
    ) -> Result<(), OracleError> {
        let entry = self.enter("submit_initial")?;
        self.submit_initial_inner(&entry, ctx, id, report)
            .inspect_err(|e| tracing::debug!(report_id = %id, error = %e, "initial report rejected"))
    }

    fn submit_initial_inner(
        &self,
        entry: &Entry<'_>,
        ctx: &CallContext,
        id: ReportId,
        report: InitialReport,
    ) -> Result<(), OracleError> {
        let record = entry.state().registry.require(id)?.clone();
        if record.status.current_reporter.is_some() {
            return Err(OracleError::AlreadyReported { report: id });
        }
        let config = &record.config;
        if report.amount1 != config.exact_asset1_amount {
            return Err(OracleError::InvalidParameters(format!(
                "amount1 {} must equal {}",
                report.amount1, config.exact_asset1_amount
            )));
        }
        if report.amount2.is_zero() {
            return Err(invalid("amount2 must be non-zero"));
        }
        if report.integrity_hash != record.extra.integrity_hash {
            return Err(OracleError::HashMismatch { report: id });
        }

        let reporter = report.reporter.unwrap_or(ctx.caller);
        let initial_price = price(report.amount1, report.amount2, self.config.price_scale())?;
        let tick = self.clock.now(config.time_unit);

        let mut status = record.status.clone();
        status.record_initial(reporter, report.amount1, report.amount2, initial_price, tick)?;

        let escrow = self.custodian.escrow();
        let mut plan = self.custodian.plan();
        plan.move_asset(config.asset1, ctx.caller, escrow, report.amount1)
            .move_asset(config.asset2, ctx.caller, escrow, report.amount2);
        self.custodian.execute(&plan)?;

        let mut state = entry.state_mut();
        state.registry.require_mut(id)?.status = status;
        if record.extra.track_disputes {
            state.registry.push_history(
                id,
                DisputeSnapshot {
                    amount1: report.amount1,
                    amount2: report.amount2,
                    swapped_asset: None,
                    reporter,
                    tick,
                },
            );
        }
        state.events.push(OracleEvent::InitialReportSubmitted {
            report_id: id,
            reporter,
            payer: ctx.caller,
            amount1: report.amount1,
            amount2: report.amount2,
            price: initial_price,
            tick,
        });
        tracing::info!(report_id = %id, %reporter, price = %initial_price, tick, "initial report accepted");
        Ok(())
    }

    // ── dispute ────────────────────────────────────────────────────────

    /// Challenge the current report with an escalated stake and a price
    /// outside the fee band.
    pub fn dispute(
        &self,
        ctx: &CallContext,
        id: ReportId,
        request: DisputeRequest,
    ) -> Result<(), OracleError> {
        let entry = self.enter("dispute")?;
        self.dispute_inner(&entry, ctx, id, request)
            .inspect_err(|e| tracing::debug!(report_id = %id, error = %e, "dispute rejected"))
    }

    fn dispute_inner(
        &self,
        entry: &Entry<'_>,
        ctx: &CallContext,
        id: ReportId,
        request: DisputeRequest,
    ) -> Result<(), OracleError> {
        let record = entry.state().registry.require(id)?.clone();
        let ReportRecord {
            config,
            status,
            extra,
            ..
        } = &record;

        let previous_reporter = status
            .current_reporter
            .ok_or(OracleError::NoReporter { report: id })?;
        let now = self.clock.now(config.time_unit);
        let deadline = status
            .last_report_tick
            .saturating_add(config.settlement_duration);
        if now >= deadline {
            return Err(timing(id, "reporting window over", now, deadline));
        }
        let earliest = status.last_report_tick.saturating_add(config.dispute_delay);
        if now < earliest {
            return Err(timing(id, "too early", now, earliest));
        }
        if status.is_settled || status.is_distributed {
            return Err(OracleError::AlreadySettled { report: id });
        }
        if !config.holds_asset(&request.asset_to_swap) {
            return Err(OracleError::AssetNotInPair {
                report: id,
                asset: request.asset_to_swap,
            });
        }
        if now == status.last_report_tick {
            return Err(timing(id, "already reported this tick", now, status.last_report_tick));
        }
        if request.expected_amount2 != status.current_amount2 {
            return Err(OracleError::StaleAmount {
                report: id,
                expected: request.expected_amount2,
                actual: status.current_amount2,
            });
        }
        if request.integrity_hash != extra.integrity_hash {
            return Err(OracleError::HashMismatch { report: id });
        }

        let old1 = status.current_amount1;
        let old2 = status.current_amount2;
        let required = required_amount1(
            old1,
            config.escalation_multiplier_percent,
            config.escalation_halt_threshold,
        )?;
        if request.new_amount1 != required {
            return Err(OracleError::Escalation {
                report: id,
                required,
                provided: request.new_amount1,
            });
        }
        if request.new_amount2.is_zero() {
            return Err(OracleError::ZeroAmount { report: id });
        }

        let scale = self.config.price_scale();
        let precision = self.config.rate_precision();
        let old_price = price(old1, old2, scale)?;
        let new_price = price(request.new_amount1, request.new_amount2, scale)?;
        let band = PriceBand::around(old_price, config.fee_rate, precision)?;
        if !band.excludes(new_price) {
            return Err(OracleError::PriceWithinBand {
                report: id,
                price: new_price,
                lower: band.lower,
                upper: band.upper,
            });
        }

        let swap_asset1 = request.asset_to_swap == config.asset1;
        let (swapped, old_t, new_t, other, old_o, new_o) = if swap_asset1 {
            (config.asset1, old1, request.new_amount1, config.asset2, old2, request.new_amount2)
        } else {
            (config.asset2, old2, request.new_amount2, config.asset1, old1, request.new_amount1)
        };
        let fees = SwapFees::on(old_t, config.fee_rate, config.protocol_fee_rate, precision)?;
        let deposit = checked_sum([old_t, fees.fee, fees.protocol_fee, new_t], "dispute deposit")?;
        let payout = checked_sum([old_t, old_t, fees.fee], "displaced reporter payout")?;

        let escrow = self.custodian.escrow();
        let mut plan = self.custodian.plan();
        plan.move_asset(swapped, ctx.caller, escrow, deposit);
        if new_o > old_o {
            plan.move_asset(other, ctx.caller, escrow, checked_sub(new_o, old_o, "top-up")?);
        }
        plan.move_asset(swapped, escrow, previous_reporter, payout);
        if old_o > new_o {
            plan.move_asset(other, escrow, ctx.caller, checked_sub(old_o, new_o, "refund")?);
        }

        let disputer = request.disputer.unwrap_or(ctx.caller);
        let mut next_status = status.clone();
        next_status.record_dispute(
            disputer,
            request.new_amount1,
            request.new_amount2,
            new_price,
            now,
        )?;
        let dispute_count = extra.dispute_count.saturating_add(1);
        let mut treasury = entry.state().treasury.clone();
        treasury.accrue_asset(swapped, fees.protocol_fee)?;

        self.custodian.execute(&plan)?;

        let mut state = entry.state_mut();
        let stored = state.registry.require_mut(id)?;
        stored.status = next_status;
        stored.extra.dispute_count = dispute_count;
        state.treasury = treasury;
        if extra.track_disputes {
            state.registry.push_history(
                id,
                DisputeSnapshot {
                    amount1: request.new_amount1,
                    amount2: request.new_amount2,
                    swapped_asset: Some(swapped),
                    reporter: disputer,
                    tick: now,
                },
            );
        }
        state.events.push(OracleEvent::Disputed {
            report_id: id,
            disputer,
            payer: ctx.caller,
            previous_reporter,
            swapped_asset: swapped,
            new_amount1: request.new_amount1,
            new_amount2: request.new_amount2,
            old_price,
            new_price,
            fee: fees.fee,
            protocol_fee: fees.protocol_fee,
            tick: now,
            dispute_count,
        });
        tracing::info!(
            report_id = %id,
            %disputer,
            %swapped,
            %old_price,
            %new_price,
            tick = now,
            "dispute accepted"
        );
        Ok(())
    }

    // ── settle ─────────────────────────────────────────────────────────

    /// Finalize a report and release its escrow.
    ///
    /// Returns `(price, settlement_tick)` when settled inside the window and
    /// `(0, 0)` when the window had lapsed. Calling again after distribution
    /// returns the same result and moves nothing.
    pub fn settle(&self, ctx: &CallContext, id: ReportId) -> Result<(U256, u64), OracleError> {
        let entry = self.enter("settle")?;
        self.settle_inner(&entry, ctx, id)
            .inspect_err(|e| tracing::debug!(report_id = %id, error = %e, "settle rejected"))
    }

    fn settle_inner(
        &self,
        entry: &Entry<'_>,
        ctx: &CallContext,
        id: ReportId,
    ) -> Result<(U256, u64), OracleError> {
        let saved = entry.state().registry.require(id)?.clone();
        let ReportRecord {
            config,
            status,
            extra,
            ..
        } = &saved;

        let reporter = status
            .current_reporter
            .ok_or(OracleError::NoReporter { report: id })?;
        let now = self.clock.now(config.time_unit);
        let ready = status
            .last_report_tick
            .saturating_add(config.settlement_duration);
        if now < ready {
            return Err(timing(id, "settlement duration not elapsed", now, ready));
        }
        if status.is_distributed {
            return Ok(settlement_result(status.is_settled, status.price, status.settlement_tick));
        }

        let window_end = ready.saturating_add(self.config.settlement_window(config.time_unit));
        let in_window = now <= window_end;
        let callback = extra.callback.as_ref().filter(|_| in_window);
        if let Some(cb) = callback {
            check_headroom(
                ctx.gas.unwrap_or(self.config.default_call_gas),
                cb.gas_limit,
                self.config.callback_overhead_gas,
            )?;
        }

        let mut next_status = status.clone();
        if in_window {
            next_status.mark_settled(now)?;
        }
        next_status.mark_distributed()?;

        let route = if !status.dispute_occurred || extra.keep_fee_on_dispute {
            RewardRoute::InitialReporter
        } else {
            RewardRoute::NativePool
        };
        let saved_treasury = entry.state().treasury.clone();
        let mut treasury = saved_treasury.clone();
        if route == RewardRoute::NativePool {
            treasury.accrue_native(config.reporter_reward)?;
        }
        let events_mark = entry.state().events.len();

        {
            let mut state = entry.state_mut();
            state.registry.require_mut(id)?.status = next_status.clone();
            state.treasury = treasury;
            if in_window {
                state.events.push(OracleEvent::Settled {
                    report_id: id,
                    price: next_status.price,
                    settlement_tick: now,
                });
            }
        }
        if in_window {
            tracing::info!(report_id = %id, price = %next_status.price, tick = now, "report settled");
        } else {
            tracing::info!(report_id = %id, tick = now, window_end, "settlement window lapsed");
        }

        if let Some(cb) = callback {
            self.run_callback(entry, id, cb, config, &next_status);
        }

        let escrow = self.custodian.escrow();
        let mut plan = self.custodian.plan();
        plan.move_asset(config.asset1, escrow, reporter, status.current_amount1)
            .move_asset(config.asset2, escrow, reporter, status.current_amount2);
        if let Err(err) = self.custodian.execute(&plan) {
            let mut state = entry.state_mut();
            state.registry.restore(saved.clone());
            state.treasury = saved_treasury;
            state.events.truncate(events_mark);
            tracing::warn!(report_id = %id, error = %err, "escrow release failed, settlement rolled back");
            return Err(err.into());
        }

        self.pay_best_effort(entry, id, &ctx.caller, config.settler_reward);
        if route == RewardRoute::InitialReporter {
            if let Some(initial) = status.initial_reporter {
                self.pay_best_effort(entry, id, &initial, config.reporter_reward);
            }
        }

        entry.state_mut().events.push(OracleEvent::Distributed {
            report_id: id,
            settler: ctx.caller,
            settler_reward: config.settler_reward,
            reporter_reward: config.reporter_reward,
            reward_route: route,
            reporter,
            amount1: status.current_amount1,
            amount2: status.current_amount2,
        });
        tracing::info!(report_id = %id, %reporter, settler = %ctx.caller, ?route, "escrow distributed");

        Ok(settlement_result(in_window, next_status.price, now))
    }

    fn run_callback(
        &self,
        entry: &Entry<'_>,
        id: ReportId,
        callback: &CallbackSpec,
        config: &ReportConfig,
        status: &ReportStatus,
    ) {
        let target = callback.target;
        let notice = SettlementNotice {
            report_id: id,
            price: status.price,
            settlement_tick: status.settlement_tick,
            asset1: config.asset1,
            asset2: config.asset2,
        };
        let consumer = self.consumers.read().get(&target).cloned();
        let outcome = dispatch(
            consumer,
            target,
            callback.selector,
            callback.gas_limit,
            &notice,
        );
        match &outcome.fault {
            None => tracing::info!(report_id = %id, %target, gas_used = outcome.gas_used, "callback executed"),
            Some(fault) => tracing::warn!(report_id = %id, %target, %fault, "callback failed"),
        }
        entry.state_mut().events.push(OracleEvent::CallbackExecuted {
            report_id: id,
            target,
            success: outcome.success,
            gas_used: outcome.gas_used,
            fault: outcome.fault.map(|f| f.to_string()),
        });
    }

    fn pay_best_effort(&self, entry: &Entry<'_>, id: ReportId, to: &AccountId, amount: U256) {
        if self.custodian.move_native(to, amount) == NativeDelivery::Forfeited {
            if let Err(err) = entry.state_mut().treasury.record_forfeit(amount) {
                tracing::warn!(report_id = %id, error = %err, "forfeit tally overflow");
            }
        }
    }

    // ── treasury ───────────────────────────────────────────────────────

    /// Send accrued protocol fees for `asset` to the fee recipient.
    pub fn withdraw_asset_fees(&self, ctx: &CallContext, asset: AssetId) -> Result<U256, OracleError> {
        let entry = self.enter("withdraw_asset_fees")?;
        let (recipient, amount) = {
            let state = entry.state();
            (state.treasury.recipient(), state.treasury.asset_fees(&asset))
        };
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        self.custodian
            .move_asset(asset, self.custodian.escrow(), recipient, amount)
            .inspect_err(|e| tracing::warn!(%asset, error = %e, "asset fee withdrawal failed"))?;

        let mut state = entry.state_mut();
        state.treasury.take_asset_fees(&asset);
        state.events.push(OracleEvent::FeesWithdrawn {
            asset: Some(asset),
            recipient,
            amount,
        });
        tracing::info!(%asset, %recipient, %amount, caller = %ctx.caller, "asset fees withdrawn");
        Ok(amount)
    }

    /// Send the native pool to the fee recipient.
    pub fn withdraw_native_fees(&self, ctx: &CallContext) -> Result<U256, OracleError> {
        let entry = self.enter("withdraw_native_fees")?;
        let (recipient, amount) = {
            let state = entry.state();
            (state.treasury.recipient(), state.treasury.native_pool())
        };
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        self.custodian
            .pay_native_strict(&recipient, amount)
            .inspect_err(|e| tracing::warn!(error = %e, "native fee withdrawal failed"))?;

        let mut state = entry.state_mut();
        state.treasury.take_native_pool();
        state.events.push(OracleEvent::FeesWithdrawn {
            asset: None,
            recipient,
            amount,
        });
        tracing::info!(%recipient, %amount, caller = %ctx.caller, "native fees withdrawn");
        Ok(amount)
    }

    /// Change the fee recipient. Owner only.
    pub fn update_fee_recipient(&self, ctx: &CallContext, recipient: AccountId) -> Result<(), OracleError> {
        let entry = self.enter("update_fee_recipient")?;
        let mut state = entry.state_mut();
        let old = state
            .treasury
            .set_recipient(&ctx.caller, recipient)
            .inspect_err(|e| tracing::debug!(error = %e, "fee recipient update rejected"))?;
        state.events.push(OracleEvent::FeeRecipientUpdated { old, new: recipient });
        tracing::info!(%old, new = %recipient, "fee recipient updated");
        Ok(())
    }

    // ── queries ────────────────────────────────────────────────────────

    /// Frozen `(price, settlement_tick)` of a settled report.
    pub fn get_settlement_data(&self, id: ReportId) -> Result<(U256, u64), OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            let record = state.registry.require(id)?;
            if !record.status.is_settled {
                return Err(OracleError::NotSettled { report: id });
            }
            Ok((record.status.price, record.status.settlement_tick))
        })
    }

    pub fn report(&self, id: ReportId) -> Result<ReportRecord, OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            Ok(state.registry.require(id)?.clone())
        })
    }

    pub fn integrity_hash(&self, id: ReportId) -> Result<ContentDigest, OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            Ok(state.registry.require(id)?.extra.integrity_hash)
        })
    }

    pub fn dispute_history(&self, id: ReportId) -> Result<Vec<DisputeSnapshot>, OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            state.registry.require(id)?;
            Ok(state.registry.history(id).to_vec())
        })
    }

    pub fn report_count(&self) -> usize {
        self.view(|state| state.registry.len())
    }

    pub fn events(&self) -> Vec<OracleEvent> {
        self.view(|state| state.events.all().to_vec())
    }

    pub fn events_for(&self, id: ReportId) -> Vec<OracleEvent> {
        self.view(|state| state.events.for_report(id))
    }

    pub fn treasury(&self) -> FeeTreasury {
        self.view(|state| state.treasury.clone())
    }

    /// Amount of `asset` the escrow account must hold: live report
    /// positions plus accrued protocol fees.
    pub fn asset_liabilities(&self, asset: &AssetId) -> Result<U256, OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            let escrowed = state.registry.escrowed(asset)?;
            Ok(checked_add(escrowed, state.treasury.asset_fees(asset), "asset liabilities")?)
        })
    }

    /// Native amount the escrow account must hold: rewards of undistributed
    /// reports, the native pool, and forfeited payouts.
    pub fn native_liabilities(&self) -> Result<U256, OracleError> {
        self.view(|state| -> Result<_, OracleError> {
            let mut total = checked_add(
                state.treasury.native_pool(),
                state.treasury.forfeited_native(),
                "native liabilities",
            )?;
            for record in state.registry.iter().filter(|r| !r.status.is_distributed) {
                total = checked_sum(
                    [total, record.config.settler_reward, record.config.reporter_reward],
                    "native liabilities",
                )?;
            }
            Ok(total)
        })
    }
}

fn invalid(reason: &str) -> OracleError {
    OracleError::InvalidParameters(reason.to_string())
}

fn timing(report: ReportId, reason: &'static str, now: u64, boundary: u64) -> OracleError {
    OracleError::Timing {
        report,
        reason,
        now,
        boundary,
    }
}

fn settlement_result(settled: bool, price: U256, tick: u64) -> (U256, u64) {
    if settled {
        (price, tick)
    } else {
        (U256::ZERO, 0)
    }
}
