//! # Simulate Subcommand
//!
//! Runs a [`Scenario`] against a fresh oracle wired to the in-memory asset
//! ledger, native bank, and a manual clock. Each step's outcome is compared
//! with its `expect_error`; the run passes when every step behaved as
//! scripted. The report (step outcomes, full event log, final balances of
//! every named actor, treasury) is printed as JSON.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bpo_core::{AccountId, AssetId, Clock, ContentDigest, ManualClock, ReportId, TimeUnit, U256};
use bpo_custody::{AssetLedger, Custodian, FeeTreasury, InMemoryAssetLedger, InMemoryNativeBank, NativeBank};
use bpo_engine::{
    CallContext, CallbackFault, DisputeRequest, ErrorKind, GasMeter, InitialReport, Notifiable,
    OracleConfig, OracleError, OracleEvent, PriceOracle, SettlementNotice,
};
use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};

use crate::scenario::{Action, ConsumerSpec, Scenario};
use crate::{account, asset};

/// Arguments for the `bpo simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML).
    #[arg(long)]
    pub scenario: PathBuf,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Execute the simulate subcommand. Exit code 0 when every step matched
/// its expectation, 1 otherwise.
pub fn run_simulate(args: &SimulateArgs, config: OracleConfig) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_yaml(&raw)
        .with_context(|| format!("failed to parse scenario {}", args.scenario.display()))?;

    let report = Simulation::new(config, &scenario)?.run(&scenario);
    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?,
        None => println!("{json}"),
    }

    if report.passed {
        tracing::info!(steps = report.steps.len(), "scenario passed");
        Ok(0)
    } else {
        let failed = report.steps.iter().filter(|s| !s.matched).count();
        tracing::error!(failed, "scenario failed");
        Ok(1)
    }
}

/// Consumer that charges a fixed cost and optionally reverts.
struct ScriptedConsumer {
    gas_cost: u64,
    revert: bool,
}

impl Notifiable for ScriptedConsumer {
    fn on_settlement(
        &self,
        _selector: [u8; 4],
        notice: &SettlementNotice,
        meter: &mut GasMeter,
    ) -> Result<(), CallbackFault> {
        meter.charge(self.gas_cost)?;
        if self.revert {
            return Err(CallbackFault::Reverted(format!(
                "scripted revert for {}",
                notice.report_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<ErrorKind>,
    /// Whether the outcome matched the expectation.
    pub matched: bool,
}

#[derive(Debug, Serialize)]
pub struct AccountBalances {
    pub account: AccountId,
    pub native: U256,
    pub wrapped_native: U256,
    pub assets: BTreeMap<String, U256>,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub passed: bool,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<OracleEvent>,
    pub balances: BTreeMap<String, AccountBalances>,
    pub treasury: FeeTreasury,
}

/// An oracle plus the in-memory host it runs against.
pub struct Simulation {
    clock: Arc<ManualClock>,
    ledger: Arc<InMemoryAssetLedger>,
    bank: Arc<InMemoryNativeBank>,
    oracle: PriceOracle,
    escrow: AccountId,
    actors: BTreeMap<String, AccountId>,
    assets: BTreeMap<String, AssetId>,
}

impl Simulation {
    pub fn new(config: OracleConfig, scenario: &Scenario) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(scenario.clock.seconds, scenario.clock.ticks));
        let ledger = Arc::new(InMemoryAssetLedger::new());
        let bank = Arc::new(InMemoryNativeBank::new());
        let escrow = account(&scenario.escrow);
        let owner = account(&scenario.owner);
        let custodian = Custodian::new(escrow, ledger.clone(), bank.clone());
        let oracle = PriceOracle::new(config, clock.clone(), custodian, owner)?;

        let mut sim = Self {
            clock,
            ledger,
            bank,
            oracle,
            escrow,
            actors: BTreeMap::new(),
            assets: BTreeMap::new(),
        };
        sim.actor(&scenario.owner);
        for ConsumerSpec {
            target,
            gas_cost,
            revert,
        } in &scenario.consumers
        {
            let target = sim.actor(target);
            sim.oracle.register_consumer(
                target,
                Arc::new(ScriptedConsumer {
                    gas_cost: *gas_cost,
                    revert: *revert,
                }),
            );
        }
        Ok(sim)
    }

    pub fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    /// Run every step of `scenario`, continuing past failures.
    pub fn run(mut self, scenario: &Scenario) -> SimulationReport {
        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            let outcome = match self.apply(&step.action) {
                Ok(result) => StepOutcome {
                    index,
                    action: step.action.name(),
                    ok: true,
                    result: Some(result),
                    error: None,
                    kind: None,
                    expected_error: step.expect_error,
                    matched: step.expect_error.is_none(),
                },
                Err(err) => {
                    let kind = err.downcast_ref::<OracleError>().map(OracleError::kind);
                    StepOutcome {
                        index,
                        action: step.action.name(),
                        ok: false,
                        result: None,
                        error: Some(format!("{err:#}")),
                        kind,
                        expected_error: step.expect_error,
                        matched: step.expect_error.is_some() && step.expect_error == kind,
                    }
                }
            };
            if !outcome.matched {
                tracing::warn!(
                    index,
                    action = outcome.action,
                    error = outcome.error.as_deref(),
                    expected = ?outcome.expected_error,
                    "step did not match expectation"
                );
            }
            outcomes.push(outcome);
        }

        SimulationReport {
            name: scenario.name.clone(),
            passed: outcomes.iter().all(|o| o.matched),
            steps: outcomes,
            events: self.oracle.events(),
            balances: self.balances(),
            treasury: self.oracle.treasury(),
        }
    }

    fn actor(&mut self, label: &str) -> AccountId {
        let id = account(label);
        self.actors.insert(label.to_string(), id);
        id
    }

    fn asset(&mut self, label: &str) -> AssetId {
        let id = asset(label);
        self.assets.insert(label.to_string(), id);
        id
    }

    fn balances(&self) -> BTreeMap<String, AccountBalances> {
        let mut named = self.actors.clone();
        named.insert("escrow".to_string(), self.escrow);
        named
            .into_iter()
            .map(|(label, id)| {
                let assets = self
                    .assets
                    .iter()
                    .map(|(name, asset)| (name.clone(), self.ledger.balance_of(asset, &id)))
                    .collect();
                let balances = AccountBalances {
                    account: id,
                    native: self.bank.balance_of(&id),
                    wrapped_native: self.bank.wrapped_balance_of(&id),
                    assets,
                };
                (label, balances)
            })
            .collect()
    }

    fn apply(&mut self, action: &Action) -> Result<Value> {
        match action {
            Action::Mint { asset, to, amount } => {
                let (asset, to) = (self.asset(asset), self.actor(to));
                self.ledger.mint(asset, to, amount.get())?;
                Ok(Value::Null)
            }
            Action::Approve {
                asset,
                owner,
                amount,
            } => {
                let (asset, owner) = (self.asset(asset), self.actor(owner));
                let amount = amount.map_or(U256::MAX, |a| a.get());
                self.ledger.approve(asset, owner, self.escrow, amount);
                Ok(Value::Null)
            }
            Action::FundNative { to, amount } => {
                let to = self.actor(to);
                self.bank.fund(to, amount.get())?;
                Ok(Value::Null)
            }
            Action::RejectNative { account } => {
                let account = self.actor(account);
                self.bank.reject_direct(account);
                Ok(Value::Null)
            }
            Action::AcceptNative { account } => {
                let account = self.actor(account);
                self.bank.accept_direct(account);
                Ok(Value::Null)
            }
            Action::WrappedFallback { enabled } => {
                self.bank.set_wrapped_frozen(!enabled);
                Ok(Value::Null)
            }
            Action::Freeze { asset, account } => {
                let (asset, account) = (self.asset(asset), self.actor(account));
                self.ledger.freeze(asset, account);
                Ok(Value::Null)
            }
            Action::Unfreeze { asset, account } => {
                let (asset, account) = (self.asset(asset), self.actor(account));
                self.ledger.unfreeze(asset, account);
                Ok(Value::Null)
            }
            Action::Advance { ticks, seconds } => {
                self.clock.advance(TimeUnit::Ticks, *ticks);
                self.clock.advance(TimeUnit::Seconds, *seconds);
                Ok(json!({
                    "ticks": self.clock.now(TimeUnit::Ticks),
                    "seconds": self.clock.now(TimeUnit::Seconds),
                }))
            }
            Action::Create {
                creator,
                value,
                params,
            } => {
                let creator = self.actor(creator);
                self.asset(&params.asset1);
                self.asset(&params.asset2);
                if let Some(cb) = &params.callback {
                    self.actor(&cb.target);
                }
                let params = params.to_params()?;
                let ctx = CallContext::new(creator).with_value(value.get());
                let id = self.oracle.create(&ctx, params)?;
                let hash = self.oracle.integrity_hash(id)?;
                Ok(json!({ "report_id": id.get(), "integrity_hash": hash.to_string() }))
            }
            Action::Submit {
                reporter,
                report,
                amount1,
                amount2,
                beneficiary,
                integrity_hash,
            } => {
                let id = ReportId(*report);
                let caller = self.actor(reporter);
                let beneficiary = beneficiary.as_deref().map(|b| self.actor(b));
                let integrity_hash = self.hash_or_stored(id, integrity_hash.as_deref())?;
                self.oracle.submit_initial(
                    &CallContext::new(caller),
                    id,
                    InitialReport {
                        amount1: amount1.get(),
                        amount2: amount2.get(),
                        integrity_hash,
                        reporter: beneficiary,
                    },
                )?;
                self.price_of(id)
            }
            Action::Dispute {
                disputer,
                report,
                asset,
                amount1,
                amount2,
                expected_amount2,
                beneficiary,
                integrity_hash,
            } => {
                let id = ReportId(*report);
                let caller = self.actor(disputer);
                let asset_to_swap = self.asset(asset);
                let beneficiary = beneficiary.as_deref().map(|b| self.actor(b));
                let integrity_hash = self.hash_or_stored(id, integrity_hash.as_deref())?;
                let expected_amount2 = match expected_amount2 {
                    Some(a) => a.get(),
                    None => self.oracle.report(id)?.status.current_amount2,
                };
                self.oracle.dispute(
                    &CallContext::new(caller),
                    id,
                    DisputeRequest {
                        asset_to_swap,
                        new_amount1: amount1.get(),
                        new_amount2: amount2.get(),
                        disputer: beneficiary,
                        expected_amount2,
                        integrity_hash,
                    },
                )?;
                self.price_of(id)
            }
            Action::Settle {
                settler,
                report,
                gas,
            } => {
                let mut ctx = CallContext::new(self.actor(settler));
                if let Some(gas) = gas {
                    ctx = ctx.with_gas(*gas);
                }
                let (price, tick) = self.oracle.settle(&ctx, ReportId(*report))?;
                Ok(json!({ "price": price.to_string(), "settlement_tick": tick }))
            }
            Action::WithdrawAssetFees { caller, asset } => {
                let ctx = CallContext::new(self.actor(caller));
                let asset = self.asset(asset);
                let amount = self.oracle.withdraw_asset_fees(&ctx, asset)?;
                Ok(json!({ "amount": amount.to_string() }))
            }
            Action::WithdrawNativeFees { caller } => {
                let ctx = CallContext::new(self.actor(caller));
                let amount = self.oracle.withdraw_native_fees(&ctx)?;
                Ok(json!({ "amount": amount.to_string() }))
            }
            Action::SetFeeRecipient { caller, recipient } => {
                let ctx = CallContext::new(self.actor(caller));
                let recipient = self.actor(recipient);
                self.oracle.update_fee_recipient(&ctx, recipient)?;
                Ok(Value::Null)
            }
        }
    }

    fn hash_or_stored(&self, id: ReportId, raw: Option<&str>) -> Result<ContentDigest> {
        match raw {
            Some(raw) => Ok(ContentDigest::parse(raw)?),
            None => Ok(self.oracle.integrity_hash(id)?),
        }
    }

    fn price_of(&self, id: ReportId) -> Result<Value> {
        let status = self.oracle.report(id)?.status;
        Ok(json!({
            "price": status.price.to_string(),
            "amount1": status.current_amount1.to_string(),
            "amount2": status.current_amount2.to_string(),
        }))
    }
}
