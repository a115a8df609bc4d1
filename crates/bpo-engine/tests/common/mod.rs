//! Shared harness: an oracle wired to in-memory host seams and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use bpo_core::{AccountId, AssetId, ContentDigest, ManualClock, ReportId, TimeUnit, U256};
use bpo_custody::{AssetLedger, Custodian, InMemoryAssetLedger, InMemoryNativeBank, NativeBank};
use bpo_engine::{
    CallContext, DisputeRequest, InitialReport, OracleConfig, OracleError, PriceOracle,
};
use bpo_state::ReportParams;

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18))
}

/// `n * 1e17`, for amounts like 1.1e18.
pub fn e17(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(17))
}

pub fn weth() -> AssetId {
    AssetId::from_label("weth")
}

pub fn usdc() -> AssetId {
    AssetId::from_label("usdc")
}

pub fn actor(label: &str) -> AccountId {
    AccountId::from_label(label)
}

pub const CREATION_VALUE: u64 = 10_000_000_000_000_000;
pub const SETTLER_REWARD: u64 = 1_000_000_000_000_000;

/// Reference report: 1e18 exact, 0.03% fee, 110% escalation, 300 ticks,
/// halt at 10e18, 5 tick dispute delay, 0.01% protocol fee.
pub fn reference_params() -> ReportParams {
    ReportParams {
        asset1: weth(),
        asset2: usdc(),
        exact_asset1_amount: e18(1),
        fee_rate: 3_000,
        escalation_multiplier_percent: 110,
        settlement_duration: 300,
        escalation_halt_threshold: e18(10),
        dispute_delay: 5,
        protocol_fee_rate: 1_000,
        settler_reward: U256::from(SETTLER_REWARD),
        time_unit: TimeUnit::Ticks,
        track_disputes: true,
        callback: None,
        keep_fee_on_dispute: false,
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub ledger: Arc<InMemoryAssetLedger>,
    pub bank: Arc<InMemoryNativeBank>,
    pub oracle: Arc<PriceOracle>,
    pub escrow: AccountId,
    pub owner: AccountId,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(OracleConfig::default())
    }

    pub fn with_config(config: OracleConfig) -> Self {
        let clock = Arc::new(ManualClock::new(1_700_000_000, 1_000));
        let ledger = Arc::new(InMemoryAssetLedger::new());
        let bank = Arc::new(InMemoryNativeBank::new());
        let escrow = actor("oracle-escrow");
        let owner = actor("owner");
        let custodian = Custodian::new(escrow, ledger.clone(), bank.clone());
        let oracle = PriceOracle::new(config, clock.clone(), custodian, owner)
            .expect("default config is valid");
        Self {
            clock,
            ledger,
            bank,
            oracle: Arc::new(oracle),
            escrow,
            owner,
        }
    }

    /// Give `who` plenty of both assets and approve the escrow to pull them.
    pub fn fund(&self, who: AccountId) {
        for asset in [weth(), usdc()] {
            self.ledger.mint(asset, who, e18(1_000_000)).unwrap();
            self.ledger
                .approve(asset, who, self.escrow, e18(1_000_000));
        }
    }

    pub fn create(&self, creator: AccountId, params: ReportParams) -> Result<ReportId, OracleError> {
        self.create_with_value(creator, params, U256::from(CREATION_VALUE))
    }

    pub fn create_with_value(
        &self,
        creator: AccountId,
        params: ReportParams,
        value: U256,
    ) -> Result<ReportId, OracleError> {
        self.bank.fund(creator, value).unwrap();
        self.oracle
            .create(&CallContext::new(creator).with_value(value), params)
    }

    pub fn hash(&self, id: ReportId) -> ContentDigest {
        self.oracle.integrity_hash(id).unwrap()
    }

    pub fn submit(
        &self,
        reporter: AccountId,
        id: ReportId,
        amount1: U256,
        amount2: U256,
    ) -> Result<(), OracleError> {
        self.oracle.submit_initial(
            &CallContext::new(reporter),
            id,
            InitialReport {
                amount1,
                amount2,
                integrity_hash: self.hash(id),
                reporter: None,
            },
        )
    }

    /// Dispute with the current stored amount2 as the expectation.
    pub fn dispute(
        &self,
        disputer: AccountId,
        id: ReportId,
        asset: AssetId,
        new_amount1: U256,
        new_amount2: U256,
    ) -> Result<(), OracleError> {
        let expected_amount2 = self.oracle.report(id).unwrap().status.current_amount2;
        self.oracle.dispute(
            &CallContext::new(disputer),
            id,
            DisputeRequest {
                asset_to_swap: asset,
                new_amount1,
                new_amount2,
                disputer: None,
                expected_amount2,
                integrity_hash: self.hash(id),
            },
        )
    }

    pub fn settle(&self, settler: AccountId, id: ReportId) -> Result<(U256, u64), OracleError> {
        self.oracle.settle(&CallContext::new(settler), id)
    }

    pub fn advance(&self, ticks: u64) {
        self.clock.advance(TimeUnit::Ticks, ticks);
    }

    pub fn asset_balance(&self, asset: AssetId, who: AccountId) -> U256 {
        self.ledger.balance_of(&asset, &who)
    }

    pub fn native_balance(&self, who: AccountId) -> U256 {
        self.bank.balance_of(&who)
    }

    /// Escrow holdings equal the oracle's recorded liabilities.
    pub fn assert_conserved(&self) {
        for asset in [weth(), usdc()] {
            assert_eq!(
                self.asset_balance(asset, self.escrow),
                self.oracle.asset_liabilities(&asset).unwrap(),
                "asset escrow drifted for {asset}"
            );
        }
        assert_eq!(
            self.native_balance(self.escrow),
            self.oracle.native_liabilities().unwrap(),
            "native escrow drifted"
        );
    }
}

/// A reference report with an accepted initial report from `reporter`.
pub fn reported(h: &Harness, reporter: AccountId) -> ReportId {
    h.fund(reporter);
    let id = h.create(actor("creator"), reference_params()).unwrap();
    h.submit(reporter, id, e18(1), e18(2_000)).unwrap();
    id
}
