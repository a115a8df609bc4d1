//! # Fund Custodian
//!
//! Owns the oracle's escrow account on both host seams and moves value in
//! and out of it.
//!
//! Asset moves are assembled into a [`TransferPlan`] and applied through
//! [`AssetLedger::apply`], so a dispute's deposits, refunds, and payouts land
//! together or not at all.
//!
//! Native payouts are best-effort. A refused direct payment falls back to a
//! wrapped-native credit; if the fallback also fails the amount stays in
//! escrow and is reported as [`NativeDelivery::Forfeited`]. Payouts never
//! abort the operation that triggered them.

use std::sync::Arc;

use bpo_core::{AccountId, AssetId, U256};
use serde::{Deserialize, Serialize};

use crate::error::CustodyError;
use crate::ledger::{AssetLedger, LedgerTransfer};
use crate::native::NativeBank;

/// How a best-effort native payment reached (or failed to reach) its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeDelivery {
    Delivered,
    /// Credited as wrapped native after the direct payment was refused.
    Fallback,
    /// Neither route worked; the amount remains in escrow.
    Forfeited,
}

/// An ordered batch of asset legs to apply atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    escrow: AccountId,
    legs: Vec<LedgerTransfer>,
}

impl TransferPlan {
    fn new(escrow: AccountId) -> Self {
        Self {
            escrow,
            legs: Vec::new(),
        }
    }

    /// Queue a move. Zero amounts are dropped. Moves out of escrow are
    /// outbound payments; anything else is an allowance-gated pull.
    pub fn move_asset(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> &mut Self {
        if amount.is_zero() {
            return self;
        }
        let spender = (from != self.escrow).then_some(self.escrow);
        self.legs.push(LedgerTransfer {
            asset,
            from,
            to,
            amount,
            spender,
        });
        self
    }

    pub fn legs(&self) -> &[LedgerTransfer] {
        &self.legs
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

/// Escrow holder for one oracle instance.
#[derive(Clone)]
pub struct Custodian {
    escrow: AccountId,
    assets: Arc<dyn AssetLedger>,
    native: Arc<dyn NativeBank>,
}

impl std::fmt::Debug for Custodian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Custodian")
            .field("escrow", &self.escrow)
            .finish_non_exhaustive()
    }
}

impl Custodian {
    pub fn new(escrow: AccountId, assets: Arc<dyn AssetLedger>, native: Arc<dyn NativeBank>) -> Self {
        Self {
            escrow,
            assets,
            native,
        }
    }

    /// The account holding escrowed funds.
    pub fn escrow(&self) -> AccountId {
        self.escrow
    }

    pub fn assets(&self) -> &Arc<dyn AssetLedger> {
        &self.assets
    }

    pub fn native(&self) -> &Arc<dyn NativeBank> {
        &self.native
    }

    /// Start an empty plan bound to this custodian's escrow account.
    pub fn plan(&self) -> TransferPlan {
        TransferPlan::new(self.escrow)
    }

    /// Apply a plan atomically. Empty plans never reach the ledger.
    pub fn execute(&self, plan: &TransferPlan) -> Result<(), CustodyError> {
        if plan.is_empty() {
            return Ok(());
        }
        self.assets.apply(plan.legs())?;
        tracing::debug!(legs = plan.legs().len(), "transfer plan applied");
        Ok(())
    }

    /// Single-leg convenience over [`plan`](Self::plan) and [`execute`](Self::execute).
    pub fn move_asset(
        &self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), CustodyError> {
        let mut plan = self.plan();
        plan.move_asset(asset, from, to, amount);
        self.execute(&plan)
    }

    /// Pull an attached native payment into escrow.
    pub fn collect_native(&self, from: &AccountId, amount: U256) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.native.transfer(from, &self.escrow, amount)?;
        Ok(())
    }

    /// Pay out of escrow, failing loudly.
    pub fn pay_native_strict(&self, to: &AccountId, amount: U256) -> Result<(), CustodyError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.native.transfer(&self.escrow, to, amount)?;
        Ok(())
    }

    /// Pay out of escrow, falling back to wrapped native, never failing.
    pub fn move_native(&self, to: &AccountId, amount: U256) -> NativeDelivery {
        if amount.is_zero() {
            return NativeDelivery::Delivered;
        }
        let direct = match self.native.transfer(&self.escrow, to, amount) {
            Ok(()) => return NativeDelivery::Delivered,
            Err(err) => err,
        };
        match self.native.transfer_wrapped(&self.escrow, to, amount) {
            Ok(()) => {
                tracing::info!(%to, %amount, reason = %direct, "native payment delivered as wrapped");
                NativeDelivery::Fallback
            }
            Err(fallback) => {
                tracing::warn!(
                    %to,
                    %amount,
                    direct = %direct,
                    fallback = %fallback,
                    "native payment forfeited"
                );
                NativeDelivery::Forfeited
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryAssetLedger;
    use crate::native::InMemoryNativeBank;

    struct Host {
        ledger: Arc<InMemoryAssetLedger>,
        bank: Arc<InMemoryNativeBank>,
        custodian: Custodian,
    }

    fn host() -> Host {
        let ledger = Arc::new(InMemoryAssetLedger::new());
        let bank = Arc::new(InMemoryNativeBank::new());
        let custodian = Custodian::new(escrow(), ledger.clone(), bank.clone());
        Host {
            ledger,
            bank,
            custodian,
        }
    }

    fn escrow() -> AccountId {
        AccountId::from_label("escrow")
    }
    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }
    fn weth() -> AssetId {
        AssetId::from_label("weth")
    }

    #[test]
    fn plan_classifies_legs_and_skips_zero() {
        let h = host();
        let mut plan = h.custodian.plan();
        plan.move_asset(weth(), alice(), escrow(), U256::from(5u64))
            .move_asset(weth(), escrow(), alice(), U256::ZERO)
            .move_asset(weth(), escrow(), alice(), U256::from(2u64));

        assert_eq!(plan.legs().len(), 2);
        assert_eq!(plan.legs()[0].spender, Some(escrow()));
        assert_eq!(plan.legs()[1].spender, None);
    }

    #[test]
    fn empty_plan_is_ok() {
        let h = host();
        h.custodian.execute(&h.custodian.plan()).unwrap();
        h.custodian
            .move_asset(weth(), alice(), escrow(), U256::ZERO)
            .unwrap();
    }

    #[test]
    fn pull_then_pay_out() {
        let h = host();
        h.ledger.mint(weth(), alice(), U256::from(10u64)).unwrap();
        h.ledger.approve(weth(), alice(), escrow(), U256::from(10u64));

        h.custodian
            .move_asset(weth(), alice(), escrow(), U256::from(10u64))
            .unwrap();
        h.custodian
            .move_asset(weth(), escrow(), alice(), U256::from(4u64))
            .unwrap();
        assert_eq!(h.ledger.balance_of(&weth(), &escrow()), U256::from(6u64));
    }

    #[test]
    fn native_payment_outcomes() {
        let h = host();
        h.bank.fund(escrow(), U256::from(100u64)).unwrap();

        assert_eq!(
            h.custodian.move_native(&alice(), U256::from(10u64)),
            NativeDelivery::Delivered
        );

        h.bank.reject_direct(alice());
        assert_eq!(
            h.custodian.move_native(&alice(), U256::from(10u64)),
            NativeDelivery::Fallback
        );
        assert_eq!(h.bank.wrapped_balance_of(&alice()), U256::from(10u64));

        h.bank.set_wrapped_frozen(true);
        assert_eq!(
            h.custodian.move_native(&alice(), U256::from(10u64)),
            NativeDelivery::Forfeited
        );
        assert_eq!(h.bank.balance_of(&escrow()), U256::from(80u64));
    }

    #[test]
    fn strict_payment_propagates_refusal() {
        let h = host();
        h.bank.fund(escrow(), U256::from(100u64)).unwrap();
        h.bank.reject_direct(alice());
        let err = h
            .custodian
            .pay_native_strict(&alice(), U256::from(1u64))
            .unwrap_err();
        assert!(matches!(err, CustodyError::Native(_)));
    }

    #[test]
    fn collect_requires_funds() {
        let h = host();
        assert!(h.custodian.collect_native(&alice(), U256::from(1u64)).is_err());
        h.bank.fund(alice(), U256::from(5u64)).unwrap();
        h.custodian.collect_native(&alice(), U256::from(5u64)).unwrap();
        assert_eq!(h.bank.balance_of(&escrow()), U256::from(5u64));
    }
}
