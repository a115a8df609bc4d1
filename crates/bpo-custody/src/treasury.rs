//! # Fee Treasury
//!
//! Book-keeping for protocol revenue held in the custodian's escrow account:
//!
//! - per-asset protocol cuts accrued on disputes,
//! - a native pool of reporter rewards swept from disputed reports,
//! - a tally of native payouts that could not be delivered.
//!
//! Withdrawals always go to the configured recipient, whoever triggers them.
//! Only the owner may change the recipient.

use std::collections::BTreeMap;

use bpo_core::amount::checked_add;
use bpo_core::{AccountId, AssetId, U256};
use serde::{Deserialize, Serialize};

use crate::error::TreasuryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTreasury {
    owner: AccountId,
    recipient: AccountId,
    asset_fees: BTreeMap<AssetId, U256>,
    native_pool: U256,
    forfeited_native: U256,
}

impl FeeTreasury {
    pub fn new(owner: AccountId, recipient: AccountId) -> Self {
        Self {
            owner,
            recipient,
            asset_fees: BTreeMap::new(),
            native_pool: U256::ZERO,
            forfeited_native: U256::ZERO,
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn recipient(&self) -> AccountId {
        self.recipient
    }

    /// Accrued protocol fees for `asset`.
    pub fn asset_fees(&self, asset: &AssetId) -> U256 {
        self.asset_fees.get(asset).copied().unwrap_or(U256::ZERO)
    }

    pub fn native_pool(&self) -> U256 {
        self.native_pool
    }

    pub fn forfeited_native(&self) -> U256 {
        self.forfeited_native
    }

    pub fn accrue_asset(&mut self, asset: AssetId, amount: U256) -> Result<(), TreasuryError> {
        if amount.is_zero() {
            return Ok(());
        }
        let entry = self.asset_fees.entry(asset).or_insert(U256::ZERO);
        *entry = checked_add(*entry, amount, "protocol fee accrual")?;
        Ok(())
    }

    pub fn accrue_native(&mut self, amount: U256) -> Result<(), TreasuryError> {
        self.native_pool = checked_add(self.native_pool, amount, "native pool accrual")?;
        Ok(())
    }

    pub fn record_forfeit(&mut self, amount: U256) -> Result<(), TreasuryError> {
        self.forfeited_native = checked_add(self.forfeited_native, amount, "forfeit tally")?;
        Ok(())
    }

    /// Change the recipient. Returns the previous one.
    pub fn set_recipient(
        &mut self,
        caller: &AccountId,
        recipient: AccountId,
    ) -> Result<AccountId, TreasuryError> {
        if *caller != self.owner {
            return Err(TreasuryError::Unauthorized {
                caller: *caller,
                owner: self.owner,
            });
        }
        Ok(std::mem::replace(&mut self.recipient, recipient))
    }

    /// Zero the asset pool and return what it held.
    pub fn take_asset_fees(&mut self, asset: &AssetId) -> U256 {
        self.asset_fees.remove(asset).unwrap_or(U256::ZERO)
    }

    /// Zero the native pool and return what it held.
    pub fn take_native_pool(&mut self) -> U256 {
        std::mem::replace(&mut self.native_pool, U256::ZERO)
    }
}
