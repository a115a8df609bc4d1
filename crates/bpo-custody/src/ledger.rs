//! # Asset Ledger
//!
//! The external fungible-asset ledger as seen by the oracle. A batch of
//! [`LedgerTransfer`] legs is applied atomically: either every leg lands or
//! the ledger is left untouched.
//!
//! Legs come in two shapes:
//!
//! - **Outbound**: the custodian's escrow account pays out of its own balance.
//! - **Pull**: the custodian draws from an external owner, gated by the
//!   allowance that owner granted to the escrow account.

use std::collections::{HashMap, HashSet};

use bpo_core::amount::{checked_add, checked_sub};
use bpo_core::{AccountId, AssetId, U256};
use parking_lot::Mutex;

use crate::error::LedgerError;

/// One movement of an asset between two accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransfer {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: U256,
    /// Set for pulls: the account whose allowance from `from` is consumed.
    pub spender: Option<AccountId>,
}

/// Host ledger of fungible assets.
pub trait AssetLedger: Send + Sync {
    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> U256;

    fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> U256;

    /// Apply every leg or none of them.
    fn apply(&self, transfers: &[LedgerTransfer]) -> Result<(), LedgerError>;
}

#[derive(Debug, Default, Clone)]
struct Book {
    balances: HashMap<(AssetId, AccountId), U256>,
    allowances: HashMap<(AssetId, AccountId, AccountId), U256>,
    frozen: HashSet<(AssetId, AccountId)>,
}

impl Book {
    fn balance(&self, asset: AssetId, account: AccountId) -> U256 {
        self.balances
            .get(&(asset, account))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> U256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn apply_leg(&mut self, leg: &LedgerTransfer) -> Result<(), LedgerError> {
        for account in [leg.from, leg.to] {
            if self.frozen.contains(&(leg.asset, account)) {
                return Err(LedgerError::Frozen {
                    asset: leg.asset,
                    account,
                });
            }
        }

        if let Some(spender) = leg.spender {
            let available = self.allowance(leg.asset, leg.from, spender);
            if available < leg.amount {
                return Err(LedgerError::InsufficientAllowance {
                    asset: leg.asset,
                    owner: leg.from,
                    spender,
                    required: leg.amount,
                    available,
                });
            }
            self.allowances.insert(
                (leg.asset, leg.from, spender),
                checked_sub(available, leg.amount, "allowance")?,
            );
        }

        let available = self.balance(leg.asset, leg.from);
        if available < leg.amount {
            return Err(LedgerError::InsufficientBalance {
                asset: leg.asset,
                account: leg.from,
                required: leg.amount,
                available,
            });
        }
        self.balances.insert(
            (leg.asset, leg.from),
            checked_sub(available, leg.amount, "ledger debit")?,
        );
        let credited = checked_add(self.balance(leg.asset, leg.to), leg.amount, "ledger credit")?;
        self.balances.insert((leg.asset, leg.to), credited);
        Ok(())
    }
}

/// In-memory [`AssetLedger`] for tests and simulation.
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    book: Mutex<Book>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` in `to`'s account.
    pub fn mint(&self, asset: AssetId, to: AccountId, amount: U256) -> Result<(), LedgerError> {
        let mut book = self.book.lock();
        let credited = checked_add(book.balance(asset, to), amount, "mint")?;
        book.balances.insert((asset, to), credited);
        Ok(())
    }

    /// Set the allowance `owner` grants `spender`, replacing any previous one.
    pub fn approve(&self, asset: AssetId, owner: AccountId, spender: AccountId, amount: U256) {
        self.book
            .lock()
            .allowances
            .insert((asset, owner, spender), amount);
    }

    /// Refuse every transfer of `asset` touching `account`.
    pub fn freeze(&self, asset: AssetId, account: AccountId) {
        self.book.lock().frozen.insert((asset, account));
    }

    pub fn unfreeze(&self, asset: AssetId, account: AccountId) {
        self.book.lock().frozen.remove(&(asset, account));
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> U256 {
        self.book.lock().balance(*asset, *account)
    }

    fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> U256 {
        self.book.lock().allowance(*asset, *owner, *spender)
    }

    fn apply(&self, transfers: &[LedgerTransfer]) -> Result<(), LedgerError> {
        let mut book = self.book.lock();
        let mut staged = book.clone();
        for leg in transfers {
            staged.apply_leg(leg)?;
        }
        *book = staged;
        Ok(())
    }
}
