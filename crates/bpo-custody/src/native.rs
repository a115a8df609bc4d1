//! # Native Currency Bank
//!
//! The host's native currency. Direct payments may be refused by the
//! recipient; a wrapped-native credit is the fallback sink for those.

use std::collections::{HashMap, HashSet};

use bpo_core::amount::{checked_add, checked_sub};
use bpo_core::{AccountId, U256};
use parking_lot::Mutex;

use crate::error::NativeTransferError;

/// Host native-currency bank.
pub trait NativeBank: Send + Sync {
    fn balance_of(&self, account: &AccountId) -> U256;

    /// Pay `amount` directly. The recipient may refuse.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: U256)
        -> Result<(), NativeTransferError>;

    /// Debit `from` and credit `to` with wrapped native.
    fn transfer_wrapped(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: U256,
    ) -> Result<(), NativeTransferError>;
}

#[derive(Debug, Default)]
struct Vault {
    balances: HashMap<AccountId, U256>,
    wrapped: HashMap<AccountId, U256>,
    rejecting: HashSet<AccountId>,
    wrapped_frozen: bool,
}

impl Vault {
    fn debit(&mut self, account: &AccountId, amount: U256) -> Result<(), NativeTransferError> {
        let available = self.balances.get(account).copied().unwrap_or(U256::ZERO);
        if available < amount {
            return Err(NativeTransferError::InsufficientFunds {
                account: *account,
                required: amount,
                available,
            });
        }
        self.balances
            .insert(*account, checked_sub(available, amount, "native debit")?);
        Ok(())
    }

    fn credit(
        map: &mut HashMap<AccountId, U256>,
        account: &AccountId,
        amount: U256,
    ) -> Result<(), NativeTransferError> {
        let entry = map.entry(*account).or_insert(U256::ZERO);
        *entry = checked_add(*entry, amount, "native credit")?;
        Ok(())
    }
}

/// In-memory [`NativeBank`] for tests and simulation.
#[derive(Debug, Default)]
pub struct InMemoryNativeBank {
    vault: Mutex<Vault>,
}

impl InMemoryNativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `account` with freshly created native currency.
    pub fn fund(&self, account: AccountId, amount: U256) -> Result<(), NativeTransferError> {
        let mut vault = self.vault.lock();
        Vault::credit(&mut vault.balances, &account, amount)
    }

    /// Make `account` refuse direct payments.
    pub fn reject_direct(&self, account: AccountId) {
        self.vault.lock().rejecting.insert(account);
    }

    pub fn accept_direct(&self, account: AccountId) {
        self.vault.lock().rejecting.remove(&account);
    }

    /// Stop or resume the wrapped-native fallback sink.
    pub fn set_wrapped_frozen(&self, frozen: bool) {
        self.vault.lock().wrapped_frozen = frozen;
    }

    pub fn wrapped_balance_of(&self, account: &AccountId) -> U256 {
        self.vault
            .lock()
            .wrapped
            .get(account)
            .copied()
            .unwrap_or(U256::ZERO)
    }
}

impl NativeBank for InMemoryNativeBank {
    fn balance_of(&self, account: &AccountId) -> U256 {
        self.vault
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: U256,
    ) -> Result<(), NativeTransferError> {
        let mut vault = self.vault.lock();
        if vault.rejecting.contains(to) {
            return Err(NativeTransferError::Rejected { to: *to, amount });
        }
        vault.debit(from, amount)?;
        Vault::credit(&mut vault.balances, to, amount)
    }

    fn transfer_wrapped(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: U256,
    ) -> Result<(), NativeTransferError> {
        let mut vault = self.vault.lock();
        if vault.wrapped_frozen {
            return Err(NativeTransferError::FallbackUnavailable { to: *to });
        }
        vault.debit(from, amount)?;
        Vault::credit(&mut vault.wrapped, to, amount)
    }
}
