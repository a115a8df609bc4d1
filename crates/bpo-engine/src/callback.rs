//! # Settlement Callback Dispatcher
//!
//! Notifies a registered consumer that a report settled. The consumer runs
//! with a [`GasMeter`] capped at exactly the gas limit the creator asked for,
//! and whatever it does (error, overrun, panic) is captured as a
//! [`CallbackOutcome`]. A fault never propagates into settlement.
//!
//! Before settlement mutates anything, [`check_headroom`] verifies the caller
//! supplied enough budget that the stipend is guaranteed after the 1/64
//! reserve is withheld.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bpo_core::{AccountId, AssetId, ReportId, U256};
use thiserror::Error;

use crate::error::OracleError;

/// Notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementNotice {
    pub report_id: ReportId,
    pub price: U256,
    pub settlement_tick: u64,
    pub asset1: AssetId,
    pub asset2: AssetId,
}

impl SettlementNotice {
    /// Length of an encoded notice: selector plus five 32-byte words.
    pub const ENCODED_LEN: usize = 4 + 5 * 32;

    /// `selector ‖ report_id ‖ price ‖ settlement_tick ‖ asset1 ‖ asset2`,
    /// each word big-endian and left-padded to 32 bytes.
    pub fn encode(&self, selector: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.extend_from_slice(&selector);
        out.extend_from_slice(&U256::from(self.report_id.get()).to_be_bytes::<32>());
        out.extend_from_slice(&self.price.to_be_bytes::<32>());
        out.extend_from_slice(&U256::from(self.settlement_tick).to_be_bytes::<32>());
        for asset in [&self.asset1, &self.asset2] {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(asset.address().as_slice());
            out.extend_from_slice(&word);
        }
        out
    }
}

/// Why a callback did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackFault {
    #[error("no consumer registered at {0}")]
    Unregistered(AccountId),
    #[error("out of gas (limit {limit})")]
    OutOfGas { limit: u64 },
    #[error("consumer reverted: {0}")]
    Reverted(String),
    #[error("consumer panicked: {0}")]
    Panicked(String),
}

/// Execution budget handed to a consumer.
#[derive(Debug)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// Consume `amount`. Overrunning the limit exhausts the meter.
    pub fn charge(&mut self, amount: u64) -> Result<(), CallbackFault> {
        match self.used.checked_add(amount) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => {
                self.used = self.limit;
                Err(CallbackFault::OutOfGas { limit: self.limit })
            }
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// A consumer of settlement notifications.
pub trait Notifiable: Send + Sync {
    fn on_settlement(
        &self,
        selector: [u8; 4],
        notice: &SettlementNotice,
        meter: &mut GasMeter,
    ) -> Result<(), CallbackFault>;
}

/// Recorded result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub success: bool,
    pub gas_used: u64,
    pub fault: Option<CallbackFault>,
}

/// Verify `available` covers the stipend plus overhead once 1/64 is withheld.
pub fn check_headroom(available: u64, gas_limit: u64, overhead: u64) -> Result<(), OracleError> {
    let usable = available - available / 64;
    let required = gas_limit.saturating_add(overhead);
    if usable < required {
        return Err(OracleError::GasProvisioning {
            required,
            available: usable,
        });
    }
    Ok(())
}

/// Invoke `consumer` with a meter of exactly `gas_limit`, isolating faults.
pub fn dispatch(
    consumer: Option<Arc<dyn Notifiable>>,
    target: AccountId,
    selector: [u8; 4],
    gas_limit: u64,
    notice: &SettlementNotice,
) -> CallbackOutcome {
    let Some(consumer) = consumer else {
        return CallbackOutcome {
            success: false,
            gas_used: 0,
            fault: Some(CallbackFault::Unregistered(target)),
        };
    };

    let mut meter = GasMeter::new(gas_limit);
    let result = catch_unwind(AssertUnwindSafe(|| {
        consumer.on_settlement(selector, notice, &mut meter)
    }));
    let fault = match result {
        Ok(Ok(())) => None,
        Ok(Err(fault)) => Some(fault),
        Err(payload) => Some(CallbackFault::Panicked(panic_message(payload.as_ref()))),
    };
    CallbackOutcome {
        success: fault.is_none(),
        gas_used: meter.used(),
        fault,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
