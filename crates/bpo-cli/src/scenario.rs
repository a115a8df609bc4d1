//! # Scenario Files
//!
//! A scenario is a YAML document describing the host's starting clock, the
//! consumers to register, and an ordered list of steps:
//!
//! ```yaml
//! name: reference
//! clock: { seconds: 1700000000, ticks: 1000 }
//! steps:
//!   - { action: mint, asset: weth, to: alice, amount: "1000e18" }
//!   - { action: approve, asset: weth, owner: alice }
//!   - { action: fund_native, to: creator, amount: "1e16" }
//!   - action: create
//!     creator: creator
//!     value: "1e16"
//!     params: { asset1: weth, asset2: usdc, exact_asset1_amount: "1e18", settler_reward: "1e15" }
//!   - { action: advance, ticks: 6 }
//!   - { action: settle, settler: carol, report: 1, expect_error: timing_violation }
//! ```
//!
//! Amounts are integers or quoted strings in any form [`parse_amount`]
//! accepts. Unquoted scientific notation is a YAML float and is refused.

use bpo_core::{parse_amount, TimeUnit, U256};
use bpo_engine::ErrorKind;
use bpo_state::{CallbackSpec, ReportParams};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::{account, asset};

/// A 256-bit amount written as an integer or a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub U256);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Self(U256::from(n))),
            Raw::Text(s) => parse_amount(&s).map(Self).map_err(de::Error::custom),
        }
    }
}

impl Amount {
    pub fn get(self) -> U256 {
        self.0
    }
}

/// Starting point of the manual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClockStart {
    pub seconds: u64,
    pub ticks: u64,
}

impl Default for ClockStart {
    fn default() -> Self {
        Self {
            seconds: 1_700_000_000,
            ticks: 1,
        }
    }
}

/// A scripted settlement consumer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsumerSpec {
    pub target: String,
    /// Gas charged per notification.
    #[serde(default)]
    pub gas_cost: u64,
    /// Fail every notification.
    #[serde(default)]
    pub revert: bool,
}

/// Callback section of [`ParamsSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallbackSection {
    pub target: String,
    /// Four bytes as hex, e.g. `"0xdeadbeef"`.
    pub selector: String,
    pub gas_limit: u64,
}

/// Creation parameters as written in YAML. Everything but the pair, the
/// exact amount, and the settler reward has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParamsSpec {
    pub asset1: String,
    pub asset2: String,
    pub exact_asset1_amount: Amount,
    #[serde(default = "defaults::fee_rate")]
    pub fee_rate: u64,
    #[serde(default = "defaults::escalation_multiplier_percent")]
    pub escalation_multiplier_percent: u64,
    #[serde(default = "defaults::settlement_duration")]
    pub settlement_duration: u64,
    #[serde(default = "defaults::escalation_halt_threshold")]
    pub escalation_halt_threshold: Amount,
    #[serde(default = "defaults::dispute_delay")]
    pub dispute_delay: u64,
    #[serde(default)]
    pub protocol_fee_rate: u64,
    pub settler_reward: Amount,
    #[serde(default = "defaults::time_unit")]
    pub time_unit: TimeUnit,
    #[serde(default = "defaults::yes")]
    pub track_disputes: bool,
    #[serde(default)]
    pub callback: Option<CallbackSection>,
    #[serde(default)]
    pub keep_fee_on_dispute: bool,
}

mod defaults {
    use super::Amount;
    use bpo_core::{TimeUnit, U256};

    pub fn fee_rate() -> u64 {
        3_000
    }
    pub fn escalation_multiplier_percent() -> u64 {
        110
    }
    pub fn settlement_duration() -> u64 {
        300
    }
    pub fn escalation_halt_threshold() -> Amount {
        Amount(U256::MAX)
    }
    pub fn dispute_delay() -> u64 {
        0
    }
    pub fn time_unit() -> TimeUnit {
        TimeUnit::Ticks
    }
    pub fn yes() -> bool {
        true
    }
}

impl ParamsSpec {
    /// Resolve labels and selector into engine parameters.
    pub fn to_params(&self) -> anyhow::Result<ReportParams> {
        let callback = self
            .callback
            .as_ref()
            .map(|cb| -> anyhow::Result<CallbackSpec> {
                Ok(CallbackSpec {
                    target: account(&cb.target),
                    selector: parse_selector(&cb.selector)?,
                    gas_limit: cb.gas_limit,
                })
            })
            .transpose()?;
        Ok(ReportParams {
            asset1: asset(&self.asset1),
            asset2: asset(&self.asset2),
            exact_asset1_amount: self.exact_asset1_amount.get(),
            fee_rate: self.fee_rate,
            escalation_multiplier_percent: self.escalation_multiplier_percent,
            settlement_duration: self.settlement_duration,
            escalation_halt_threshold: self.escalation_halt_threshold.get(),
            dispute_delay: self.dispute_delay,
            protocol_fee_rate: self.protocol_fee_rate,
            settler_reward: self.settler_reward.get(),
            time_unit: self.time_unit,
            track_disputes: self.track_disputes,
            callback,
            keep_fee_on_dispute: self.keep_fee_on_dispute,
        })
    }
}

/// Parse a four-byte selector written as hex.
pub fn parse_selector(raw: &str) -> anyhow::Result<[u8; 4]> {
    let hex = raw.trim().trim_start_matches("0x");
    if hex.len() != 8 {
        anyhow::bail!("selector must be 4 bytes of hex, got {raw:?}");
    }
    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| anyhow::anyhow!("selector must be 4 bytes of hex, got {raw:?}"))?;
    Ok(value.to_be_bytes())
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Create `amount` of `asset` in `to`'s ledger account.
    Mint {
        asset: String,
        to: String,
        amount: Amount,
    },
    /// Let the oracle escrow pull `owner`'s `asset`. Unlimited by default.
    Approve {
        asset: String,
        owner: String,
        #[serde(default)]
        amount: Option<Amount>,
    },
    FundNative {
        to: String,
        amount: Amount,
    },
    /// Make `account` refuse direct native payments.
    RejectNative {
        account: String,
    },
    AcceptNative {
        account: String,
    },
    /// Toggle the wrapped-native fallback sink.
    WrappedFallback {
        enabled: bool,
    },
    Freeze {
        asset: String,
        account: String,
    },
    Unfreeze {
        asset: String,
        account: String,
    },
    Advance {
        #[serde(default)]
        ticks: u64,
        #[serde(default)]
        seconds: u64,
    },
    Create {
        creator: String,
        value: Amount,
        params: ParamsSpec,
    },
    Submit {
        reporter: String,
        report: u64,
        amount1: Amount,
        amount2: Amount,
        #[serde(default)]
        beneficiary: Option<String>,
        /// Override the stored hash, e.g. to exercise a mismatch.
        #[serde(default)]
        integrity_hash: Option<String>,
    },
    Dispute {
        disputer: String,
        report: u64,
        asset: String,
        amount1: Amount,
        amount2: Amount,
        /// Defaults to the currently stored amount2.
        #[serde(default)]
        expected_amount2: Option<Amount>,
        #[serde(default)]
        beneficiary: Option<String>,
        #[serde(default)]
        integrity_hash: Option<String>,
    },
    Settle {
        settler: String,
        report: u64,
        #[serde(default)]
        gas: Option<u64>,
    },
    WithdrawAssetFees {
        caller: String,
        asset: String,
    },
    WithdrawNativeFees {
        caller: String,
    },
    SetFeeRecipient {
        caller: String,
        recipient: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::FundNative { .. } => "fund_native",
            Self::RejectNative { .. } => "reject_native",
            Self::AcceptNative { .. } => "accept_native",
            Self::WrappedFallback { .. } => "wrapped_fallback",
            Self::Freeze { .. } => "freeze",
            Self::Unfreeze { .. } => "unfreeze",
            Self::Advance { .. } => "advance",
            Self::Create { .. } => "create",
            Self::Submit { .. } => "submit",
            Self::Dispute { .. } => "dispute",
            Self::Settle { .. } => "settle",
            Self::WithdrawAssetFees { .. } => "withdraw_asset_fees",
            Self::WithdrawNativeFees { .. } => "withdraw_native_fees",
            Self::SetFeeRecipient { .. } => "set_fee_recipient",
        }
    }
}

/// An action plus the failure it is expected to produce, if any.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub clock: ClockStart,
    #[serde(default = "default_escrow")]
    pub escrow: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub consumers: Vec<ConsumerSpec>,
    pub steps: Vec<Step>,
}

fn default_escrow() -> String {
    "oracle-escrow".to_string()
}

fn default_owner() -> String {
    "owner".to_string()
}

impl Scenario {
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
