//! # Hash Subcommand
//!
//! Computes the integrity hash a report will carry, so a reporter can build
//! their transaction before reading it back from the oracle. The creation
//! tick is not part of the commitment; the creator and the creation payment
//! are.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bpo_core::amount::checked_sub;
use bpo_core::{parse_amount, ContentDigest, U256};
use bpo_engine::OracleConfig;
use bpo_state::{integrity_hash, ReportConfig};
use clap::Args;

use crate::account;
use crate::scenario::ParamsSpec;

/// Arguments for the `bpo hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Creation parameters (YAML, same shape as a scenario's `params`).
    #[arg(long)]
    pub params: PathBuf,

    /// Creator label or address.
    #[arg(long)]
    pub creator: String,

    /// Native value attached to `create`.
    #[arg(long)]
    pub value: String,
}

/// Execute the hash subcommand.
pub fn run_hash(args: &HashArgs, config: &OracleConfig) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.params)
        .with_context(|| format!("failed to read params {}", args.params.display()))?;
    let template: ParamsSpec = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse params {}", args.params.display()))?;
    let value = parse_amount(&args.value)?;

    let digest = compute(&template, &args.creator, value, config)?;
    println!("{digest}");
    Ok(0)
}

/// Integrity hash for `template` created by `creator` with payment `value`.
pub fn compute(
    template: &ParamsSpec,
    creator: &str,
    value: U256,
    config: &OracleConfig,
) -> Result<ContentDigest> {
    let params = template.to_params()?;
    if value <= U256::from(config.min_creation_value) || value <= params.settler_reward {
        bail!(
            "creation value {value} must exceed both {} and the settler reward {}",
            config.min_creation_value,
            params.settler_reward
        );
    }
    let reporter_reward = checked_sub(value, params.settler_reward, "reporter reward")?;
    let report = ReportConfig::from_params(&params, reporter_reward, 0);
    let digest = integrity_hash(
        &report,
        params.track_disputes,
        params.keep_fee_on_dispute,
        params.callback.as_ref(),
        &account(creator),
    )?;
    tracing::debug!(%digest, creator, "integrity hash computed");
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use bpo_core::ManualClock;
    use bpo_custody::{Custodian, InMemoryAssetLedger, InMemoryNativeBank};
    use bpo_engine::{CallContext, PriceOracle};

    const PARAMS: &str = r#"
asset1: weth
asset2: usdc
exact_asset1_amount: "1e18"
settler_reward: "1e15"
dispute_delay: 5
protocol_fee_rate: 1000
"#;

    #[test]
    fn matches_the_hash_the_oracle_stores() {
        let template: ParamsSpec = serde_yaml::from_str(PARAMS).unwrap();
        let value = U256::from(10_000_000_000_000_000u64);
        let offline = compute(&template, "alice", value, &OracleConfig::default()).unwrap();

        let bank = Arc::new(InMemoryNativeBank::new());
        bank.fund(account("alice"), value).unwrap();
        let custodian = Custodian::new(
            account("escrow"),
            Arc::new(InMemoryAssetLedger::new()),
            bank,
        );
        let oracle = PriceOracle::new(
            OracleConfig::default(),
            Arc::new(ManualClock::new(1_700_000_000, 77)),
            custodian,
            account("owner"),
        )
        .unwrap();
        let id = oracle
            .create(
                &CallContext::new(account("alice")).with_value(value),
                template.to_params().unwrap(),
            )
            .unwrap();
        assert_eq!(oracle.integrity_hash(id).unwrap(), offline);
    }

    #[test]
    fn creator_and_value_change_the_hash() {
        let template: ParamsSpec = serde_yaml::from_str(PARAMS).unwrap();
        let config = OracleConfig::default();
        let value = U256::from(10_000_000_000_000_000u64);
        let base = compute(&template, "alice", value, &config).unwrap();
        assert_ne!(base, compute(&template, "bob", value, &config).unwrap());
        assert_ne!(
            base,
            compute(&template, "alice", value + U256::from(1u64), &config).unwrap()
        );
    }

    #[test]
    fn value_must_cover_settler_reward() {
        let template: ParamsSpec = serde_yaml::from_str(PARAMS).unwrap();
        let reward = U256::from(1_000_000_000_000_000u64);
        assert!(compute(&template, "alice", reward, &OracleConfig::default()).is_err());
    }

    #[test]
    fn run_hash_reads_params_file() {
        let dir = tempfile::tempdir().unwrap();
        let params = dir.path().join("params.yaml");
        std::fs::write(&params, PARAMS).unwrap();
        let args = HashArgs {
            params,
            creator: "alice".to_string(),
            value: "1e16".to_string(),
        };
        assert_eq!(run_hash(&args, &OracleConfig::default()).unwrap(), 0);
    }
}
