//! # bpo-cli: Command-Line Tooling for the Bonded Price Oracle
//!
//! Provides the `bpo` binary.
//!
//! ## Subcommands
//!
//! - `bpo simulate`: Run a YAML scenario of mints, approvals, clock
//!   advances, and oracle calls against the in-memory host.
//! - `bpo hash`: Compute the integrity hash a reporter must echo back.
//!
//! ```bash
//! bpo simulate --scenario scenarios/reference.yaml
//! bpo hash --params params.yaml --creator alice --value 1e16
//! ```
//!
//! Actors and assets are named by label. A label that parses as a hex
//! address is used verbatim; anything else is mapped to a stable address
//! with [`AccountId::from_label`].

pub mod hash;
pub mod scenario;
pub mod simulate;

use std::path::Path;

use anyhow::{Context, Result};
use bpo_core::{AccountId, AssetId};
use bpo_engine::OracleConfig;

/// Load oracle configuration from a YAML file, or from the environment when
/// no file is given.
pub fn load_config(path: Option<&Path>) -> Result<OracleConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config: OracleConfig = serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            config.validate()?;
            config
        }
        None => OracleConfig::from_env()?,
    };
    tracing::debug!(?config, "oracle configuration loaded");
    Ok(config)
}

/// Resolve an account label.
pub fn account(label: &str) -> AccountId {
    label
        .parse()
        .unwrap_or_else(|_| AccountId::from_label(label))
}

/// Resolve an asset label.
pub fn asset(label: &str) -> AssetId {
    label.parse().unwrap_or_else(|_| AssetId::from_label(label))
}
