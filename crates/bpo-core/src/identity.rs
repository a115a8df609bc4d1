//! # Identity Newtypes
//!
//! Newtype wrappers for the three identifier namespaces of the oracle.
//! These prevent identifier confusion: an `AssetId` cannot be passed where
//! an `AccountId` is expected, even though both wrap a 20-byte address.
//!
//! ## Security Invariant
//!
//! Type-level distinction between namespaces prevents parameter-substitution
//! mistakes such as paying a reward to an asset address.

use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Sequential identifier of a price report. The first report is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportId(pub u64);

impl ReportId {
    /// The identifier that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Access the inner integer.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "report:{}", self.0)
    }
}

/// A participant: creator, reporter, disputer, settler, or fee recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Address);

/// A fungible asset tracked by the external asset ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub Address);

/// Derive a stable 20-byte address from a human label.
///
/// Used for named actors in simulations and tests: the last 20 bytes of
/// `sha256(label)`.
fn address_from_label(label: &str) -> Address {
    let hash = Sha256::digest(label.as_bytes());
    Address::from_slice(&hash[12..])
}

macro_rules! address_newtype {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Wrap a raw address.
            pub fn new(address: Address) -> Self {
                Self(address)
            }

            /// Deterministically derive an identifier from a label.
            pub fn from_label(label: &str) -> Self {
                Self(address_from_label(label))
            }

            /// Access the inner address.
            pub fn address(&self) -> &Address {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Address::from_str(raw)
                    .map(Self)
                    .map_err(|_| CoreError::InvalidIdentifier(s.to_string()))
            }
        }
    };
}

address_newtype!(AccountId, "account");
address_newtype!(AssetId, "asset");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_are_sequential() {
        let first = ReportId(1);
        assert_eq!(first.next(), ReportId(2));
        assert_eq!(first.next().get(), 2);
        assert_eq!(first.to_string(), "report:1");
    }

    #[test]
    fn labels_derive_stable_distinct_accounts() {
        let alice = AccountId::from_label("alice");
        assert_eq!(alice, AccountId::from_label("alice"));
        assert_ne!(alice, AccountId::from_label("bob"));
    }

    #[test]
    fn account_and_asset_from_same_label_share_address_not_type() {
        let account = AccountId::from_label("weth");
        let asset = AssetId::from_label("weth");
        assert_eq!(account.address(), asset.address());
    }

    #[test]
    fn parse_display_form_and_bare_hex() {
        let asset = AssetId::new(Address::repeat_byte(0xab));
        let parsed: AssetId = asset.to_string().parse().unwrap();
        assert_eq!(parsed, asset);
        let bare: AssetId = format!("{}", asset.address()).parse().unwrap();
        assert_eq!(bare, asset);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("account:not-hex".parse::<AccountId>().is_err());
    }

    #[test]
    fn serde_round_trip() {
        let id = AccountId::from_label("carol");
        let json = serde_json::to_string(&id).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
