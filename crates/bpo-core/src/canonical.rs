//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the only input [`crate::sha256_digest`] accepts.
//! Bytes are produced with RFC 8785 (JCS), so a report commitment depends on
//! field values alone and not on struct declaration order.
//!
//! Floats are refused outright. Amounts are `U256` and serialize as hex
//! strings; identifiers serialize as checksummed addresses. A float in a
//! preimage therefore means a caller bypassed those types.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// JCS-encoded bytes of a float-free value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize `value`.
    ///
    /// # Errors
    ///
    /// [`CanonicalizationError::FloatRejected`] when any nested number is a
    /// float; [`CanonicalizationError::SerializationFailed`] when `value`
    /// cannot be represented as JSON.
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let tree = serde_json::to_value(value)?;
        ensure_integral(&tree)?;
        Ok(Self(serde_jcs::to_vec(&tree)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn ensure_integral(tree: &Value) -> Result<(), CanonicalizationError> {
    match tree {
        Value::Number(n) if n.is_f64() => Err(CanonicalizationError::FloatRejected(
            n.as_f64().unwrap_or(f64::NAN),
        )),
        Value::Array(items) => items.iter().try_for_each(ensure_integral),
        Value::Object(fields) => fields.values().try_for_each(ensure_integral),
        _ => Ok(()),
    }
}
