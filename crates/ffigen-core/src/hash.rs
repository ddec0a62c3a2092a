//! Model fingerprints.
//!
//! A generated binding records the fingerprint of the model it came from, so
//! regenerating from an unchanged model yields an identical header line.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 over the canonical JSON encoding of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint any serializable value.
    pub fn of<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_vec(value)?;
        Ok(Self(Sha256::digest(&json).into()))
    }
}

/// Lower-case hex, 64 digits.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_same_fingerprint() {
        let a = Fingerprint::of(&vec!["Color", "Node"]).unwrap();
        let b = Fingerprint::of(&vec!["Color", "Node"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Fingerprint::of(&vec!["Node", "Color"]).unwrap());
    }

    #[test]
    fn display_is_lower_hex() {
        let text = Fingerprint::of(&42u32).unwrap().to_string();
        assert_eq!(text.len(), 64);
        assert!(text.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }
}
