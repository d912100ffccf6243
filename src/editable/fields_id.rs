//! Content fingerprints.
//!
//! A [`FieldsId`] is minted every time the line content of an edit state
//! changes. Comparing two ids is the cheap stand-in for comparing content.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::util::random_string;

const RANDOM_PART_LEN: usize = 10;

/// Fingerprint of the content-affecting fields of an [`EditState`](super::EditState)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct FieldsId(String);

impl FieldsId {
    /// Mint a fresh fingerprint: `<unix millis>-<random>`
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self(format!("{}-{}", millis, random_string(RANDOM_PART_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The initial placeholder state has an empty id
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creation time encoded in the id, if it has one
    pub fn timestamp_millis(&self) -> Option<u128> {
        let (millis, _) = self.0.split_once('-')?;
        millis.parse().ok()
    }
}

impl fmt::Display for FieldsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldsId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = FieldsId::generate();
        let b = FieldsId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_carries_timestamp() {
        let id = FieldsId::generate();
        assert!(id.timestamp_millis().is_some());
        assert!(!id.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        let id = FieldsId::default();
        assert!(id.is_empty());
        assert_eq!(id.timestamp_millis(), None);
    }
}
