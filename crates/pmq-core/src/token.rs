//! Market identification types.
//!
//! Each short-lived binary market settles to one of two outcome tokens.
//! The bot quotes a single outcome token per market, so `TokenId` is the
//! primary key for every per-market map in the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of an outcome token.
///
/// The exchange issues these as long numeric strings; the bot treats them
/// as opaque keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_roundtrip() {
        let id = TokenId::from("7132107945");
        assert_eq!(id.as_str(), "7132107945");
        assert_eq!(id.to_string(), "7132107945");
    }
}
