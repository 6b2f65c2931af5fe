//! Tagged lookup key for record fetches.
//!
//! The CRUD passthrough accepts either a numeric row identifier or an
//! opaque secondary token in the same path segment. The ambiguity is
//! resolved exactly once, here, instead of via runtime type inspection
//! inside query-building code.

use std::fmt;

use crate::error::GatewayError;

/// Longest token accepted in a lookup path segment.
const MAX_TOKEN_LEN: usize = 128;

/// How a single record is addressed by a read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// Lookup by the numeric primary key.
    ById(i64),
    /// Lookup by the configured secondary unique token column.
    ByToken(String),
}

impl RecordKey {
    /// Resolves a raw path segment into a lookup key.
    ///
    /// A segment that parses as a non-negative `i64` is an id lookup;
    /// anything else is a token lookup. Tokens are always bound as query
    /// parameters, so validation only guards length and control bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for empty, overlong, or
    /// control-character segments.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        if raw.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "record key is empty".to_string(),
            ));
        }
        if let Ok(id) = raw.parse::<i64>() {
            if id < 0 {
                return Err(GatewayError::InvalidRequest(format!(
                    "record id must be non-negative, got {id}"
                )));
            }
            return Ok(Self::ById(id));
        }
        if raw.len() > MAX_TOKEN_LEN {
            return Err(GatewayError::InvalidRequest(format!(
                "record token exceeds {MAX_TOKEN_LEN} bytes"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(GatewayError::InvalidRequest(
                "record token contains control characters".to_string(),
            ));
        }
        Ok(Self::ByToken(raw.to_string()))
    }

    /// Returns the numeric id when this is an id lookup.
    #[must_use]
    pub const fn as_id(&self) -> Option<i64> {
        match self {
            Self::ById(id) => Some(*id),
            Self::ByToken(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id:{id}"),
            Self::ByToken(token) => write!(f, "token:{token}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segment_is_id() {
        assert_eq!(RecordKey::parse("42").ok(), Some(RecordKey::ById(42)));
        assert_eq!(RecordKey::parse("0").ok(), Some(RecordKey::ById(0)));
    }

    #[test]
    fn non_numeric_segment_is_token() {
        assert_eq!(
            RecordKey::parse("a1b2-c3d4").ok(),
            Some(RecordKey::ByToken("a1b2-c3d4".to_string()))
        );
    }

    #[test]
    fn negative_id_rejected() {
        assert!(RecordKey::parse("-1").is_err());
    }

    #[test]
    fn empty_and_control_rejected() {
        assert!(RecordKey::parse("").is_err());
        assert!(RecordKey::parse("tok\nen").is_err());
    }

    #[test]
    fn overlong_token_rejected() {
        let long = "x".repeat(129);
        assert!(RecordKey::parse(&long).is_err());
    }

    #[test]
    fn as_id_accessor() {
        assert_eq!(RecordKey::ById(7).as_id(), Some(7));
        assert_eq!(RecordKey::ByToken("t".to_string()).as_id(), None);
    }
}
