//! Validated SQL identifier newtypes.
//!
//! Table and column names arrive from clients and from configuration and
//! are interpolated into SQL text (they cannot be bound as parameters),
//! so every raw string passes through [`TableName::parse`] or
//! [`ColumnName::parse`] before any query is built. Only `[A-Za-z0-9_]`
//! is accepted, which rules out quoting tricks and injection via
//! identifiers.

use std::fmt;

use serde::Serialize;

use crate::error::GatewayError;

/// PostgreSQL caps unquoted identifiers at 63 bytes.
const MAX_IDENT_LEN: usize = 63;

/// Validates one identifier segment. Leading digits are rejected because
/// they would require quoting, which this gateway never does.
fn validate_ident(raw: &str) -> Result<(), String> {
    if raw.is_empty() {
        return Err("identifier is empty".to_string());
    }
    if raw.len() > MAX_IDENT_LEN {
        return Err(format!("identifier exceeds {MAX_IDENT_LEN} bytes"));
    }
    if raw.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(format!("identifier '{raw}' starts with a digit"));
    }
    if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "identifier '{raw}' contains characters outside [A-Za-z0-9_]"
        ));
    }
    Ok(())
}

/// A validated source table name.
///
/// Guaranteed to match `[A-Za-z_][A-Za-z0-9_]*` and to fit in a
/// PostgreSQL identifier, so it is safe to interpolate into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Parses and validates a raw table name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidTableName`] when the name is empty,
    /// too long, or contains characters outside `[A-Za-z0-9_]`.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        validate_ident(raw).map_err(GatewayError::InvalidTableName)?;
        Ok(Self(raw.to_string()))
    }

    /// Returns the validated name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated column name, same rules as [`TableName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColumnName(String);

impl ColumnName {
    /// Parses and validates a raw column name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the name is not a
    /// plain identifier.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        validate_ident(raw)
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid column name: {e}")))?;
        Ok(Self(raw.to_string()))
    }

    /// Returns the validated name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["orders", "video_stats", "t1", "_private"] {
            assert!(TableName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_injection_shapes() {
        for name in [
            "orders; DROP TABLE users",
            "orders--",
            "a\"b",
            "a b",
            "naïve",
            "",
        ] {
            assert!(
                TableName::parse(name).is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(TableName::parse("1orders").is_err());
    }

    #[test]
    fn rejects_overlong_identifier() {
        let long = "a".repeat(64);
        assert!(TableName::parse(&long).is_err());
        let ok = "a".repeat(63);
        assert!(TableName::parse(&ok).is_ok());
    }

    #[test]
    fn column_name_same_rules() {
        assert!(ColumnName::parse("view_count").is_ok());
        assert!(ColumnName::parse("view count").is_err());
    }

    #[test]
    fn display_round_trips() {
        let Ok(name) = TableName::parse("orders") else {
            panic!("valid name");
        };
        assert_eq!(format!("{name}"), "orders");
        assert_eq!(name.as_str(), "orders");
    }
}
