use crate::{L402Error, Result};

/// The condition named by a caveat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Operation the token authorizes
    Action,
    /// Invoiced amount in sats
    Amount,
    /// Expiry as a millisecond epoch timestamp
    Expires,
    /// Any other condition; left to custom verifiers
    Custom(String),
}

impl Condition {
    pub const ACTION: &'static str = "action";
    pub const AMOUNT: &'static str = "amount";
    pub const EXPIRES: &'static str = "expires";

    /// Classifies a condition string. Matching is exact: `Action` is not `action`.
    pub fn parse(s: &str) -> Self {
        match s {
            Self::ACTION => Condition::Action,
            Self::AMOUNT => Condition::Amount,
            Self::EXPIRES => Condition::Expires,
            other => Condition::Custom(other.to_string()),
        }
    }

    /// The wire name of this condition
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Action => Self::ACTION,
            Condition::Amount => Self::AMOUNT,
            Condition::Expires => Self::EXPIRES,
            Condition::Custom(name) => name,
        }
    }

    /// Returns true for conditions this crate knows how to enforce
    pub fn is_well_known(&self) -> bool {
        !matches!(self, Condition::Custom(_))
    }
}

/// Parses the decimal payload of an `amount` or `expires` caveat.
///
/// Only plain ASCII digits are accepted; signs, whitespace and fractions are rejected.
pub fn parse_decimal(condition: &str, value: &str) -> Result<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(L402Error::InvalidCaveat(format!(
            "'{condition}' expects a decimal integer, got '{value}'"
        )));
    }
    value
        .parse::<u64>()
        .map_err(|e| L402Error::InvalidCaveat(format!("'{condition}' value '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_known() {
        assert_eq!(Condition::parse("action"), Condition::Action);
        assert_eq!(Condition::parse("amount"), Condition::Amount);
        assert_eq!(Condition::parse("expires"), Condition::Expires);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(
            Condition::parse("Action"),
            Condition::Custom("Action".to_string())
        );
    }

    #[test]
    fn test_as_str_roundtrip() {
        for name in ["action", "amount", "expires", "region", ""] {
            assert_eq!(Condition::parse(name).as_str(), name);
        }
    }

    #[test]
    fn test_is_well_known() {
        assert!(Condition::Expires.is_well_known());
        assert!(!Condition::Custom("tier".into()).is_well_known());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("amount", "1010").unwrap(), 1010);
        assert_eq!(parse_decimal("amount", "0").unwrap(), 0);
        assert!(parse_decimal("amount", "").is_err());
        assert!(parse_decimal("amount", "-5").is_err());
        assert!(parse_decimal("amount", " 5").is_err());
        assert!(parse_decimal("amount", "10.5").is_err());
        assert!(parse_decimal("expires", "99999999999999999999999").is_err());
    }
}
