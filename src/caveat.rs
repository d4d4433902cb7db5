use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A caveat restricts the authority granted by a macaroon.
///
/// The signer treats both fields as opaque strings; what a condition means
/// is decided by the [`Verifier`](crate::verifier::Verifier) at request time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caveat {
    /// The restriction type (e.g. `action`, `amount`, `expires`)
    pub condition: String,

    /// The payload for that restriction
    pub value: String,
}

impl Caveat {
    /// Creates a caveat from any condition/value pair
    pub fn new(condition: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            value: value.into(),
        }
    }

    /// `action` caveat naming the operation this token authorizes
    pub fn action(action: impl Into<String>) -> Self {
        Self::new(Condition::ACTION, action)
    }

    /// `amount` caveat with the invoiced amount in sats
    pub fn amount(sats: u64) -> Self {
        Self::new(Condition::AMOUNT, sats.to_string())
    }

    /// `expires` caveat with a millisecond epoch timestamp
    pub fn expires(epoch_ms: u64) -> Self {
        Self::new(Condition::EXPIRES, epoch_ms.to_string())
    }

    /// Typed view of this caveat's condition
    pub fn kind(&self) -> Condition {
        Condition::parse(&self.condition)
    }
}

impl fmt::Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.condition, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_constructors() {
        let caveat = Caveat::action("create_post");
        assert_eq!(caveat.condition, "action");
        assert_eq!(caveat.value, "create_post");
        assert_eq!(caveat.kind(), Condition::Action);

        let caveat = Caveat::amount(1010);
        assert_eq!(caveat.condition, "amount");
        assert_eq!(caveat.value, "1010");

        let caveat = Caveat::expires(1_704_067_200_000);
        assert_eq!(caveat.condition, "expires");
        assert_eq!(caveat.value, "1704067200000");
    }

    #[test]
    fn test_custom_caveat() {
        let caveat = Caveat::new("region", "mx");
        assert_eq!(caveat.kind(), Condition::Custom("region".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Caveat::action("create_post").to_string(), "action = create_post");
    }
}
