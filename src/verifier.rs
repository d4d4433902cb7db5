use crate::caveat::Caveat;
use crate::condition::{Condition, parse_decimal};
use crate::{L402Error, Result};

/// A verifier decides whether a caveat is satisfied by the current request
///
/// Implement this trait to enforce application-specific conditions.
pub trait Verifier {
    /// Verifies a single caveat
    ///
    /// # Returns
    /// * `Ok(())` if the caveat is satisfied
    /// * `Err(L402Error)` describing why it is not
    fn verify_caveat(&self, caveat: &Caveat) -> Result<()>;
}

/// A verifier that accepts all caveats
///
/// Useful when only the signature matters
pub struct AcceptAllVerifier;

impl Verifier for AcceptAllVerifier {
    fn verify_caveat(&self, _caveat: &Caveat) -> Result<()> {
        Ok(())
    }
}

/// A verifier that rejects all caveats
pub struct RejectAllVerifier;

impl Verifier for RejectAllVerifier {
    fn verify_caveat(&self, caveat: &Caveat) -> Result<()> {
        Err(L402Error::CaveatViolation(caveat.to_string()))
    }
}

/// A function-based verifier for simple use cases
///
/// # Example
/// ```
/// use ganamos_l402::{Caveat, L402Error};
/// use ganamos_l402::verifier::{FnVerifier, Verifier};
///
/// let verifier = FnVerifier::new(|caveat: &Caveat| {
///     if caveat.condition != "region" || caveat.value == "mx" {
///         Ok(())
///     } else {
///         Err(L402Error::CaveatViolation(caveat.to_string()))
///     }
/// });
///
/// assert!(verifier.verify_caveat(&Caveat::new("region", "mx")).is_ok());
/// assert!(verifier.verify_caveat(&Caveat::new("region", "us")).is_err());
/// ```
pub struct FnVerifier<F>
where
    F: Fn(&Caveat) -> Result<()>,
{
    func: F,
}

impl<F> FnVerifier<F>
where
    F: Fn(&Caveat) -> Result<()>,
{
    /// Creates a new function-based verifier
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Verifier for FnVerifier<F>
where
    F: Fn(&Caveat) -> Result<()>,
{
    fn verify_caveat(&self, caveat: &Caveat) -> Result<()> {
        (self.func)(caveat)
    }
}

/// Runs several verifiers in sequence; every one of them must accept the caveat.
///
/// Use this to stack custom checks on top of [`RequestVerifier`].
pub struct CompositeVerifier {
    verifiers: Vec<Box<dyn Verifier>>,
}

impl CompositeVerifier {
    /// Creates a new composite verifier
    pub fn new() -> Self {
        Self {
            verifiers: Vec::new(),
        }
    }

    /// Adds a verifier to the composite
    pub fn add_verifier<V: Verifier + 'static>(mut self, verifier: V) -> Self {
        self.verifiers.push(Box::new(verifier));
        self
    }
}

impl Default for CompositeVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier for CompositeVerifier {
    fn verify_caveat(&self, caveat: &Caveat) -> Result<()> {
        for verifier in &self.verifiers {
            verifier.verify_caveat(caveat)?;
        }
        Ok(())
    }
}

/// Enforces the well-known L402 caveats against the request being served.
///
/// - `action` must equal the requested action, when one is set
/// - `amount` must not exceed the paid amount, when one is known
/// - `expires` must not be earlier than `now_ms`
///
/// Any other condition passes. Every caveat is checked, so a repeated
/// condition has to hold for each occurrence.
///
/// # Example
/// ```
/// use ganamos_l402::Caveat;
/// use ganamos_l402::verifier::{RequestVerifier, Verifier};
///
/// let verifier = RequestVerifier::new(1_000).with_action("create_post");
/// assert!(verifier.verify_caveat(&Caveat::action("create_post")).is_ok());
/// assert!(verifier.verify_caveat(&Caveat::expires(999)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestVerifier {
    action: Option<String>,
    amount_paid: Option<u64>,
    now_ms: u64,
}

impl RequestVerifier {
    /// Creates a verifier that only checks expiry against `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            action: None,
            amount_paid: None,
            now_ms,
        }
    }

    /// Requires `action` caveats to name this action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Requires `amount` caveats to be covered by this payment
    pub fn with_amount_paid(mut self, sats: u64) -> Self {
        self.amount_paid = Some(sats);
        self
    }

    fn check_action(&self, value: &str) -> Result<()> {
        match &self.action {
            Some(requested) if requested != value => Err(L402Error::ActionMismatch {
                expected: value.to_string(),
                actual: requested.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check_amount(&self, value: &str) -> Result<()> {
        let required = parse_decimal(Condition::AMOUNT, value)?;
        match self.amount_paid {
            Some(paid) if paid < required => Err(L402Error::InsufficientAmount { required, paid }),
            _ => Ok(()),
        }
    }

    fn check_expires(&self, value: &str) -> Result<()> {
        let expires_at = parse_decimal(Condition::EXPIRES, value)?;
        if self.now_ms > expires_at {
            return Err(L402Error::Expired {
                expires_at,
                now: self.now_ms,
            });
        }
        Ok(())
    }
}

impl Verifier for RequestVerifier {
    fn verify_caveat(&self, caveat: &Caveat) -> Result<()> {
        match caveat.kind() {
            Condition::Action => self.check_action(&caveat.value),
            Condition::Amount => self.check_amount(&caveat.value),
            Condition::Expires => self.check_expires(&caveat.value),
            Condition::Custom(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all_verifier() {
        let verifier = AcceptAllVerifier;
        assert!(verifier.verify_caveat(&Caveat::new("anything", "x")).is_ok());
        assert!(verifier.verify_caveat(&Caveat::new("", "")).is_ok());
    }

    #[test]
    fn test_reject_all_verifier() {
        let result = RejectAllVerifier.verify_caveat(&Caveat::action("create_post"));
        assert_eq!(
            result,
            Err(L402Error::CaveatViolation("action = create_post".to_string()))
        );
    }

    #[test]
    fn test_fn_verifier() {
        let verifier = FnVerifier::new(|caveat: &Caveat| {
            if caveat.value == "allowed" {
                Ok(())
            } else {
                Err(L402Error::CaveatViolation("Not allowed".to_string()))
            }
        });

        assert!(verifier.verify_caveat(&Caveat::new("k", "allowed")).is_ok());
        assert!(verifier.verify_caveat(&Caveat::new("k", "denied")).is_err());
    }

    #[test]
    fn test_composite_verifier_empty() {
        let verifier = CompositeVerifier::new();
        assert!(verifier.verify_caveat(&Caveat::new("anything", "x")).is_ok());
    }

    #[test]
    fn test_composite_verifier_requires_all() {
        let verifier = CompositeVerifier::new()
            .add_verifier(RequestVerifier::new(0).with_action("create_post"))
            .add_verifier(FnVerifier::new(|caveat: &Caveat| {
                if caveat.condition == "region" && caveat.value != "mx" {
                    Err(L402Error::CaveatViolation(caveat.to_string()))
                } else {
                    Ok(())
                }
            }));

        assert!(verifier.verify_caveat(&Caveat::action("create_post")).is_ok());
        assert!(verifier.verify_caveat(&Caveat::new("region", "mx")).is_ok());
        assert!(verifier.verify_caveat(&Caveat::new("region", "us")).is_err());
        assert!(verifier.verify_caveat(&Caveat::action("delete_post")).is_err());
    }

    #[test]
    fn test_request_verifier_action() {
        let verifier = RequestVerifier::new(0).with_action("create_post");
        assert!(verifier.verify_caveat(&Caveat::action("create_post")).is_ok());
        assert_eq!(
            verifier.verify_caveat(&Caveat::action("delete_post")),
            Err(L402Error::ActionMismatch {
                expected: "delete_post".to_string(),
                actual: "create_post".to_string(),
            })
        );

        // No requested action: the caveat is not constrained.
        let open = RequestVerifier::new(0);
        assert!(open.verify_caveat(&Caveat::action("anything")).is_ok());
    }

    #[test]
    fn test_request_verifier_amount() {
        let verifier = RequestVerifier::new(0).with_amount_paid(1010);
        assert!(verifier.verify_caveat(&Caveat::amount(1010)).is_ok());
        assert!(verifier.verify_caveat(&Caveat::amount(500)).is_ok());
        assert_eq!(
            verifier.verify_caveat(&Caveat::amount(2000)),
            Err(L402Error::InsufficientAmount {
                required: 2000,
                paid: 1010
            })
        );
        assert!(matches!(
            verifier.verify_caveat(&Caveat::new("amount", "lots")),
            Err(L402Error::InvalidCaveat(_))
        ));
    }

    #[test]
    fn test_request_verifier_expires() {
        let verifier = RequestVerifier::new(1_704_067_200_000);
        assert!(verifier.verify_caveat(&Caveat::expires(1_704_067_200_000)).is_ok());
        assert!(verifier.verify_caveat(&Caveat::expires(1_704_067_200_001)).is_ok());
        assert_eq!(
            verifier.verify_caveat(&Caveat::expires(1_704_067_199_999)),
            Err(L402Error::Expired {
                expires_at: 1_704_067_199_999,
                now: 1_704_067_200_000
            })
        );
        assert!(matches!(
            verifier.verify_caveat(&Caveat::new("expires", "2024-01-01")),
            Err(L402Error::InvalidCaveat(_))
        ));
    }

    #[test]
    fn test_request_verifier_ignores_custom_conditions() {
        let verifier = RequestVerifier::new(u64::MAX).with_action("create_post");
        assert!(verifier.verify_caveat(&Caveat::new("region", "mx")).is_ok());
        assert!(verifier.verify_caveat(&Caveat::new("Expires", "0")).is_ok());
    }
}
