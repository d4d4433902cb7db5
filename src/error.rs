use thiserror::Error;

/// Errors surfaced by the L402 layer and the caveat verifiers.
///
/// The signing primitives themselves ([`crate::create_macaroon`] and
/// [`crate::verify_macaroon`]) never fail; everything here belongs to the
/// code that decodes credentials and enforces caveats.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum L402Error {
    /// The macaroon's signature does not match its contents under the root key
    #[error("Invalid macaroon signature")]
    InvalidSignature,

    /// The `expires` caveat lies in the past
    #[error("Macaroon expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },

    /// The `action` caveat does not cover the requested operation
    #[error("Macaroon authorizes '{expected}', not '{actual}'")]
    ActionMismatch { expected: String, actual: String },

    /// Less was paid than the `amount` caveat demands
    #[error("Insufficient payment: {paid} sats paid, {required} required")]
    InsufficientAmount { required: u64, paid: u64 },

    /// A well-known caveat carries a value that cannot be interpreted
    #[error("Invalid caveat: {0}")]
    InvalidCaveat(String),

    /// A caveat was rejected by a custom verifier
    #[error("Caveat violation: {0}")]
    CaveatViolation(String),

    /// The `Authorization` header could not be decoded
    #[error("Malformed L402 credential: {0}")]
    MalformedCredential(String),

    /// The preimage does not hash to the invoice's payment hash
    #[error("Preimage does not match payment hash")]
    InvalidPreimage,

    /// Failed to decode a macaroon from one of its transport encodings
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Failed to encode a macaroon or a response body
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The issuer was configured with unusable settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl L402Error {
    /// HTTP status code the request handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            L402Error::MalformedCredential(_) | L402Error::DeserializationError(_) => 400,
            L402Error::InvalidSignature
            | L402Error::Expired { .. }
            | L402Error::InvalidPreimage => 401,
            L402Error::ActionMismatch { .. }
            | L402Error::InsufficientAmount { .. }
            | L402Error::InvalidCaveat(_)
            | L402Error::CaveatViolation(_) => 403,
            L402Error::Config(_) | L402Error::SerializationError(_) => 500,
        }
    }

    /// Whether the caller may answer with a fresh payment challenge.
    pub fn is_reissuable(&self) -> bool {
        matches!(self, L402Error::Expired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(L402Error::MalformedCredential("x".into()).status_code(), 400);
        assert_eq!(L402Error::InvalidSignature.status_code(), 401);
        assert_eq!(
            L402Error::Expired {
                expires_at: 1,
                now: 2
            }
            .status_code(),
            401
        );
        assert_eq!(L402Error::InvalidPreimage.status_code(), 401);
        assert_eq!(
            L402Error::InsufficientAmount {
                required: 10,
                paid: 5
            }
            .status_code(),
            403
        );
        assert_eq!(L402Error::Config("empty".into()).status_code(), 500);
        assert_eq!(L402Error::DeserializationError("x".into()).status_code(), 400);
        assert_eq!(L402Error::SerializationError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_only_expiry_is_reissuable() {
        assert!(
            L402Error::Expired {
                expires_at: 1,
                now: 2
            }
            .is_reissuable()
        );
        assert!(!L402Error::InvalidSignature.is_reissuable());
        assert!(
            !L402Error::ActionMismatch {
                expected: "create_post".into(),
                actual: "delete_post".into()
            }
            .is_reissuable()
        );
    }

    #[test]
    fn test_display() {
        let err = L402Error::InsufficientAmount {
            required: 1010,
            paid: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment: 1000 sats paid, 1010 required"
        );
    }
}
