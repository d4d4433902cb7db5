use crate::caveat::Caveat;
use crate::crypto::{SIGNATURE_HEX_LEN, constant_time_eq, hmac_sha256_hex};
use crate::verifier::Verifier;
use crate::{L402Error, Result};
use serde::{Deserialize, Serialize};

/// Domain tag prepended to every signing message
const SIGNING_TAG: &[u8] = b"l402-macaroon-v1";

/// A macaroon is a bearer token whose identifier, location and caveats are
/// sealed together by one HMAC-SHA256 signature.
///
/// Any change to any field, including the order of the caveats, invalidates
/// the signature. Caveats cannot be appended by a holder: only someone with
/// the root key can mint a macaroon with a different caveat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macaroon {
    /// Opaque identifier of the resource or operation
    pub identifier: String,

    /// Service location this token is scoped to (typically a URL)
    pub location: String,

    /// Lowercase hex HMAC-SHA256 (64 characters)
    pub signature: String,

    /// Restrictions, in signing order
    pub caveats: Vec<Caveat>,
}

/// Mints a macaroon.
///
/// Pure and total: the same inputs always give the same signature, and any
/// strings are accepted, including empty ones. Rejecting an empty root key is
/// left to the caller (see [`crate::l402::L402Config::validate`]).
///
/// # Example
/// ```
/// use ganamos_l402::{Caveat, create_macaroon, verify_macaroon};
///
/// let caveats = [Caveat::action("create_post"), Caveat::amount(1010)];
/// let location = "https://ganamos.earth/api/posts";
/// let m = create_macaroon("post-123", location, b"root-secret", &caveats);
/// assert!(verify_macaroon(&m, b"root-secret"));
/// assert!(!verify_macaroon(&m, b"wrong-secret"));
/// ```
pub fn create_macaroon(
    identifier: &str,
    location: &str,
    root_key: &[u8],
    caveats: &[Caveat],
) -> Macaroon {
    Macaroon {
        identifier: identifier.to_string(),
        location: location.to_string(),
        signature: compute_signature(root_key, identifier, location, caveats),
        caveats: caveats.to_vec(),
    }
}

/// Checks a macaroon's signature against `root_key`.
///
/// Returns `true` only if the recomputed signature equals the stored one
/// byte for byte. Caveats are not interpreted here.
pub fn verify_macaroon(macaroon: &Macaroon, root_key: &[u8]) -> bool {
    if macaroon.signature.len() != SIGNATURE_HEX_LEN {
        return false;
    }
    let expected = compute_signature(
        root_key,
        &macaroon.identifier,
        &macaroon.location,
        &macaroon.caveats,
    );
    constant_time_eq(expected.as_bytes(), macaroon.signature.as_bytes())
}

/// Builds the message that gets signed.
///
/// Every variable-length field is prefixed with its length as a big-endian
/// u64, and the caveat count precedes the caveats, so distinct
/// `(identifier, location, caveats)` triples never share a message.
pub fn signing_message(identifier: &str, location: &str, caveats: &[Caveat]) -> Vec<u8> {
    let payload: usize = caveats
        .iter()
        .map(|c| c.condition.len() + c.value.len() + 16)
        .sum();
    let mut message = Vec::with_capacity(
        SIGNING_TAG.len() + identifier.len() + location.len() + 24 + payload,
    );

    message.extend_from_slice(SIGNING_TAG);
    push_field(&mut message, identifier.as_bytes());
    push_field(&mut message, location.as_bytes());
    message.extend_from_slice(&(caveats.len() as u64).to_be_bytes());
    for caveat in caveats {
        push_field(&mut message, caveat.condition.as_bytes());
        push_field(&mut message, caveat.value.as_bytes());
    }

    message
}

fn push_field(message: &mut Vec<u8>, field: &[u8]) {
    message.extend_from_slice(&(field.len() as u64).to_be_bytes());
    message.extend_from_slice(field);
}

fn compute_signature(
    root_key: &[u8],
    identifier: &str,
    location: &str,
    caveats: &[Caveat],
) -> String {
    hmac_sha256_hex(root_key, &signing_message(identifier, location, caveats))
}

impl Macaroon {
    /// Mints a macaroon; same as [`create_macaroon`]
    pub fn new(
        identifier: impl Into<String>,
        location: impl Into<String>,
        root_key: &[u8],
        caveats: Vec<Caveat>,
    ) -> Self {
        let identifier = identifier.into();
        let location = location.into();
        let signature = compute_signature(root_key, &identifier, &location, &caveats);

        Self {
            identifier,
            location,
            signature,
            caveats,
        }
    }

    /// Signature-only check; same as [`verify_macaroon`]
    pub fn verify_signature(&self, root_key: &[u8]) -> bool {
        verify_macaroon(self, root_key)
    }

    /// Verifies the signature, then asks `verifier` to accept every caveat in order
    ///
    /// # Returns
    /// * `Ok(())` if the signature is valid and all caveats are satisfied
    /// * `Err(L402Error::InvalidSignature)` on any tampering or a wrong key
    /// * the verifier's error for the first caveat it rejects
    ///
    /// # Example
    /// ```
    /// use ganamos_l402::{Caveat, Macaroon, verifier::AcceptAllVerifier};
    ///
    /// let caveats = vec![Caveat::action("create_post")];
    /// let m = Macaroon::new("post-123", "https://ganamos.earth", b"secret", caveats);
    /// assert!(m.verify(b"secret", &AcceptAllVerifier).is_ok());
    /// ```
    pub fn verify(&self, root_key: &[u8], verifier: &impl Verifier) -> Result<()> {
        if !self.verify_signature(root_key) {
            return Err(L402Error::InvalidSignature);
        }

        for caveat in &self.caveats {
            verifier.verify_caveat(caveat)?;
        }

        Ok(())
    }

    /// Returns the number of caveats in this macaroon
    pub fn caveat_count(&self) -> usize {
        self.caveats.len()
    }

    /// Returns true if this macaroon has no caveats
    pub fn is_unrestricted(&self) -> bool {
        self.caveats.is_empty()
    }

    /// Value of the first caveat with the given condition
    pub fn caveat_value(&self, condition: &str) -> Option<&str> {
        self.caveats
            .iter()
            .find(|c| c.condition == condition)
            .map(|c| c.value.as_str())
    }

    /// Values of all caveats with the given condition, in order
    pub fn caveats_for<'a, 'c>(
        &'a self,
        condition: &'c str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'c> {
        self.caveats
            .iter()
            .filter(move |c| c.condition == condition)
            .map(|c| c.value.as_str())
    }
}
