//! HTTP 402 flow built on top of the macaroon engine.
//!
//! An unpaid request gets an [`L402Challenge`]: a macaroon plus a Lightning
//! invoice, sent as a `WWW-Authenticate` header and a JSON body. After paying,
//! the client retries with `Authorization: L402 <macaroon>:<preimage>`, which
//! [`L402Issuer::authorize`] checks against the request.

use crate::caveat::Caveat;
use crate::condition::Condition;
use crate::crypto::{SIGNATURE_SIZE, constant_time_eq, sha256};
use crate::verifier::RequestVerifier;
use crate::{L402Error, Macaroon, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// One hour, the conventional lifetime of an issued macaroon
pub const DEFAULT_TTL_MS: u64 = 60 * 60 * 1000;

/// Authorization schemes accepted on the way in. `LSAT` is the protocol's former name.
const SCHEMES: [&str; 2] = ["L402", "LSAT"];

/// Environment variable holding the root key
pub const ROOT_KEY_ENV: &str = "L402_ROOT_KEY";
/// Environment variable overriding [`DEFAULT_TTL_MS`]
pub const TTL_ENV: &str = "L402_TTL_MS";

/// Caveats every credential must carry before it is accepted
const REQUIRED_CONDITIONS: [&str; 3] = [Condition::ACTION, Condition::AMOUNT, Condition::EXPIRES];

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

/// Milliseconds since the Unix epoch
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Issuer settings
#[derive(Clone, Deserialize)]
pub struct L402Config {
    /// Server-held HMAC key; never sent to clients
    pub root_key: String,

    /// Lifetime written into the `expires` caveat
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl L402Config {
    /// Config with the default one-hour lifetime
    pub fn new(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    /// Overrides the lifetime of issued macaroons
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Reads `L402_ROOT_KEY` and, optionally, `L402_TTL_MS`
    pub fn from_env() -> Result<Self> {
        let root_key = std::env::var(ROOT_KEY_ENV)
            .map_err(|_| L402Error::Config(format!("{ROOT_KEY_ENV} is not set")))?;
        let ttl_ms = match std::env::var(TTL_ENV) {
            Ok(raw) => raw
                .parse()
                .map_err(|e| L402Error::Config(format!("{TTL_ENV}='{raw}': {e}")))?,
            Err(_) => DEFAULT_TTL_MS,
        };

        let config = Self { root_key, ttl_ms };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make issued tokens worthless
    pub fn validate(&self) -> Result<()> {
        if self.root_key.is_empty() {
            return Err(L402Error::Config("root key must not be empty".to_string()));
        }
        if self.ttl_ms == 0 {
            return Err(L402Error::Config("ttl_ms must be positive".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for L402Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("L402Config")
            .field("root_key", &"<redacted>")
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

/// JSON body of a 402 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequiredBody {
    /// Human-readable reason
    pub error: String,
    /// Invoiced amount in sats
    pub amount: u64,
    /// BOLT11 payment request
    pub invoice: String,
    /// Base64 transport form of the macaroon
    pub macaroon: String,
}

/// A macaroon paired with the invoice that unlocks it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L402Challenge {
    pub macaroon: Macaroon,
    /// BOLT11 payment request
    pub invoice: String,
    pub amount_sats: u64,
}

impl L402Challenge {
    /// Pairs `macaroon` with the invoice the client has to pay
    pub fn new(macaroon: Macaroon, invoice: impl Into<String>, amount_sats: u64) -> Self {
        Self {
            macaroon,
            invoice: invoice.into(),
            amount_sats,
        }
    }

    /// `WWW-Authenticate` header value: `L402 macaroon="<base64>", invoice="<bolt11>"`
    pub fn www_authenticate(&self) -> Result<String> {
        Ok(format!(
            "L402 macaroon=\"{}\", invoice=\"{}\"",
            self.macaroon.to_base64()?,
            self.invoice
        ))
    }

    /// JSON body sent with the 402 response
    pub fn body(&self) -> Result<PaymentRequiredBody> {
        Ok(PaymentRequiredBody {
            error: "Payment required".to_string(),
            amount: self.amount_sats,
            invoice: self.invoice.clone(),
            macaroon: self.macaroon.to_base64()?,
        })
    }

    /// [`L402Challenge::body`], serialized
    pub fn body_json(&self) -> Result<String> {
        serde_json::to_string(&self.body()?)
            .map_err(|e| L402Error::SerializationError(e.to_string()))
    }
}

/// Client side: pulls the macaroon and invoice out of a `WWW-Authenticate` value
pub fn parse_www_authenticate(header: &str) -> Result<(Macaroon, String)> {
    let params = split_scheme(header)?;

    let mut macaroon = None;
    let mut invoice = None;
    for param in params.split(',') {
        let Some((key, value)) = param.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "macaroon" => macaroon = Some(value),
            "invoice" => invoice = Some(value.to_string()),
            _ => {}
        }
    }

    let macaroon = macaroon
        .ok_or_else(|| L402Error::MalformedCredential("missing macaroon parameter".to_string()))?;
    let invoice = invoice
        .ok_or_else(|| L402Error::MalformedCredential("missing invoice parameter".to_string()))?;
    let macaroon = Macaroon::from_base64(macaroon)
        .map_err(|e| L402Error::MalformedCredential(e.to_string()))?;

    Ok((macaroon, invoice))
}

/// Returns what follows an accepted scheme name
fn split_scheme(header: &str) -> Result<&str> {
    let header = header.trim();
    let (scheme, rest) = header
        .split_once(char::is_whitespace)
        .ok_or_else(|| L402Error::MalformedCredential("missing scheme".to_string()))?;

    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err(L402Error::MalformedCredential(format!(
            "unsupported scheme '{scheme}'"
        )));
    }
    Ok(rest.trim())
}

/// Decodes a hex payment hash as stored alongside an invoice
pub fn parse_payment_hash(hex_str: &str) -> Result<[u8; SIGNATURE_SIZE]> {
    let bytes =
        hex::decode(hex_str).map_err(|e| L402Error::DeserializationError(e.to_string()))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        L402Error::DeserializationError(format!("payment hash is {} bytes, expected 32", b.len()))
    })
}

/// Fails unless the macaroon carries `action`, `amount` and `expires` caveats
fn require_l402_caveats(macaroon: &Macaroon) -> Result<()> {
    for condition in REQUIRED_CONDITIONS {
        if macaroon.caveat_value(condition).is_none() {
            return Err(L402Error::InvalidCaveat(format!(
                "missing '{condition}' caveat"
            )));
        }
    }
    Ok(())
}

/// Proof of payment: SHA-256 of the preimage must equal the payment hash
pub fn verify_preimage(preimage: &[u8], payment_hash: &[u8; SIGNATURE_SIZE]) -> Result<()> {
    if constant_time_eq(&sha256(preimage), payment_hash) {
        Ok(())
    } else {
        Err(L402Error::InvalidPreimage)
    }
}

/// The bearer credential a client presents after paying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L402Credential {
    pub macaroon: Macaroon,
    pub preimage: [u8; SIGNATURE_SIZE],
}

impl L402Credential {
    pub fn new(macaroon: Macaroon, preimage: [u8; SIGNATURE_SIZE]) -> Self {
        Self { macaroon, preimage }
    }

    /// Parses an `Authorization` header value of the form `L402 <base64 macaroon>:<hex preimage>`
    ///
    /// The token is split at its last `:`; base64 never contains one.
    pub fn parse(header: &str) -> Result<Self> {
        let token = split_scheme(header)?;
        let (macaroon, preimage) = token.rsplit_once(':').ok_or_else(|| {
            L402Error::MalformedCredential("expected <macaroon>:<preimage>".to_string())
        })?;

        let macaroon = Macaroon::from_base64(macaroon)
            .map_err(|e| L402Error::MalformedCredential(format!("macaroon: {e}")))?;
        let preimage = hex::decode(preimage.trim())
            .map_err(|e| L402Error::MalformedCredential(format!("preimage: {e}")))?;
        let preimage: [u8; SIGNATURE_SIZE] = preimage.try_into().map_err(|b: Vec<u8>| {
            L402Error::MalformedCredential(format!("preimage is {} bytes, expected 32", b.len()))
        })?;

        Ok(Self { macaroon, preimage })
    }

    /// Client side: the `Authorization` header value for this credential
    pub fn authorization_header(&self) -> Result<String> {
        Ok(format!(
            "L402 {}:{}",
            self.macaroon.to_base64()?,
            hex::encode(self.preimage)
        ))
    }
}

/// What the current request needs from a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub action: String,
    /// Sats actually paid; `None` skips the `amount` check
    pub amount_paid: Option<u64>,
    pub payment_hash: [u8; SIGNATURE_SIZE],
    pub now_ms: u64,
}

/// A credential that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedRequest {
    pub identifier: String,
    pub macaroon: Macaroon,
    pub preimage: [u8; SIGNATURE_SIZE],
}

/// Mints challenges and authorizes paid requests with one root key
#[derive(Debug, Clone)]
pub struct L402Issuer {
    config: L402Config,
}

impl L402Issuer {
    /// Fails with [`L402Error::Config`] if the configuration does not validate
    pub fn new(config: L402Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated settings this issuer runs with
    pub fn config(&self) -> &L402Config {
        &self.config
    }

    fn root_key(&self) -> &[u8] {
        self.config.root_key.as_bytes()
    }

    /// Mints a macaroon carrying `action`, `amount` and `expires` caveats, in that order
    pub fn issue(
        &self,
        identifier: &str,
        location: &str,
        action: &str,
        amount_sats: u64,
        now_ms: u64,
    ) -> Macaroon {
        let expires_at = now_ms.saturating_add(self.config.ttl_ms);
        let caveats = vec![
            Caveat::action(action),
            Caveat::amount(amount_sats),
            Caveat::expires(expires_at),
        ];

        tracing::debug!(identifier, action, amount_sats, expires_at, "issued macaroon");
        Macaroon::new(identifier, location, self.root_key(), caveats)
    }

    /// Issues a macaroon and pairs it with `invoice`
    pub fn challenge(
        &self,
        identifier: &str,
        location: &str,
        action: &str,
        amount_sats: u64,
        invoice: &str,
    ) -> L402Challenge {
        let macaroon = self.issue(identifier, location, action, amount_sats, current_time_ms());
        L402Challenge::new(macaroon, invoice, amount_sats)
    }

    /// Checks an already-parsed credential: signature, caveats, then proof of payment
    pub fn authorize_credential(
        &self,
        credential: &L402Credential,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizedRequest> {
        let mut verifier = RequestVerifier::new(request.now_ms).with_action(&request.action);
        if let Some(paid) = request.amount_paid {
            verifier = verifier.with_amount_paid(paid);
        }

        let checked = credential
            .macaroon
            .verify(self.root_key(), &verifier)
            .and_then(|()| require_l402_caveats(&credential.macaroon))
            .and_then(|()| verify_preimage(&credential.preimage, &request.payment_hash));

        if let Err(e) = checked {
            tracing::warn!(
                identifier = %credential.macaroon.identifier,
                action = %request.action,
                error = %e,
                "rejected L402 credential"
            );
            return Err(e);
        }

        tracing::debug!(identifier = %credential.macaroon.identifier, "accepted L402 credential");
        Ok(AuthorizedRequest {
            identifier: credential.macaroon.identifier.clone(),
            macaroon: credential.macaroon.clone(),
            preimage: credential.preimage,
        })
    }

    /// Parses an `Authorization` header and authorizes it
    pub fn authorize(
        &self,
        header: &str,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizedRequest> {
        let credential = L402Credential::parse(header).inspect_err(|e| {
            tracing::warn!(error = %e, "malformed L402 credential");
        })?;
        self.authorize_credential(&credential, request)
    }
}
