//! L402 macaroons for Ganamos' paid API.
//!
//! [`create_macaroon`] and [`verify_macaroon`] are the signing engine: pure,
//! total functions over an identifier, a location and an ordered list of
//! caveats. The [`l402`] module layers the HTTP 402 flow on top.

pub mod caveat;
pub mod condition;
pub mod crypto;
pub mod error;
pub mod l402;
pub mod macaroon;
pub mod serialization;
pub mod verifier;

pub use caveat::Caveat;
pub use error::L402Error;
pub use macaroon::{Macaroon, create_macaroon, verify_macaroon};

/// Result type for L402 operations
pub type Result<T> = std::result::Result<T, L402Error>;
