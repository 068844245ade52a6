//! Error types for the identity crate.
//!
//! [`CallbackError`] is the failure taxonomy of the OIDC callback. Every
//! variant is terminal for the request and none of them touch the session.
//! A refused email domain is not an error; see
//! [`DomainRejected`](crate::DomainRejected).

use std::fmt;

/// Failures while turning an authorization code into a verified identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The provider redirected back without an authorization code.
    MissingCode,
    /// The returned `state` is absent or does not match the one issued at login.
    CsrfMismatch,
    /// The token endpoint could not be reached or rejected the exchange.
    TokenExchange { details: String },
    /// The token response carried no ID token.
    MissingIdToken,
    /// No key in the provider's key set matches the ID token's key id.
    UnknownSigningKey { key_id: Option<String> },
    /// The ID token failed signature, audience, issuer, expiry or nonce checks.
    TokenVerification { reason: String },
}

impl CallbackError {
    /// Returns a stable, machine-friendly name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::CsrfMismatch => "csrf_mismatch",
            Self::TokenExchange { .. } => "token_exchange",
            Self::MissingIdToken => "missing_id_token",
            Self::UnknownSigningKey { .. } => "unknown_signing_key",
            Self::TokenVerification { .. } => "token_verification",
        }
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCode => write!(f, "authorization code missing from callback"),
            Self::CsrfMismatch => write!(f, "state parameter does not match the login request"),
            Self::TokenExchange { details } => {
                write!(f, "token exchange failed: {details}")
            }
            Self::MissingIdToken => write!(f, "token response has no id_token"),
            Self::UnknownSigningKey { key_id: Some(kid) } => {
                write!(f, "no signing key found for key id '{kid}'")
            }
            Self::UnknownSigningKey { key_id: None } => {
                write!(f, "no signing key found: token has no key id")
            }
            Self::TokenVerification { reason } => {
                write!(f, "ID token verification failed: {reason}")
            }
        }
    }
}

impl std::error::Error for CallbackError {}
