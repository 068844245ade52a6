//! Verified identity claims.
//!
//! An [`IdentityClaims`] value only exists after an ID token has passed
//! signature, audience, issuer, expiry and nonce verification. It is the
//! claim-set stored in the session under [`IDENTITY_KEY`](crate::IDENTITY_KEY).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims extracted from a verified OIDC ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// The subject claim (unique user identifier at the provider).
    pub subject: String,
    /// The issuer URL.
    pub issuer: String,
    /// Audiences the token was issued for.
    pub audience: Vec<String>,
    /// Email address, if the provider released one.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name (from `name` or `preferred_username`).
    #[serde(default)]
    pub name: Option<String>,
    /// When the ID token expires.
    pub expires_at: DateTime<Utc>,
    /// When the ID token was issued.
    pub issued_at: DateTime<Utc>,
}

impl IdentityClaims {
    /// Creates a claim-set with the required claims.
    #[must_use]
    pub fn new(
        subject: String,
        issuer: String,
        audience: Vec<String>,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject,
            issuer,
            audience,
            email: None,
            name: None,
            expires_at,
            issued_at,
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Returns the domain part of the email claim, if any.
    ///
    /// The domain is everything after the last `@`, trimmed. No case folding
    /// is applied here; see [`DomainPolicy`](crate::DomainPolicy).
    #[must_use]
    pub fn email_domain(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.rsplit_once('@'))
            .map(|(_, domain)| domain.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(email: Option<&str>) -> IdentityClaims {
        let now = Utc::now();
        IdentityClaims::new(
            "user-123".to_string(),
            "https://accounts.example.com".to_string(),
            vec!["client-id".to_string()],
            now + Duration::hours(1),
            now,
        )
        .with_email(email.map(str::to_string))
    }

    #[test]
    fn email_domain_splits_on_last_at() {
        assert_eq!(
            claims(Some("user@EXAMPLE.com")).email_domain(),
            Some("EXAMPLE.com")
        );
        assert_eq!(
            claims(Some("\"odd@local\"@example.org")).email_domain(),
            Some("example.org")
        );
    }

    #[test]
    fn email_domain_absent_without_email() {
        assert_eq!(claims(None).email_domain(), None);
        assert_eq!(claims(Some("not-an-address")).email_domain(), None);
    }

    #[test]
    fn claims_survive_json() {
        let original = claims(Some("user@example.com")).with_name(Some("User".to_string()));
        let json = serde_json::to_value(&original).expect("serialize");
        let parsed: IdentityClaims = serde_json::from_value(json).expect("deserialize");
        assert_eq!(original, parsed);
    }
}
