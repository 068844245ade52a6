//! Email-domain allow-list.
//!
//! Entries are compared case-insensitively against the domain of the
//! verified email claim. An entry that starts with `.` also admits any
//! subdomain of the rest of the entry (`.example.com` admits
//! `eng.example.com` and `example.com`). An empty policy admits everyone.

use std::fmt;

use crate::claims::IdentityClaims;

/// Allow-list of email domains permitted to establish a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPolicy {
    domains: Vec<String>,
}

/// A login refused because its email domain is not on the allow-list.
///
/// This is an expected policy outcome rather than a failure: the user is
/// shown the domain and may retry with a different account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRejected {
    /// The rejected domain, as it appeared in the email claim.
    pub domain: String,
}

impl fmt::Display for DomainRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "email domain '{}' is not authorized", self.domain)
    }
}

impl DomainPolicy {
    /// Creates a policy from individual entries. Blank entries are ignored.
    #[must_use]
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty() && d != ".")
            .collect();
        Self { domains }
    }

    /// Parses a comma-separated list such as `example.com, .corp.example`.
    #[must_use]
    pub fn from_comma_separated(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Returns true when every domain is admitted.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns the normalized entries.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Returns true if `domain` is admitted by this policy.
    #[must_use]
    pub fn admits(&self, domain: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }

        self.domains.iter().any(|entry| match entry.strip_prefix('.') {
            Some(parent) => domain == parent || domain.ends_with(entry.as_str()),
            None => domain == *entry,
        })
    }

    /// Checks the email domain of verified claims against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`DomainRejected`] carrying the offending domain (empty when
    /// the claims carry no usable email) if the policy is restricted and the
    /// domain is not admitted.
    pub fn check(&self, claims: &IdentityClaims) -> Result<(), DomainRejected> {
        if self.is_unrestricted() {
            return Ok(());
        }

        let domain = claims.email_domain().unwrap_or_default();
        if self.admits(domain) {
            Ok(())
        } else {
            Err(DomainRejected {
                domain: domain.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn claims_with_email(email: Option<&str>) -> IdentityClaims {
        let now = Utc::now();
        IdentityClaims::new(
            "sub".to_string(),
            "https://issuer.example".to_string(),
            vec!["client".to_string()],
            now + Duration::minutes(5),
            now,
        )
        .with_email(email.map(str::to_string))
    }

    #[test]
    fn empty_policy_admits_everyone() {
        let policy = DomainPolicy::from_comma_separated("");
        assert!(policy.is_unrestricted());
        assert!(policy.check(&claims_with_email(Some("anyone@anywhere.org"))).is_ok());
        assert!(policy.check(&claims_with_email(None)).is_ok());
    }

    #[test]
    fn match_is_case_insensitive() {
        let policy = DomainPolicy::new(["example.com"]);
        assert!(policy.check(&claims_with_email(Some("user@EXAMPLE.com"))).is_ok());

        let policy = DomainPolicy::new(["Example.COM"]);
        assert!(policy.check(&claims_with_email(Some("user@example.com"))).is_ok());
    }

    #[test]
    fn unlisted_domain_is_rejected_with_original_text() {
        let policy = DomainPolicy::new(["example.com"]);
        let rejected = policy
            .check(&claims_with_email(Some("mallory@Evil.org")))
            .expect_err("should reject");
        assert_eq!(rejected.domain, "Evil.org");
        assert!(rejected.to_string().contains("Evil.org"));
    }

    #[test]
    fn exact_entries_do_not_match_subdomains() {
        let policy = DomainPolicy::new(["example.com"]);
        assert!(!policy.admits("eng.example.com"));
        assert!(!policy.admits("badexample.com"));
    }

    #[test]
    fn dotted_entries_match_subdomains() {
        let policy = DomainPolicy::new([".example.com"]);
        assert!(policy.admits("example.com"));
        assert!(policy.admits("eng.EXAMPLE.com"));
        assert!(!policy.admits("badexample.com"));
    }

    #[test]
    fn missing_email_is_rejected_when_restricted() {
        let policy = DomainPolicy::new(["example.com"]);
        let rejected = policy
            .check(&claims_with_email(None))
            .expect_err("should reject");
        assert_eq!(rejected.domain, "");
    }

    #[test]
    fn comma_separated_list_is_trimmed() {
        let policy = DomainPolicy::from_comma_separated(" example.com , ,Corp.Example ");
        assert_eq!(policy.domains(), &["example.com", "corp.example"]);
    }
}
