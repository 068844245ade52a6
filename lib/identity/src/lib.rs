//! Identity types for oauth-shield.
//!
//! This crate provides:
//! - Verified identity claims (`IdentityClaims`)
//! - The email-domain allow-list (`DomainPolicy`, `DomainRejected`)
//! - The client-held session map (`SessionData`)
//! - Provider configuration (`OidcConfig`)
//! - The callback failure taxonomy (`CallbackError`)
//!
//! Nothing here performs I/O; the server crate owns the network and cookies.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use oauth_shield_identity::{DomainPolicy, IdentityClaims, SessionData};
//!
//! let now = Utc::now();
//! let claims = IdentityClaims::new(
//!     "248289761001".to_string(),
//!     "https://accounts.example.com".to_string(),
//!     vec!["my-client".to_string()],
//!     now + Duration::hours(1),
//!     now,
//! )
//! .with_email(Some("alice@Example.com".to_string()));
//!
//! let policy = DomainPolicy::from_comma_separated("example.com");
//! assert!(policy.check(&claims).is_ok());
//!
//! let mut session = SessionData::new();
//! session.set_identity(&claims);
//! assert!(session.is_authenticated());
//! ```

pub mod claims;
pub mod error;
pub mod oidc;
pub mod policy;
pub mod session;

pub use claims::IdentityClaims;
pub use error::CallbackError;
pub use oidc::{OidcConfig, OidcConfigBuilder};
pub use policy::{DomainPolicy, DomainRejected};
pub use session::{IDENTITY_KEY, SessionData};
