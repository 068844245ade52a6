//! Client-held session contents.
//!
//! The session is a small key-value map that lives in an encrypted,
//! authenticated cookie. This crate only cares about one field,
//! [`IDENTITY_KEY`], which holds the verified [`IdentityClaims`]. A request
//! is authenticated if and only if that field decodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claims::IdentityClaims;

/// Session field holding the verified identity claim-set.
pub const IDENTITY_KEY: &str = "identity";

/// Decoded session map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData(BTreeMap<String, Value>);

impl SessionData {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a session from its serialized form.
    ///
    /// Anything that is not a JSON object decodes as an empty session.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Serializes the session for storage.
    #[must_use]
    pub fn encode(&self) -> String {
        // A map of JSON values always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Returns true if the session holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the verified identity, if present and well-formed.
    #[must_use]
    pub fn identity(&self) -> Option<IdentityClaims> {
        self.0
            .get(IDENTITY_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns true if the session carries a well-formed identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    /// Stores the verified identity, replacing any previous one.
    pub fn set_identity(&mut self, claims: &IdentityClaims) {
        if let Ok(value) = serde_json::to_value(claims) {
            self.0.insert(IDENTITY_KEY.to_string(), value);
        }
    }

    /// Removes the identity. Returns whether one was present.
    pub fn clear_identity(&mut self) -> bool {
        self.0.remove(IDENTITY_KEY).is_some()
    }
}
