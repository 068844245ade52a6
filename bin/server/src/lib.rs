//! oauth-shield authentication gateway.
//!
//! Puts an OpenID Connect login in front of a directory of static files.
//! Requests without a verified identity in their session cookie are sent to
//! a login page; everyone else gets the files.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod templates;

#[cfg(test)]
mod testing;
