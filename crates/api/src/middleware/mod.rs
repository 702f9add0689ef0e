//! Authentication extractors.
//!
//! - [`auth::MaybeUser`] -- Optional identity (anonymous allowed).
//! - [`auth::AuthUser`] -- Requires a user on the JSON API (401 otherwise).
//! - [`auth::WebUser`] -- Requires a user on the web interface (redirect otherwise).

pub mod auth;
