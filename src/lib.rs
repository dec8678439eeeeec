//! # Specimen (Sample records API)
//!
//! `specimen` is a small HTTP service exposing CRUD endpoints over a single
//! soft-deletable `samples` resource, fronted by session-based authentication
//! (password and one-time-code flows) delegated to an external identity
//! provider.
//!
//! ## Soft Deletes
//!
//! Rows are never removed physically. Deleting a sample sets `deleted_at`;
//! every other read or write composes a `deleted_at IS NULL` predicate so
//! logically removed rows are indistinguishable from rows that never existed.
//! Conditional writes (update, delete) carry the liveness check and the
//! mutation in a single SQL statement, so of two conflicting concurrent
//! requests exactly one commits and the other observes zero affected rows.
//!
//! ## Sessions
//!
//! Every request passes through a session resolver that asks the identity
//! provider to turn the ambient request credentials (cookie or bearer token)
//! into a `(user, session)` pair. The resulting context is request-scoped and
//! never cached. Sign-in flows invoke the provider in response-capturing mode
//! and copy its session-issuing `Set-Cookie` header onto the outward redirect.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
