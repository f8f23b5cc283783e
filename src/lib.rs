//! # Ensaluti (multi-method authentication service)
//!
//! `ensaluti` lets an account sign in with a phone number, an email address,
//! or a username against a single password, and manages the verification
//! lifecycle of the contact records behind those identifiers.
//!
//! ## Credential Resolution
//!
//! A login string is ambiguous; the resolver walks the configured
//! authentication methods **in priority order** and stops at the first
//! namespace whose syntax validator accepts the string. Later namespaces are
//! never consulted, even when the chosen one holds no matching account. An
//! empty method list is a startup error, not a per-request condition.
//!
//! ## State-Bound Verification Tokens
//!
//! Verification and password-reset links carry tokens derived from the
//! *current* state of the thing they verify (contact value + verified flag,
//! or password hash + active flag) via a keyed hash. Nothing is stored:
//! validation re-derives the hash inside a bounded time window, so the
//! mutation a successful validation performs is exactly what invalidates the
//! token — they are single-use by construction.
//!
//! ## Anti-Enumeration
//!
//! Authentication failures all answer "Invalid Credentials"; verification
//! and reset failures all answer "Verification failed"/"link invalid";
//! send-link endpoints report success for unknown identifiers. Distinct
//! causes are never distinguishable from outside.

pub mod account;
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
