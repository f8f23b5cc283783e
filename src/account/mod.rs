//! Core account subsystem: credential resolution, registration, contact
//! records, and the state-bound verification/reset token engine. Everything
//! here is framework-independent; the HTTP layer in [`crate::api`] is a thin
//! shell over these operations.

pub mod error;
pub mod models;
pub mod password;
pub mod reference;
pub mod repo;
pub mod resolver;
pub mod service;
pub mod settings;
pub mod tokens;
pub mod validators;

pub use models::{ContactKind, ContactRecord, User};
pub use resolver::{resolve_login_method, LoginMethod};
pub use settings::AuthSettings;
