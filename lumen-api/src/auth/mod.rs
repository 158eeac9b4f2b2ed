//! Access Gate
//!
//! Resolves the caller's identity from a bearer token or session cookie
//! before any record operation runs.

pub mod identity;
pub mod middleware;

pub use identity::{AuthError, Credential, IdentityProvider, SqliteIdentityProvider};
pub use middleware::{auth_middleware, extract_credential, AuthUser};
