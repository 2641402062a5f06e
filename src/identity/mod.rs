//! Identity module
//!
//! The external identity provider issues, validates and revokes the bearer
//! tokens that protect the API. Users are never stored locally.

mod supabase;
mod verifier;

pub use supabase::SupabaseAuthClient;
pub use verifier::{bearer_token, TokenVerifier};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::AuthenticatedUser;

/// Token and user returned by a successful password sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthenticatedUser,
}

/// Operations the API needs from the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user that owns `token`
    async fn get_user(&self, token: &str) -> Result<AuthenticatedUser, IdentityError>;

    /// Register a new user. `user_data` is stored as provider-side metadata.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<AuthenticatedUser, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Revoke the session behind `token`
    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;
}

/// Identity provider failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered and refused the operation
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider returned no user")]
    NoUser,

    /// The provider could not be reached or failed internally
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

impl IdentityError {
    /// True when the failure says nothing about the credentials themselves
    pub fn is_unavailable(&self) -> bool {
        matches!(self, IdentityError::Unavailable(_))
    }
}
