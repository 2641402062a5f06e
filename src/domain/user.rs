//! Authenticated user
//!
//! Minimal projection of the identity provider's user record. Never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller of a protected request, as resolved from its bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}
