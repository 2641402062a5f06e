//! Token Verifier
//!
//! Single entry point for turning an `Authorization` header into an
//! [`AuthenticatedUser`]. Every protected route goes through it before any
//! resource is touched.

use std::sync::Arc;

use super::{IdentityError, IdentityProvider};
use crate::domain::AuthenticatedUser;
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validates bearer tokens against the identity provider.
/// One provider call per invocation, no caching and no retry.
#[derive(Clone)]
pub struct TokenVerifier {
    provider: Arc<dyn IdentityProvider>,
}

impl TokenVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn verify(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, AppError> {
        let token = bearer_token(authorization).ok_or(AppError::MissingToken)?;

        match self.provider.get_user(token).await {
            Ok(user) => Ok(user),
            Err(IdentityError::Unavailable(reason)) => {
                tracing::error!(reason = %reason, "Identity provider unavailable during token check");
                Err(AppError::AuthUnavailable)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected by identity provider");
                Err(AppError::InvalidToken)
            }
        }
    }
}
