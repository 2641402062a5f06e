//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::identity::{IdentityProvider, TokenVerifier};
use crate::repository::{NotificationRepository, TransactionRepository};
use crate::tips::TipsService;

/// Shared application state. Built once at startup, never mutated.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: TokenVerifier,
    pub transactions: Arc<dyn TransactionRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub tips: TipsService,
    pub environment: String,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        transactions: Arc<dyn TransactionRepository>,
        notifications: Arc<dyn NotificationRepository>,
        tips: TipsService,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            verifier: TokenVerifier::new(identity.clone()),
            identity,
            transactions,
            notifications,
            tips,
            environment: environment.into(),
        }
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for TipsService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tips.clone()
    }
}
