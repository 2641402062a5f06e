//! Auth endpoints
//!
//! Thin pass-through to the identity provider. Nothing about users is stored
//! locally.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::ApiJson;
use super::MessageResponse;
use crate::domain::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::identity::{bearer_token, IdentityError};
use crate::state::AppState;

const MISSING_CREDENTIALS: &str = "Email y contraseña son requeridos";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub user_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: AuthenticatedUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

/// Both fields present and non-blank
fn credentials<'a>(
    email: &'a Option<String>,
    password: &'a Option<String>,
) -> AppResult<(&'a str, &'a str)> {
    let email = email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let password = password.as_deref().filter(|p| !p.is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::Validation(MISSING_CREDENTIALS.to_string())),
    }
}

/// Provider outages are ours to report; anything else is the caller's problem
fn upstream_error(e: IdentityError) -> AppError {
    match e {
        IdentityError::Unavailable(reason) => {
            AppError::Internal(format!("identity provider unavailable: {}", reason))
        }
        other => AppError::Upstream(other.to_string()),
    }
}

// =========================================================================
// POST /api/auth/register
// =========================================================================

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let (email, password) = credentials(&request.email, &request.password)?;
    if !email.contains('@') {
        return Err(AppError::Validation("Email inválido".to_string()));
    }

    let user = state
        .identity
        .sign_up(email, password, request.user_data)
        .await
        .map_err(upstream_error)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

// =========================================================================
// POST /api/auth/login
// =========================================================================

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (email, password) = credentials(&request.email, &request.password)?;

    let session = state
        .identity
        .sign_in(email, password)
        .await
        .map_err(|e| {
            if e.is_unavailable() {
                return upstream_error(e);
            }
            tracing::debug!(error = %e, "Sign-in rejected");
            AppError::InvalidCredentials
        })?;

    Ok(Json(LoginResponse {
        token: session.access_token,
        user: session.user,
    }))
}

// =========================================================================
// POST /api/auth/logout
// =========================================================================

/// Revokes the session when a bearer token is supplied. Without one, or with a
/// token the provider no longer knows, there is nothing to revoke and the call
/// still succeeds. Only a provider outage fails it.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<MessageResponse>> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    if let Some(token) = bearer_token(authorization) {
        match state.identity.sign_out(token).await {
            Ok(()) => {}
            Err(e) if e.is_unavailable() => return Err(upstream_error(e)),
            Err(e) => tracing::debug!(error = %e, "Sign-out rejected, session already gone"),
        }
    }

    Ok(Json(MessageResponse::new("Logout exitoso")))
}
