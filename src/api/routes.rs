//! API Routes
//!
//! Request Router: maps method and path onto the resource handlers. Routing
//! looks only at the request line, never at the body.

use std::any::Any;

use axum::{
    extract::State,
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::cors::CorsPolicy;
use super::middleware::{auth_middleware, logging_middleware};
use super::{auth, notifications, tips, transactions};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
}

// =========================================================================
// API Router
// =========================================================================

/// Build the full application: public and protected routes under `/api`,
/// fallbacks, and the middleware stack.
pub fn create_router(state: AppState, cors: CorsPolicy) -> Router {
    let public = Router::new()
        .route(
            "/auth/register",
            post(auth::register).fallback(method_not_allowed),
        )
        .route("/auth/login", post(auth::login).fallback(method_not_allowed))
        .route("/auth/logout", post(auth::logout).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed));

    let protected = Router::new()
        .route(
            "/transactions",
            get(transactions::list_transactions)
                .post(transactions::create_transaction)
                .fallback(method_not_allowed),
        )
        // Static segment wins over `:id`
        .route(
            "/transactions/stats",
            get(transactions::transaction_stats).fallback(method_not_allowed),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .patch(transactions::update_transaction)
                .delete(transactions::delete_transaction)
                .fallback(method_not_allowed),
        )
        .route(
            "/notifications/preferences",
            get(notifications::get_preferences)
                .post(notifications::save_preferences)
                .fallback(method_not_allowed),
        )
        .route(
            "/notifications/taxes",
            get(notifications::list_taxes)
                .post(notifications::save_tax)
                .fallback(method_not_allowed),
        )
        .route(
            "/notifications/taxes/:id",
            delete(notifications::delete_tax).fallback(method_not_allowed),
        )
        .route("/tips", post(tips::generate_tips).fallback(method_not_allowed))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", public.merge(protected))
        .fallback(route_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors.into_layer())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

// =========================================================================
// GET /api/health
// =========================================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339(),
        environment: state.environment,
    })
}

// =========================================================================
// Fallbacks
// =========================================================================

async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound {
        path: uri.path().to_string(),
    }
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
