//! API module
//!
//! HTTP surface: CORS gate, authentication, routing and resource handlers.

pub mod auth;
pub mod cors;
pub mod extract;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod tips;
pub mod transactions;

pub use cors::CorsPolicy;
pub use routes::create_router;

use serde::Serialize;

/// `{ "message": "..." }` acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
