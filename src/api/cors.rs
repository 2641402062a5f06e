//! CORS Gate
//!
//! One process-wide origin policy: a set of exact origins plus an optional
//! pattern for preview deployments. Requests without an `Origin` header are
//! never blocked, they just don't get an `Access-Control-Allow-Origin` back.
//! Preflight `OPTIONS` requests are answered by the layer itself with an empty
//! 200, whatever the path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, request::Parts, HeaderValue, Method};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{Config, ConfigError};

/// How long browsers may cache a preflight answer
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    exact: HashSet<String>,
    pattern: Option<Regex>,
}

impl CorsPolicy {
    /// An empty `pattern` disables pattern matching
    pub fn new<I, S>(origins: I, pattern: Option<&str>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = match pattern.map(str::trim) {
            Some(p) if !p.is_empty() => Some(Regex::new(p)?),
            _ => None,
        };

        Ok(Self {
            exact: origins.into_iter().map(Into::into).collect(),
            pattern,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.cors_allowed_origins.iter().cloned(),
            Some(config.cors_origin_pattern.as_str()),
        )
    }

    /// Whether `origin` may receive cross-origin response headers.
    /// An absent origin is never authorized.
    pub fn authorize_origin(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return false;
        };

        self.exact.contains(origin)
            || self
                .pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(origin))
    }

    /// Build the tower layer. Allowed origins are echoed back verbatim, never `*`,
    /// so credentials keep working.
    pub fn into_layer(self) -> CorsLayer {
        let policy = Arc::new(self);

        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    policy.authorize_origin(origin.to_str().ok())
                },
            ))
            .allow_credentials(true)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(PREFLIGHT_MAX_AGE)
    }
}
