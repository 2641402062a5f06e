//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` whose rejections leave the API in the uniform error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
