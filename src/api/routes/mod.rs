//! API Routes
//!
//! Route handlers organized by functionality.

pub mod activity;
pub mod health;
pub mod stats;

use axum::http::Uri;

use crate::api::error::ApiError;

/// Fallback for paths no route matches
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
