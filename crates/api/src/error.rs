//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors
//! to Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; bodies are JSON `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, OrderError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) => repository_status(err),
            Self::Auth(err) => auth_status(err),
            Self::Cart(err) => cart_status(err),
            Self::Order(err) => order_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message surfaced to the client. Server-class errors get a generic
    /// body; the detail stays in logs and Sentry.
    fn client_message(&self) -> String {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            return "Internal server error".to_owned();
        }

        match self {
            Self::Repository(err) => match err {
                RepositoryError::NotFound => "Not found".to_owned(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => err.to_string(),
            },
            Self::Auth(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_owned(),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        // Business-rule conflicts surface as plain bad requests
        RepositoryError::Conflict(_) => StatusCode::BAD_REQUEST,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials
        | AuthError::AccountDeactivated
        | AuthError::TokenExpired
        | AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
        AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::UserAlreadyExists
        | AuthError::WeakPassword(_)
        | AuthError::InvalidEmail(_)
        | AuthError::InvalidVerificationToken => StatusCode::BAD_REQUEST,
        AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::Repository(err) => repository_status(err),
    }
}

fn cart_status(err: &CartError) -> StatusCode {
    match err {
        CartError::InvalidQuantity | CartError::InsufficientInventory => StatusCode::BAD_REQUEST,
        CartError::VariantNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
        CartError::Repository(err) => repository_status(err),
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::EmptyCart
        | OrderError::InsufficientInventory { .. }
        | OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        OrderError::AddressNotFound | OrderError::OrderNotFound => StatusCode::NOT_FOUND,
        OrderError::CreationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        OrderError::Repository(err) => repository_status(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "error": self.client_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_errors_are_404() {
        assert_eq!(
            status_of(AppError::NotFound("product".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::AddressNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Cart(CartError::VariantNotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_business_rule_violations_are_400() {
        assert_eq!(
            status_of(AppError::Order(OrderError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::InsufficientInventory {
                product: "Serum".to_owned(),
                variant: "50ml".to_owned(),
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Cart(CartError::InvalidQuantity)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Repository(RepositoryError::Conflict(
                "duplicate".to_owned()
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_errors_map_to_401_and_403() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::TokenExpired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::EmailNotVerified)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal("secret database path".to_owned());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_transition_is_400_with_status_in_message() {
        let err = AppError::Order(OrderError::InvalidTransition {
            from: avoi_core::OrderStatus::Delivered,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.client_message().contains("delivered"));
    }
}
