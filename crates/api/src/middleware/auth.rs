//! Authentication and currency extractors.
//!
//! `CurrentUser` requires a valid `Authorization: Bearer <token>` header
//! and loads the user; `DisplayCurrency` reads the optional `X-Currency`
//! header for catalog pricing.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use avoi_core::CurrencyCode;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Extractor that requires bearer-token authentication.
///
/// Rejects with 401 when the header is missing, malformed, expired, or
/// references an unknown or deactivated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("token is missing".to_owned()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .unwrap_or(header_value);

        let auth = AuthService::new(state.pool(), &state.config().jwt_secret);
        let user_id = auth.verify_token(token)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_owned()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Extractor for the display currency on catalog endpoints.
///
/// Reads the `X-Currency` header; missing or malformed values fall back
/// to the base currency rather than failing the request.
pub struct DisplayCurrency(pub CurrencyCode);

impl<S> FromRequestParts<S> for DisplayCurrency
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let currency = parts
            .headers
            .get("X-Currency")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| CurrencyCode::parse(s).ok())
            .unwrap_or_else(CurrencyCode::usd);

        Ok(Self(currency))
    }
}
