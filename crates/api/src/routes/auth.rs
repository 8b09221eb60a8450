//! Authentication and profile routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::db::users::ProfileUpdate;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::Registration;
use crate::services::{AuthService, EmailService};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub nationality: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: bearer token plus the profile.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
///
/// Creates an unverified account and emails a verification link in the
/// background; registration success never depends on email delivery.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);

    let (user, verification_token) = auth
        .register(Registration {
            email: &request.email,
            password: &request.password,
            first_name: &request.first_name,
            last_name: &request.last_name,
            phone_number: request.phone_number.as_deref(),
            nationality: &request.nationality,
        })
        .await?;

    send_verification_in_background(
        state.email().clone(),
        user.clone(),
        verification_token,
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful! Please check your email to verify your account.",
            "user_id": user.id,
        })),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);
    let (user, token) = auth.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_owned(),
        token,
        user,
    }))
}

/// Email-verification request body.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub token: String,
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);
    let (user, already_verified) = auth.verify_email(&request.email, &request.token).await?;

    if already_verified {
        return Ok(Json(json!({ "message": "Email already verified" })));
    }

    // Welcome email is best-effort.
    let email = state.email().clone();
    tokio::spawn(async move {
        if let Err(err) = email.send_welcome(&user.email, &user.first_name).await {
            tracing::warn!(error = %err, "failed to send welcome email");
        }
    });

    Ok(Json(json!({
        "message": "Email verified successfully! You can now log in.",
        "verified": true,
    })))
}

/// Resend-verification request body.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);

    match auth.resend_verification(&request.email).await? {
        None => Ok(Json(json!({ "message": "Email already verified" }))),
        Some((user, token)) => {
            send_verification_in_background(state.email().clone(), user, token);
            Ok(Json(json!({ "message": "Verification email sent" })))
        }
    }
}

/// GET /api/auth/profile
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// Profile update request body; absent fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub nationality: Option<String>,
}

/// PUT /api/auth/profile
///
/// A nationality change re-derives the preferred currency.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);

    let updated = auth
        .update_profile(
            user.id,
            ProfileUpdate {
                first_name: request.first_name.as_deref(),
                last_name: request.last_name.as_deref(),
                phone_number: request.phone_number.as_deref(),
                nationality: request.nationality.as_deref(),
                preferred_currency: None,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": updated,
    })))
}

/// Change-password request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);
    auth.change_password(&user, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt_secret);
    let token = auth.issue_token(user.id)?;

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "token": token,
    })))
}

/// Dispatch the verification email without blocking the response.
fn send_verification_in_background(email: EmailService, user: User, token: String) {
    tokio::spawn(async move {
        if let Err(err) = email
            .send_verification(&user.email, &user.first_name, &token)
            .await
        {
            tracing::warn!(
                error = %err,
                user_id = %user.id,
                "failed to send verification email"
            );
        }
    });
}
