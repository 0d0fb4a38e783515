/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and get a session token
/// - `POST /v1/auth/login` - Exchange credentials for a session token
/// - `GET  /v1/auth/me` - Current user profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User, UserRole},
};
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Session response returned by signup and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session token (Bearer)
    pub token: String,

    /// The authenticated user
    pub user: User,
}

/// Register a new user
///
/// The first account on an instance becomes the admin. Returns a session
/// token alongside the created user.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret1",
///   "name": "John Doe"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<Json<SessionResponse>> {
    payload.validate()?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let role = if User::count(&state.db).await? == 0 {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let password_hash = password::hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: payload.email,
            password_hash,
            name: payload.name,
            role,
        },
    )
    .await?;

    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "New user registered");

    Ok(Json(SessionResponse { token, user }))
}

/// Login with email and password
///
/// The failure message never says whether the email or the password was
/// wrong.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&payload.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(SessionResponse { token, user }))
}

/// Current user profile
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <token>
/// ```
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            name: "Ada".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignupRequest {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
            name: "Ada".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignupRequest {
            email: "ada@example.com".to_string(),
            password: "12345".to_string(),
            name: "Ada".to_string(),
        };
        assert!(short_password.validate().is_err());

        let empty_name = SignupRequest {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            name: "".to_string(),
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "whatever".to_string(),
        };
        assert!(valid.validate().is_ok());
    }
}
