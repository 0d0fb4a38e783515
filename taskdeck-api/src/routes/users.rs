/// User directory and profile management endpoints
///
/// # Endpoints
///
/// - `GET    /v1/users` - Directory for assignment and member pickers
/// - `GET    /v1/users/:id` - Profile (self only)
/// - `PUT    /v1/users/:id` - Update profile (self only)
/// - `DELETE /v1/users/:id` - Delete account (self only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{UpdateUser, User, UserSummary},
};
use uuid::Uuid;
use validator::Validate;

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    /// New avatar URL
    pub avatar: Option<String>,
}

/// Directory of all users
///
/// Exposes only id, name, avatar, and email; requires a signed-in caller.
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list_summaries(&state.db).await?;
    Ok(Json(users))
}

/// Fetch a profile, self only
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    if auth.user_id != id {
        return Err(ApiError::Forbidden(
            "You can only view your own profile".to_string(),
        ));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Update a profile, self only
///
/// A new password is re-hashed before storage; other fields pass through
/// as-is.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if auth.user_id != id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    payload.validate()?;

    let password_hash = match payload.password {
        Some(ref plaintext) => Some(password::hash_password(plaintext)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            avatar: payload.avatar,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Delete an account, self only
///
/// Projects the user created survive with a nulled creator; their member
/// entries elsewhere become dangling and resolve to no access.
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if auth.user_id != id {
        return Err(ApiError::Forbidden(
            "You can only delete your own account".to_string(),
        ));
    }

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "User account deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_validation() {
        let valid = UpdateUserRequest {
            name: Some("Ada".to_string()),
            email: None,
            password: None,
            avatar: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = UpdateUserRequest {
            name: None,
            email: Some("nope".to_string()),
            password: None,
            avatar: None,
        };
        assert!(bad_email.validate().is_err());

        let short_password = UpdateUserRequest {
            name: None,
            email: None,
            password: Some("123".to_string()),
            avatar: None,
        };
        assert!(short_password.validate().is_err());
    }
}
