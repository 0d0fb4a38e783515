/// Authentication middleware for Axum
///
/// A single optional-auth middleware inspects `Authorization: Bearer <token>`
/// headers and, when the token is valid, adds an [`AuthContext`] to request
/// extensions. The middleware itself never rejects: requests without a
/// header, or with a token that fails validation, continue anonymously.
/// Routes that require a signed-in user extract `AuthContext` directly and
/// get 401 when it is absent; routes that merely personalize extract
/// `Option<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskdeck_shared::auth::middleware::{create_auth_middleware, AuthContext};
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let app: Router = Router::new()
///     .route("/me", get(protected_handler))
///     .layer(middleware::from_fn(create_auth_middleware("your-jwt-secret")));
/// ```

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::validate_token;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Extracts the auth context placed by the middleware
///
/// Rejects with 401 when the request carried no valid token. Use
/// `Option<AuthContext>` on routes that also serve anonymous callers.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Error type for authentication extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No valid credentials on the request
    MissingCredentials,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Authentication required").into_response()
            }
        }
    }
}

/// Optional bearer-token authentication middleware
///
/// A missing or invalid token downgrades the request to anonymous instead
/// of rejecting it; required-auth routes reject at extraction time.
pub async fn auth_middleware(secret: String, mut req: Request, next: Next) -> Response {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        match validate_token(token, &secret) {
            Ok(claims) => {
                req.extensions_mut().insert(AuthContext::from_jwt(claims.sub));
            }
            Err(err) => {
                tracing::debug!("Ignoring invalid bearer token: {}", err);
            }
        }
    }

    next.run(req).await
}

/// Creates an authentication middleware closure
///
/// Captures the JWT secret for use with `axum::middleware::from_fn`.
pub fn create_auth_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(auth_middleware(secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_jwt() {
        let user_id = Uuid::new_v4();
        let context = AuthContext::from_jwt(user_id);
        assert_eq!(context.user_id, user_id);
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
