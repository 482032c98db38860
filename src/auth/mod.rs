/*!
 * # Authentication and Authorization Module
 *
 * Bearer JWTs (HS256) identify two kinds of principal:
 *
 * - customers, backed by a `profile` row
 * - administrators, backed by a `user` row that must be `active`
 *
 * Route groups opt in through [`AuthRouterExt`]. A missing or malformed
 * `Authorization` header is answered with 401; a token that fails
 * verification, a wrong role or an inactive admin with 403.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::entities::admin_user;
use crate::errors::{ErrorResponse, ServiceError};

mod password;

pub use password::{hash_password, verify_password};

/// Principal kind carried in every token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // profile id or admin user id
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated principal extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }
}

/// The admin row loaded by the admin guard, available to handlers behind it
#[derive(Debug, Clone)]
pub struct AdminUser(pub admin_user::Model);

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_lifetime: Duration,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_lifetime: Duration) -> Self {
        Self {
            jwt_secret,
            token_lifetime,
        }
    }
}

/// Random alphanumeric string, used for ephemeral signing secrets
pub fn generate_secret(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Issues and verifies tokens, and resolves admin accounts for the admin guard
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

/// Token returned by login, signup and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: String,
    /// Seconds until expiry
    pub expires_in: i64,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    pub fn token_lifetime(&self) -> Duration {
        self.config.token_lifetime
    }

    /// Signs a token for principal `id`
    pub fn issue_token(
        &self,
        id: i32,
        role: Role,
        email: Option<String>,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.config.token_lifetime.as_secs())
            .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: id.to_string(),
            role,
            email,
            iat: now,
            exp: now + lifetime,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: lifetime,
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }

    /// Verifies a bearer token and turns its claims into an [`AuthUser`]
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id,
            role: claims.role,
            email: claims.email,
        })
    }

    /// Loads the admin row behind `user` and insists it is still active.
    /// Deactivation therefore takes effect on the next request.
    pub async fn require_active_admin(
        &self,
        user: &AuthUser,
    ) -> Result<admin_user::Model, AuthError> {
        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        let admin = admin_user::Entity::find_by_id(user.id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        if !admin.is_active() {
            warn!(admin_id = admin.id, "inactive admin attempted access");
            return Err(AuthError::InactiveAccount);
        }
        Ok(admin)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Account is not active")]
    InactiveAccount,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken
            | Self::TokenExpired
            | Self::UserNotFound
            | Self::InactiveAccount
            | Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::MissingToken => "No authentication token provided".to_string(),
            Self::InvalidToken => "Invalid authentication token".to_string(),
            Self::TokenExpired => "Authentication token has expired".to_string(),
            Self::UserNotFound | Self::InsufficientPermissions => {
                "Admin access required".to_string()
            }
            Self::InactiveAccount => "Account is not active".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
        } else {
            debug!(error = %self, "request rejected by auth guard");
        }
        let body = ErrorResponse {
            message: self.public_message(),
            error: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err.status_code() {
            StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(err.public_message()),
            StatusCode::FORBIDDEN => ServiceError::Forbidden(err.public_message()),
            _ => ServiceError::InternalError(err.to_string()),
        }
    }
}

/// Reads `Authorization: Bearer <token>`. Any other shape counts as missing.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Requires a valid token of any role
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let user = auth.authenticate(token)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Requires a valid admin token whose account is active
pub async fn admin_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let user = auth.authenticate(token)?;
    let admin = auth.require_active_admin(&user).await?;
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(AdminUser(admin));
    Ok(next.run(request).await)
}

/// Attaches the principal when a token is supplied. A supplied token that does
/// not verify is still rejected.
pub async fn optional_auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if request.headers().contains_key(header::AUTHORIZATION) {
        let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
        let user = auth.authenticate(token)?;
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminUser>()
            .cloned()
            .ok_or(AuthError::InsufficientPermissions)
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, auth: Arc<AuthService>) -> Self;
    fn with_admin(self, auth: Arc<AuthService>) -> Self;
    fn with_optional_auth(self, auth: Arc<AuthService>) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn with_admin(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(auth, admin_middleware))
    }

    fn with_optional_auth(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            auth,
            optional_auth_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service(lifetime: Duration) -> AuthService {
        AuthService::new(
            AuthConfig::new(generate_secret(48), lifetime),
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let auth = service(Duration::from_secs(3600));
        let issued = auth
            .issue_token(42, Role::Customer, Some("a@b.in".into()))
            .unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let user = auth.authenticate(&issued.token).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.email.as_deref(), Some("a@b.in"));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = service(Duration::from_secs(3600));
        let verifier = service(Duration::from_secs(3600));
        let issued = issuer.issue_token(1, Role::Admin, None).unwrap();
        let err = verifier.authenticate(&issued.token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn expired_token_is_forbidden() {
        let auth = service(Duration::from_secs(0));
        let issued = auth.issue_token(1, Role::Customer, None).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let err = auth.authenticate(&issued.token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn generated_secret_has_requested_length() {
        let secret = generate_secret(64);
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn missing_token_maps_to_unauthorized_service_error() {
        let err: ServiceError = AuthError::MissingToken.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
