/*!
 * # Authentication
 *
 * Username/password login against the `users` table and HS256 bearer tokens.
 * Every `/api` route sits behind [`auth_middleware`], which verifies the
 * token signature, expiry, issuer and audience before the handler runs.
 */

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::user;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // user id
    pub username: String,
    pub jti: String,      // unique per token
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Identity attached to a request once its token checks out
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub token_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            token_id: claims.jti,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

/// Issued on a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginCredentials {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Authentication service that handles login and token validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Sign a token for `user`
    pub fn generate_token(&self, user: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs(),
        })
    }

    /// Verifies signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Checks credentials against the stored argon2 hash and issues a token
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenResponse, AuthError> {
        credentials
            .validate()
            .map_err(|_| AuthError::InvalidCredentials)?;

        let found = user::Entity::find()
            .filter(user::Column::Username.eq(credentials.username.as_str()))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let Some(account) = found else {
            debug!(username = %credentials.username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &account.password_hash) {
            warn!(username = %account.username, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = account.id, "User logged in");
        self.generate_token(&account)
    }

    /// Stores a new login, used by the admin CLI
    pub async fn create_user(&self, username: &str, password: &str) -> Result<user::Model, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let account = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)?),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        account
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }
}

/// Produces an argon2id PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::TokenExpired => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, error_message): (&str, String) = match &self {
            Self::InvalidCredentials => (
                "AUTH_INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            Self::MissingToken => (
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => ("AUTH_TOKEN_EXPIRED", "Token has expired".to_string()),
            Self::TokenCreation(msg) => {
                tracing::error!(error = %msg, "Token creation failed");
                ("AUTH_TOKEN_CREATION_FAILED", "Server error".to_string())
            }
            Self::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Authentication storage failure");
                ("AUTH_DATABASE_ERROR", "Server error".to_string())
            }
            Self::InternalError(msg) => {
                tracing::error!(error = %msg, "Authentication internal failure");
                ("AUTH_INTERNAL_ERROR", "Server error".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Rejects requests without a valid bearer token and stores the
/// [`AuthUser`] in the request extensions
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn authenticate(headers: &HeaderMap, auth_service: &AuthService) -> Result<AuthUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    auth_service.validate_token(token).map(AuthUser::from)
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    summary = "Log in",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid username or password"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<TokenResponse>, AuthError> {
    let token = auth_service.login(&credentials).await?;
    Ok(Json(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    fn service_with(config: AuthConfig) -> AuthService {
        AuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    fn config() -> AuthConfig {
        AuthConfig::new(
            "t".repeat(64),
            "mps-clients".into(),
            "mps-api".into(),
            Duration::from_secs(3600),
        )
    }

    fn account() -> user::Model {
        user::Model {
            id: 7,
            username: "planner".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let service = service_with(config());
        let issued = service.generate_token(&account()).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let claims = service.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "planner");
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let issuer = service_with(AuthConfig {
            jwt_audience: "someone-else".into(),
            ..config()
        });
        let token = issuer.generate_token(&account()).unwrap().token;

        let verifier = service_with(config());
        assert!(matches!(
            verifier.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let service = service_with(config());
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "7".into(),
            username: "planner".into(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "mps-api".into(),
            aud: "mps-clients".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("t".repeat(64).as_bytes()),
        )
        .unwrap();

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let service = service_with(config());
        let err = authenticate(&HeaderMap::new(), &service).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret-pass", "not-a-phc-string"));
    }
}
