//! Authentication service for login and token issuance

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::UserType;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub user_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Response after a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user information
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub user_type: UserType,
}

/// User row from the database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    user_type: String,
    password_hash: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, user_type, password_hash, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(&input.username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let password_ok = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt failure: {e}")))?;
        if !password_ok {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        let user_type = UserType::from_str(&user.user_type)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unrecognized user type")))?;

        let token = self.issue_token(user.id, &user.username, user_type)?;

        tracing::info!(username = %user.username, "user logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            user: UserInfo {
                id: user.id,
                username: user.username,
                email: user.email,
                user_type,
            },
        })
    }

    /// Fetch public profile information for the current user
    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserInfo> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, user_type, password_hash, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let user_type = UserType::from_str(&user.user_type)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unrecognized user type")))?;

        Ok(UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            user_type,
        })
    }

    fn issue_token(&self, user_id: Uuid, username: &str, user_type: UserType) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            user_type: user_type.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token encoding failed: {e}")))
    }
}
