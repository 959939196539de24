//! Login, token refresh and admin user management.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use portfolio_core::types::{NewUser, User};
use portfolio_storage::UserRepository;

use crate::auth::{hash_password, verify_password, AuthError, TokenKind, TokenPair};
use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::Validator;

use super::not_found;

const MIN_PASSWORD_CHARS: usize = 6;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hash(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Invalid token".into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl UserRequest {
    /// Validate. A password is mandatory on create and optional on update.
    fn validate(&self, password_required: bool) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.required("name", &self.name)
            .required("username", &self.username)
            .email("email", &self.email);
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                v.min_length("password", password, MIN_PASSWORD_CHARS);
            }
            None if password_required => {
                v.required("password", "");
            }
            None => {}
        }
        v.finish()
    }
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(req) = payload?;
    Validator::new()
        .required("username", &req.username)
        .required("password", &req.password)
        .finish()?;

    let users = UserRepository::new(state.database.clone());
    let user = users
        .find_by_username(req.username.trim())?
        .ok_or_else(|| ApiError::Unauthorized("User Not Found".into()))?;

    if !verify_password(&req.password, &user.password_hash) {
        tracing::info!(username = %user.username, "Rejected login: bad password");
        return Err(ApiError::Unauthorized("Invalid Password".into()));
    }

    let TokenPair {
        token,
        refresh_token,
    } = state.jwt.issue_pair(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            user,
            token,
            refresh_token,
        },
    ))
}

/// POST /refresh
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(req) = payload?;
    Validator::new()
        .required("refresh_token", &req.refresh_token)
        .finish()?;

    let invalid = || ApiError::Unauthorized("Invalid or expired refresh token".into());
    let claims = state
        .jwt
        .verify(req.refresh_token.trim(), TokenKind::Refresh)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected refresh token");
            invalid()
        })?;

    // The account may have been removed since the token was issued.
    let user = UserRepository::new(state.database.clone())
        .find_by_id(claims.user_id)?
        .ok_or_else(invalid)?;

    let pair = state.jwt.issue_pair(user.id, &user.username)?;
    Ok(ApiResponse::ok("Token refreshed", pair))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(req) = payload?;
    req.validate(true)?;

    let password_hash = hash_password(req.password.as_deref().unwrap_or_default())?;
    let user = UserRepository::new(state.database.clone()).create(&NewUser {
        name: req.name.trim().to_string(),
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash,
    })?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created("User created successfully", user))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = UserRepository::new(state.database.clone()).list()?;
    Ok(ApiResponse::ok("List Data Users", users))
}

/// GET /users/{id}
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<User> {
    let user = UserRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("User"))?;
    Ok(ApiResponse::ok("User Found", user))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(req) = payload?;
    req.validate(false)?;

    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = UserRepository::new(state.database.clone())
        .update(
            id,
            req.name.trim(),
            req.username.trim(),
            req.email.trim(),
            password_hash.as_deref(),
        )?
        .ok_or_else(|| not_found("User"))?;
    Ok(ApiResponse::ok("User updated successfully", user))
}

/// DELETE /users/{id}
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    if !UserRepository::new(state.database.clone()).delete(id)? {
        return Err(not_found("User"));
    }
    Ok(ApiResponse::ok("User deleted successfully", ()))
}
