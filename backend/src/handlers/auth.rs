//! Authentication HTTP handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, LoginInput, LoginResponse, UserInfo};
use crate::AppState;

/// Log in with username and password, returning a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Get the current user's profile
pub async fn profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserInfo>> {
    let service = AuthService::new(state.db, &state.config);
    let info = service.profile(current_user.0.user_id).await?;
    Ok(Json(info))
}
