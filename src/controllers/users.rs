//! Регистрация и JWT: `/api/user/*`.
//!
//! Регистрация, выдача и обмен токенов открыты анониму; `/me` закрыт
//! тем же guard'ом, что и остальное API.

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::AppJson;
use crate::error::{AppError, Result};
use crate::middleware::{access::account_guard, Principal};
use crate::models::{Credentials, User, UserView};
use crate::services::auth::{hash_password, verify_password, TokenKind, TokenPair};
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let account = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(state, account_guard));

    Router::new()
        .route("/register", post(register))
        .route("/token", post(obtain_token))
        .route("/token/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .merge(account)
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<(StatusCode, Json<UserView>)> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password)?;
    let user = User::create(&payload.username, &password_hash, false, &state.db).await?;

    info!("User {} registered", user.id);
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

async fn issue_pair(state: &AppState, user: &UserView) -> Result<TokenPair> {
    let issued = state.tokens.issue(user)?;
    state
        .cache
        .remember_refresh_token(&issued.refresh_jti, user.id, issued.refresh_ttl_seconds)
        .await?;
    Ok(issued.pair)
}

async fn obtain_token(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Json<TokenPair>> {
    let invalid = || AppError::Unauthenticated("No active account found with the given credentials");

    let user = User::find_by_username(&payload.username, &state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    Ok(Json(issue_pair(&state, &UserView::from(&user)).await?))
}

// Старый refresh-токен сгорает при обмене, повтор дает 401
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let claims = state
        .tokens
        .decode(&payload.refresh, TokenKind::Refresh)
        .map_err(|_| AppError::Unauthenticated("Token is invalid or expired"))?;

    let owner = state.cache.consume_refresh_token(&claims.jti).await?;
    if owner != Some(claims.sub) {
        return Err(AppError::Unauthenticated("Token is invalid or expired"));
    }

    // is_staff мог измениться: перечитываем пользователя
    let user = User::find_by_id(claims.sub, &state.db)
        .await?
        .ok_or(AppError::Unauthenticated("User not found"))?;

    Ok(Json(issue_pair(&state, &UserView::from(&user)).await?))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<StatusCode> {
    let claims = state
        .tokens
        .decode(&payload.refresh, TokenKind::Refresh)
        .map_err(|_| AppError::Unauthenticated("Token is invalid or expired"))?;

    state.cache.revoke_refresh_token(&claims.jti).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(principal: Principal) -> Json<UserView> {
    Json(UserView {
        id: principal.user_id,
        username: principal.username,
        is_staff: principal.is_staff,
    })
}
