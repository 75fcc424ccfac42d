//! 认证相关的 HTTP 处理器

use super::extract::ValidatedJson;
use crate::{error::AppError, middleware::AppState, models::user::*, scope::AccessContext};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// 注册业务所有者
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

/// 当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let me = state.auth_service.me(&ctx).await?;
    Ok(Json(me))
}
