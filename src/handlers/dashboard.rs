//! 统计与管理员列表处理器

use crate::{error::AppError, middleware::AppState, scope::AccessContext};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 当前业务的资源计数
pub async fn business_summary(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.dashboard_service.business_summary(&ctx).await?;
    Ok(Json(summary))
}

/// 平台统计（仅管理员）
pub async fn platform_stats(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.dashboard_service.platform_stats(&ctx).await?;
    Ok(Json(stats))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let users = state.dashboard_service.list_users(&ctx).await?;
    Ok(Json(users))
}

pub async fn list_businesses(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let businesses = state.dashboard_service.list_businesses(&ctx).await?;
    Ok(Json(businesses))
}
