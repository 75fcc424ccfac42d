//! 员工管理的 HTTP 处理器

use super::extract::{ValidatedJson, ValidatedPath};
use crate::{
    error::AppError,
    middleware::AppState,
    models::{staff::*, user::Principal},
    scope::AccessContext,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let staff = state.staff_service.list(&ctx).await?;
    Ok(Json(staff))
}

/// 邀请员工
pub async fn invite_staff(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<InviteStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let staff = state.staff_service.invite(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(staff_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state.staff_service.get(&ctx, staff_id).await?;
    Ok(Json(staff))
}

pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(staff_id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let staff = state.staff_service.update(&ctx, staff_id, req).await?;
    Ok(Json(staff))
}

/// 移除员工
pub async fn remove_staff(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(staff_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.staff_service.remove(&ctx, staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
