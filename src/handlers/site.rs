//! 物业、楼宇、区域、摄像头的 HTTP 处理器

use super::extract::{ValidatedJson, ValidatedPath};
use crate::{
    error::AppError,
    middleware::AppState,
    models::{site::*, user::Principal},
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

// ==================== Properties ====================

/// 列出物业（含楼宇）
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let properties = state.site_service.list_properties(&ctx).await?;
    Ok(Json(properties))
}

/// 创建物业
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let property = state.site_service.create_property(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn get_property(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.site_service.get_property(&ctx, id).await?;
    Ok(Json(property))
}

pub async fn update_property(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let property = state.site_service.update_property(&ctx, id, req).await?;
    Ok(Json(property))
}

/// 删除物业（级联楼宇、区域、摄像头、备注）
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.site_service.delete_property(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Buildings ====================

pub async fn list_buildings(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let buildings = state.site_service.list_buildings(&ctx).await?;
    Ok(Json(buildings))
}

pub async fn create_building(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateBuildingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let building = state.site_service.create_building(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

pub async fn get_building(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let building = state.site_service.get_building(&ctx, id).await?;
    Ok(Json(building))
}

pub async fn update_building(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateBuildingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let building = state.site_service.update_building(&ctx, id, req).await?;
    Ok(Json(building))
}

pub async fn delete_building(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.site_service.delete_building(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Zones ====================

/// 列出区域（含摄像头）
pub async fn list_zones(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let zones = state.site_service.list_zones(&ctx).await?;
    Ok(Json(zones))
}

pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateZoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let zone = state.site_service.create_zone(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(zone)))
}

pub async fn get_zone(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let zone = state.site_service.get_zone(&ctx, id).await?;
    Ok(Json(zone))
}

pub async fn update_zone(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateZoneRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let zone = state.site_service.update_zone(&ctx, id, req).await?;
    Ok(Json(zone))
}

pub async fn delete_zone(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.site_service.delete_zone(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Cameras ====================

pub async fn list_cameras(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let cameras = state.site_service.list_cameras(&ctx).await?;
    Ok(Json(cameras))
}

pub async fn create_camera(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateCameraRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let camera = state.site_service.create_camera(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(camera)))
}

pub async fn get_camera(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let camera = state.site_service.get_camera(&ctx, id).await?;
    Ok(Json(camera))
}

/// 更新摄像头，移动到其他区域时重新校验目标区域
pub async fn update_camera(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCameraRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let camera = state.site_service.update_camera(&ctx, id, req).await?;
    Ok(Json(camera))
}

pub async fn delete_camera(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.site_service.delete_camera(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
