//! 部门、告警规则、备注、VT 凭证的 HTTP 处理器

use super::extract::{ValidatedJson, ValidatedPath};
use crate::{
    error::AppError,
    middleware::AppState,
    models::{alert_rule::*, credential::*, department::*, note::*, user::Principal},
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

// ==================== Departments ====================

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let departments = state.tenant_service.list_departments(&ctx).await?;
    Ok(Json(departments))
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let department = state.tenant_service.create_department(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let department = state.tenant_service.get_department(&ctx, id).await?;
    Ok(Json(department))
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateDepartmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let department = state.tenant_service.update_department(&ctx, id, req).await?;
    Ok(Json(department))
}

pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.delete_department(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Alert rules ====================

/// 列出告警规则
pub async fn list_alert_rules(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.tenant_service.list_alert_rules(&ctx).await?;
    Ok(Json(rules))
}

/// 创建告警规则
pub async fn create_alert_rule(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateAlertRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let rule = state.tenant_service.create_alert_rule(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn get_alert_rule(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state.tenant_service.get_alert_rule(&ctx, id).await?;
    Ok(Json(rule))
}

/// 更新告警规则（相同负载重复提交不改变存储状态）
pub async fn update_alert_rule(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateAlertRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let rule = state.tenant_service.update_alert_rule(&ctx, id, req).await?;
    Ok(Json(rule))
}

pub async fn delete_alert_rule(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.delete_alert_rule(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Notes ====================

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let notes = state.tenant_service.list_notes(&ctx).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let note = state.tenant_service.create_note(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let note = state.tenant_service.get_note(&ctx, id).await?;
    Ok(Json(note))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let note = state.tenant_service.update_note(&ctx, id, req).await?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.delete_note(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== VT credentials ====================

pub async fn list_credentials(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
) -> Result<impl IntoResponse, AppError> {
    let credentials = state.tenant_service.list_credentials(&ctx).await?;
    Ok(Json(credentials))
}

/// 创建凭证，响应中包含一次性明文密钥
pub async fn create_credential(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let issued = state.tenant_service.create_credential(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn get_credential(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let credential = state.tenant_service.get_credential(&ctx, id).await?;
    Ok(Json(credential))
}

pub async fn update_credential(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.scope_resolver.resolve(principal).await?;
    let credential = state.tenant_service.update_credential(&ctx, id, req).await?;
    Ok(Json(credential))
}

pub async fn delete_credential(
    State(state): State<Arc<AppState>>,
    ctx: AccessContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.delete_credential(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
