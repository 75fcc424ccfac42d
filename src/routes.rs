//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{auth::session::session_middleware, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::get_current_user));

    // 物业与设备
    let site_routes = Router::new()
        .route(
            "/api/user/properties",
            get(handlers::site::list_properties).post(handlers::site::create_property),
        )
        .route(
            "/api/properties/{id}",
            get(handlers::site::get_property)
                .put(handlers::site::update_property)
                .delete(handlers::site::delete_property),
        )
        .route(
            "/api/user/buildings",
            get(handlers::site::list_buildings).post(handlers::site::create_building),
        )
        .route(
            "/api/buildings/{id}",
            get(handlers::site::get_building)
                .put(handlers::site::update_building)
                .delete(handlers::site::delete_building),
        )
        .route(
            "/api/user/zones",
            get(handlers::site::list_zones).post(handlers::site::create_zone),
        )
        .route(
            "/api/zones/{id}",
            get(handlers::site::get_zone)
                .put(handlers::site::update_zone)
                .delete(handlers::site::delete_zone),
        )
        .route(
            "/api/user/cameras",
            get(handlers::site::list_cameras).post(handlers::site::create_camera),
        )
        .route(
            "/api/cameras/{id}",
            get(handlers::site::get_camera)
                .put(handlers::site::update_camera)
                .delete(handlers::site::delete_camera),
        );

    // 业务内配置
    let tenant_routes = Router::new()
        .route(
            "/api/user/departments",
            get(handlers::tenant::list_departments).post(handlers::tenant::create_department),
        )
        .route(
            "/api/departments/{id}",
            get(handlers::tenant::get_department)
                .put(handlers::tenant::update_department)
                .delete(handlers::tenant::delete_department),
        )
        .route(
            "/api/user/alert-rule",
            get(handlers::tenant::list_alert_rules).post(handlers::tenant::create_alert_rule),
        )
        .route(
            "/api/user/alert-rule/{id}",
            get(handlers::tenant::get_alert_rule)
                .put(handlers::tenant::update_alert_rule)
                .delete(handlers::tenant::delete_alert_rule),
        )
        .route(
            "/api/user/notes",
            get(handlers::tenant::list_notes).post(handlers::tenant::create_note),
        )
        .route(
            "/api/notes/{id}",
            get(handlers::tenant::get_note)
                .put(handlers::tenant::update_note)
                .delete(handlers::tenant::delete_note),
        )
        .route(
            "/api/user/vt-credentials",
            get(handlers::tenant::list_credentials).post(handlers::tenant::create_credential),
        )
        .route(
            "/api/vt-credentials/{id}",
            get(handlers::tenant::get_credential)
                .put(handlers::tenant::update_credential)
                .delete(handlers::tenant::delete_credential),
        );

    // 员工管理
    let staff_routes = Router::new()
        .route(
            "/api/user/staff",
            get(handlers::staff::list_staff).post(handlers::staff::invite_staff),
        )
        .route(
            "/api/user/staff/{staff_id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::remove_staff),
        );

    // 统计
    let dashboard_routes = Router::new()
        .route("/api/user/dashboard", get(handlers::dashboard::business_summary))
        .route("/api/admin/stats", get(handlers::dashboard::platform_stats))
        .route("/api/admin/users", get(handlers::dashboard::list_users))
        .route("/api/admin/businesses", get(handlers::dashboard::list_businesses));

    // 组合所有路由
    // 会话中间件只附加 Principal，拒绝由 handler 的提取器完成
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(site_routes)
        .merge(tenant_routes)
        .merge(staff_routes)
        .merge(dashboard_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
