//! HTTP 中间件与应用状态
//! 请求追踪、服务装配

use crate::{
    auth::{JwtService, PasswordHasher, SessionResolver},
    config::AppConfig,
    error::AppError,
    repository::Store,
    scope::ScopeResolver,
    services::{
        AuthService, DashboardService, IdentityMirror, ResourceService, SiteService, StaffService,
        TenantService,
    },
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 存储客户端在启动时构造并注入，服务之间共享同一个 `Arc<dyn Store>`。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub jwt_service: Arc<JwtService>,
    pub sessions: Arc<SessionResolver>,
    pub scope_resolver: Arc<ScopeResolver>,
    pub auth_service: Arc<AuthService>,
    pub site_service: Arc<SiteService>,
    pub tenant_service: Arc<TenantService>,
    pub staff_service: Arc<StaffService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        mirror: Arc<dyn IdentityMirror>,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let hasher = Arc::new(hasher);
        let resources = ResourceService::new(store.clone());

        Ok(Self {
            sessions: Arc::new(SessionResolver::new(
                jwt_service.clone(),
                &config.security.session_cookie,
            )),
            scope_resolver: Arc::new(ScopeResolver::new(store.clone())),
            auth_service: Arc::new(AuthService::new(
                store.clone(),
                jwt_service.clone(),
                hasher.clone(),
                config.security.clone(),
                mirror.clone(),
            )),
            site_service: Arc::new(SiteService::new(resources.clone())),
            tenant_service: Arc::new(TenantService::new(resources.clone())),
            staff_service: Arc::new(StaffService::new(
                resources.clone(),
                hasher,
                config.security.clone(),
                mirror,
            )),
            dashboard_service: Arc::new(DashboardService::new(
                resources,
                &config.tenancy.demo_email_marker,
            )),
            jwt_service,
            store,
            config,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method_label(&method),
            "status" => status_label(status)
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中回显 trace_id / request_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

// metrics 标签使用静态字符串
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        _ => "UNKNOWN",
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        200 => "200",
        201 => "201",
        204 => "204",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        409 => "409",
        500 => "500",
        502 => "502",
        503 => "503",
        _ => "other",
    }
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
