//! 会话解析与认证中间件

use crate::{
    auth::jwt::JwtService,
    error::AppError,
    middleware::AppState,
    models::user::Principal,
    scope::AccessContext,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 会话解析器：Authorization Bearer 优先，其次会话 Cookie
pub struct SessionResolver {
    jwt_service: Arc<JwtService>,
    cookie_name: String,
}

impl SessionResolver {
    pub fn new(jwt_service: Arc<JwtService>, cookie_name: &str) -> Self {
        Self {
            jwt_service,
            cookie_name: cookie_name.to_string(),
        }
    }

    /// 解析请求头中的主体；任何失败都视为未登录
    pub fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = extract_bearer(headers).or_else(|| extract_cookie(headers, &self.cookie_name))?;

        match self.jwt_service.validate_session_token(&token) {
            Ok(principal) => Some(principal),
            Err(_) => {
                tracing::debug!("Session token rejected");
                None
            }
        }
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// 从 Cookie 头提取指定名称的值
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// 会话中间件：解析成功时把 Principal 附加到请求扩展，不拒绝请求
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(principal) = state.sessions.resolve(req.headers()) {
        req.extensions_mut().insert(principal);
    }

    next.run(req).await
}

// 在 handler 中直接提取 Principal，缺失即 401
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

// 每个请求重新解析业务归属
impl FromRequestParts<Arc<AppState>> for AccessContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        state.scope_resolver.resolve(principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_config, models::user::Role};
    use uuid::Uuid;

    fn resolver() -> (SessionResolver, Arc<JwtService>) {
        let jwt = Arc::new(JwtService::from_config(&test_config()).unwrap());
        (SessionResolver::new(jwt.clone(), "vt_session"), jwt)
    }

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "staff@example.com".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());
        assert_eq!(extract_bearer(&headers).as_deref(), Some("test_token_123"));

        headers.insert("authorization", "InvalidFormat".parse().unwrap());
        assert!(extract_bearer(&headers).is_none());
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "theme=dark; vt_session=abc.def.ghi; other=1".parse().unwrap());
        assert_eq!(extract_cookie(&headers, "vt_session").as_deref(), Some("abc.def.ghi"));
        assert!(extract_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn test_resolve_prefers_bearer_then_cookie() {
        let (sessions, jwt) = resolver();
        let who = principal();
        let token = jwt.generate_session_token(&who).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("cookie", format!("vt_session={}", token).parse().unwrap());
        assert_eq!(sessions.resolve(&headers), Some(who.clone()));

        headers.insert("authorization", "Bearer garbage".parse().unwrap());
        // 存在 Bearer 时不回退到 Cookie
        assert!(sessions.resolve(&headers).is_none());
    }

    #[test]
    fn test_resolve_without_credentials() {
        let (sessions, _) = resolver();
        assert!(sessions.resolve(&HeaderMap::new()).is_none());
    }
}
