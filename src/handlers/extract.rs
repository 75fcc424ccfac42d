//! 请求提取器：路径参数与 JSON 请求体，失败统一转换为 JSON 400

use crate::error::AppError;
use axum::{
    extract::{
        path::ErrorKind, rejection::PathRejection, FromRequest, FromRequestParts, Path,
        RawPathParams, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// 校验过的 JSON 请求体
///
/// 未知字段、类型错误和规则违例都转换为 400，消息指出第一个出错的字段。
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value.validate().map_err(first_violation)?;
        Ok(Self(value))
    }
}

/// 校验过的路径参数
///
/// 无法解析的 id 返回 `Validation("<参数名>: must be a valid id")`，而不是 axum 默认的纯文本 400。
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                let key = match err.kind() {
                    ErrorKind::ParseErrorAtKey { key, .. }
                    | ErrorKind::InvalidUtf8InPathParam { key } => Some(key.clone()),
                    _ => None,
                };
                let field = match key {
                    Some(key) => key,
                    None => first_param_name(parts, state).await,
                };
                tracing::debug!(field = %field, error = %err.body_text(), "Rejected path parameter");
                Err(AppError::Validation(format!("{}: must be a valid id", field)))
            }
            Err(rejection) => {
                tracing::error!(error = %rejection.body_text(), "Path extractor used on a route without parameters");
                Err(AppError::internal_error("Path parameters unavailable"))
            }
        }
    }
}

// 单值参数的解析错误不带键名，回退到路由里的第一个参数名
async fn first_param_name<S: Send + Sync>(parts: &mut Parts, state: &S) -> String {
    RawPathParams::from_request_parts(parts, state)
        .await
        .ok()
        .and_then(|params| params.iter().next().map(|(key, _)| key.to_string()))
        .unwrap_or_else(|| "id".to_string())
}

/// 按字段名排序后取第一个违例，保证消息稳定
pub(crate) fn first_violation(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let Some((field, violations)) = fields.into_iter().next() else {
        return AppError::validation("invalid request body");
    };

    let message = violations
        .first()
        .map(|v| match &v.message {
            Some(msg) => msg.to_string(),
            None => v.code.to_string(),
        })
        .unwrap_or_else(|| "invalid".to_string());

    AppError::Validation(format!("{}: {}", field, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_violation_is_alphabetical() {
        let result =
            ValidatedJson::<Sample>::from_request(json_request(r#"{"name":"","email":"nope"}"#), &())
                .await;

        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "email: email"),
            other => panic!("unexpected: {:?}", other.map(|v| v.0)),
        }
    }

    #[tokio::test]
    async fn test_custom_message_used() {
        let result = ValidatedJson::<Sample>::from_request(
            json_request(r#"{"name":"","email":"a@b.io"}"#),
            &(),
        )
        .await;

        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "name: must not be empty"),
            other => panic!("unexpected: {:?}", other.map(|v| v.0)),
        }
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let result = ValidatedJson::<Sample>::from_request(
            json_request(r#"{"name":"x","email":"a@b.io","role":"ADMIN"}"#),
            &(),
        )
        .await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("unknown field")),
            other => panic!("unexpected: {:?}", other.map(|v| v.0)),
        }
    }

    async fn path_response(uri: &str) -> (StatusCode, String) {
        async fn show(ValidatedPath(id): ValidatedPath<Uuid>) -> String {
            id.to_string()
        }

        let app = Router::new().route("/zones/{zone_id}", get(show));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_path_id_is_json_400() {
        let (status, body) = path_response("/zones/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "zone_id: must be a valid id");
    }

    #[tokio::test]
    async fn test_well_formed_path_id_passes() {
        let id = Uuid::new_v4();
        let (status, body) = path_response(&format!("/zones/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id.to_string());
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(sample) = ValidatedJson::<Sample>::from_request(
            json_request(r#"{"name":"Lobby","email":"a@b.io"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(sample.name, "Lobby");
    }
}
