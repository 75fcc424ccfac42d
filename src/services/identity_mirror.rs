//! 上游身份镜像
//!
//! 注册或邀请成功后把新主体推送到外部身份服务。镜像失败只记录日志，
//! 不影响已经提交的主操作。

use crate::{config::IdentityMirrorConfig, error::AppError, models::user::Principal};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::{sync::Arc, time::Duration};

#[async_trait]
pub trait IdentityMirror: Send + Sync {
    async fn mirror(&self, principal: &Principal) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct MirrorPayload<'a> {
    id: String,
    email: &'a str,
    role: &'a str,
}

/// reqwest JSON 客户端
pub struct HttpIdentityMirror {
    client: reqwest::Client,
    url: String,
    api_key: Option<Secret<String>>,
}

impl HttpIdentityMirror {
    pub fn new(url: &str, api_key: Option<Secret<String>>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build identity mirror client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl IdentityMirror for HttpIdentityMirror {
    async fn mirror(&self, principal: &Principal) -> Result<(), AppError> {
        let payload = MirrorPayload {
            id: principal.id.to_string(),
            email: &principal.email,
            role: principal.role.as_str(),
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("identity mirror unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "identity mirror returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// 未配置地址时使用
pub struct DisabledMirror;

#[async_trait]
impl IdentityMirror for DisabledMirror {
    async fn mirror(&self, _principal: &Principal) -> Result<(), AppError> {
        Ok(())
    }
}

/// 根据配置选择实现
pub fn from_config(config: &IdentityMirrorConfig) -> Result<Arc<dyn IdentityMirror>, AppError> {
    match &config.url {
        Some(url) => {
            tracing::info!(url = %url, "Identity mirror enabled");
            Ok(Arc::new(HttpIdentityMirror::new(
                url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        None => {
            tracing::info!("Identity mirror disabled");
            Ok(Arc::new(DisabledMirror))
        }
    }
}

/// 推送并吞掉错误
pub async fn mirror_best_effort(mirror: &dyn IdentityMirror, principal: &Principal) {
    if let Err(e) = mirror.mirror(principal).await {
        metrics::counter!("identity_mirror_failures_total").increment(1);
        tracing::warn!(
            user_id = %principal.id,
            error = %e,
            "Identity mirror failed, continuing"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use uuid::Uuid;

    struct FailingMirror;

    #[async_trait]
    impl IdentityMirror for FailingMirror {
        async fn mirror(&self, _principal: &Principal) -> Result<(), AppError> {
            Err(AppError::Upstream("boom".to_string()))
        }
    }

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            role: Role::BusinessOwner,
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        mirror_best_effort(&FailingMirror, &principal()).await;
    }

    #[tokio::test]
    async fn test_disabled_when_no_url() {
        let config = IdentityMirrorConfig {
            url: None,
            api_key: None,
            timeout_secs: 1,
        };
        let mirror = from_config(&config).unwrap();
        assert!(mirror.mirror(&principal()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_upstream_error() {
        let mirror = HttpIdentityMirror::new(
            "http://127.0.0.1:9/identities",
            None,
            Duration::from_millis(500),
        )
        .unwrap();
        let err = mirror.mirror(&principal()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
