//! VisionTrack 网关 API 凭证模型

use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

/// 存储的凭证，明文密钥从不落库
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VtApiCredential {
    pub id: Uuid,
    pub business_id: Uuid,
    pub label: String,
    pub key_prefix: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for VtApiCredential {
    const KIND: ResourceKind = ResourceKind::VtCredential;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_ref(&self) -> Uuid {
        self.business_id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCredentialRequest {
    pub business_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"), custom(function = "not_blank"))]
    pub label: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCredentialRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"), custom(function = "not_blank"))]
    pub label: String,
}

/// 仅在创建时返回一次
#[derive(Debug, Serialize)]
pub struct IssuedCredential {
    #[serde(flatten)]
    pub credential: VtApiCredential,
    pub api_key: String,
}
