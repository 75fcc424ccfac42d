//! 部门模型

use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Department {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Department {
    const KIND: ResourceKind = ResourceKind::Department;

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
pub struct CreateDepartmentRequest {
    pub business_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
}
