//! 业务员工关系模型

use super::user::UserResponse;
use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

/// 员工关系：一个员工同一时间最多属于一个业务
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BusinessStaff {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub department_id: Option<Uuid>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessStaff {
    pub fn new(
        business_id: Uuid,
        user_id: Uuid,
        department_id: Option<Uuid>,
        position: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            business_id,
            user_id,
            department_id,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ScopedRecord for BusinessStaff {
    const KIND: ResourceKind = ResourceKind::BusinessStaff;

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

/// 邀请员工请求
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InviteStaffRequest {
    /// 仅平台管理员可指定
    pub business_id: Option<Uuid>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"), custom(function = "not_blank"))]
    pub name: String,
    /// 新账号的初始密码；链接已有员工账号时忽略
    #[validate(length(min = 1, max = 128, message = "must not be empty"))]
    pub password: String,
    pub department_id: Option<Uuid>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub position: Option<String>,
}

/// 更新员工请求
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateStaffRequest {
    pub department_id: Option<Uuid>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub position: Option<String>,
}

/// 员工响应（包含用户信息）
#[derive(Debug, Serialize)]
pub struct StaffResponse {
    #[serde(flatten)]
    pub staff: BusinessStaff,
    pub user: Option<UserResponse>,
}
