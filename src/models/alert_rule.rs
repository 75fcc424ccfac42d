//! 告警规则模型

use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

/// 告警触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_trigger", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertTrigger {
    Motion,
    Intrusion,
    Loitering,
    Crowd,
    CameraOffline,
}

/// 告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AlertRule {
    pub id: Uuid,
    pub business_id: Uuid,
    pub zone_id: Option<Uuid>,
    pub name: String,
    pub trigger: AlertTrigger,
    pub severity: AlertSeverity,
    pub threshold: Option<i32>,
    pub notify_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for AlertRule {
    const KIND: ResourceKind = ResourceKind::AlertRule;

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

/// 创建告警规则请求
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateAlertRuleRequest {
    pub business_id: Option<Uuid>,
    /// 限定到某个区域；区域必须属于同一业务
    pub zone_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: String,
    pub trigger: AlertTrigger,
    #[serde(default = "default_severity")]
    pub severity: AlertSeverity,
    #[validate(range(min = 0, max = 10000, message = "must be between 0 and 10000"))]
    pub threshold: Option<i32>,
    #[validate(email(message = "must be a valid email address"))]
    pub notify_email: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_severity() -> AlertSeverity {
    AlertSeverity::Medium
}

fn default_active() -> bool {
    true
}

/// 更新告警规则请求（字段替换，重复提交结果相同）
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateAlertRuleRequest {
    pub zone_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    pub trigger: Option<AlertTrigger>,
    pub severity: Option<AlertSeverity>,
    #[validate(range(min = 0, max = 10000, message = "must be between 0 and 10000"))]
    pub threshold: Option<i32>,
    #[validate(email(message = "must be a valid email address"))]
    pub notify_email: Option<String>,
    pub is_active: Option<bool>,
}
