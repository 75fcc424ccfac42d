//! 汇总统计模型

use serde::Serialize;

/// 平台统计（不含演示账号）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub business_owners: i64,
    pub staff_members: i64,
    pub admin_users: i64,
    pub active_businesses: i64,
}

/// 单个业务的资源计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    pub properties: i64,
    pub buildings: i64,
    pub zones: i64,
    pub cameras: i64,
    pub departments: i64,
    pub alert_rules: i64,
    pub staff: i64,
}
