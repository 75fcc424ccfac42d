//! 汇总统计服务
//!
//! 查询依次执行，不需要跨查询事务。演示账号在所有统计和列表中排除。

use super::resource_service::ResourceService;
use crate::{
    error::AppError,
    models::{
        alert_rule::AlertRule,
        business::Business,
        dashboard::{BusinessSummary, DashboardStats},
        department::Department,
        site::{Building, Camera, Property, Zone},
        user::UserResponse,
    },
    repository::DirectoryStore,
    scope::{AccessContext, ResourceKind, ScopeFilter},
};

pub struct DashboardService {
    resources: ResourceService,
    demo_marker: String,
}

impl DashboardService {
    pub fn new(resources: ResourceService, demo_marker: &str) -> Self {
        Self {
            resources,
            demo_marker: demo_marker.to_string(),
        }
    }

    /// 当前业务的资源计数
    pub async fn business_summary(&self, ctx: &AccessContext) -> Result<BusinessSummary, AppError> {
        let staff_filter = ScopeFilter::for_kind(ctx, ResourceKind::BusinessStaff)?;

        Ok(BusinessSummary {
            properties: self.resources.count::<Property>(ctx).await?,
            buildings: self.resources.count::<Building>(ctx).await?,
            zones: self.resources.count::<Zone>(ctx).await?,
            cameras: self.resources.count::<Camera>(ctx).await?,
            departments: self.resources.count::<Department>(ctx).await?,
            alert_rules: self.resources.count::<AlertRule>(ctx).await?,
            staff: self
                .resources
                .store()
                .count_staff(&staff_filter, &self.demo_marker)
                .await?,
        })
    }

    /// 平台统计（仅管理员）
    pub async fn platform_stats(&self, ctx: &AccessContext) -> Result<DashboardStats, AppError> {
        ctx.require_admin()?;
        let stats = self
            .resources
            .store()
            .dashboard_stats(&self.demo_marker)
            .await?;

        metrics::gauge!("platform_users").set(stats.total_users as f64);
        metrics::gauge!("platform_active_businesses").set(stats.active_businesses as f64);
        Ok(stats)
    }

    pub async fn list_users(&self, ctx: &AccessContext) -> Result<Vec<UserResponse>, AppError> {
        ctx.require_admin()?;
        let users = self.resources.store().list_users(&self.demo_marker).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn list_businesses(&self, ctx: &AccessContext) -> Result<Vec<Business>, AppError> {
        ctx.require_admin()?;
        self.resources
            .store()
            .list_businesses(&self.demo_marker)
            .await
    }
}
