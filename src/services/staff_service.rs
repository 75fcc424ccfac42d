//! 员工管理服务

use super::{
    identity_mirror::{mirror_best_effort, IdentityMirror},
    resource_service::ResourceService,
};
use crate::{
    auth::PasswordHasher,
    config::SecurityConfig,
    error::AppError,
    models::{
        department::Department,
        staff::*,
        user::{Role, User, UserResponse},
    },
    repository::DirectoryStore,
    scope::{AccessContext, ResourceKind, ScopeFilter},
};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

pub struct StaffService {
    resources: ResourceService,
    hasher: Arc<PasswordHasher>,
    policy: SecurityConfig,
    mirror: Arc<dyn IdentityMirror>,
}

impl StaffService {
    pub fn new(
        resources: ResourceService,
        hasher: Arc<PasswordHasher>,
        policy: SecurityConfig,
        mirror: Arc<dyn IdentityMirror>,
    ) -> Self {
        Self {
            resources,
            hasher,
            policy,
            mirror,
        }
    }

    async fn with_users(&self, links: Vec<BusinessStaff>) -> Result<Vec<StaffResponse>, AppError> {
        let ids: Vec<Uuid> = links.iter().map(|l| l.user_id).collect();
        let mut users: HashMap<Uuid, User> = self
            .resources
            .store()
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(links
            .into_iter()
            .map(|staff| StaffResponse {
                user: users.remove(&staff.user_id).map(UserResponse::from),
                staff,
            })
            .collect())
    }

    /// 列出本业务员工（任何成员可见）
    pub async fn list(&self, ctx: &AccessContext) -> Result<Vec<StaffResponse>, AppError> {
        let links: Vec<BusinessStaff> = self.resources.list(ctx).await?;
        self.with_users(links).await
    }

    /// 查看单个员工（仅所有者）
    pub async fn get(&self, ctx: &AccessContext, staff_id: Uuid) -> Result<StaffResponse, AppError> {
        let link: BusinessStaff = self.resources.get_for_write(ctx, staff_id).await?;
        let mut found = self.with_users(vec![link]).await?;
        found
            .pop()
            .ok_or_else(|| AppError::not_found(ResourceKind::BusinessStaff.label()))
    }

    async fn check_department(&self, business_id: Uuid, department_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(department_id) = department_id {
            self.resources
                .parent_in_business::<Department>(business_id, department_id)
                .await?;
        }
        Ok(())
    }

    /// 邀请员工：新建 STAFF 账号并关联，或关联一个未分配的已有 STAFF 账号
    pub async fn invite(
        &self,
        ctx: &AccessContext,
        req: InviteStaffRequest,
    ) -> Result<StaffResponse, AppError> {
        self.resources
            .authorize_create(ctx, ResourceKind::BusinessStaff)?;
        let business_id = self.resources.target_business(ctx, req.business_id).await?;
        self.check_department(business_id, req.department_id).await?;

        let store = self.resources.store();
        let existing = store.find_user_by_email(&req.email).await?;

        let (user, created) = match existing {
            Some(user) if user.role == Role::Staff => {
                if store.staff_assignment(user.id).await?.is_some() {
                    return Err(AppError::conflict("User is already assigned to a business"));
                }
                (user, false)
            }
            Some(_) => return Err(AppError::conflict("Email already registered")),
            None => {
                PasswordHasher::validate_password_policy(&req.password, &self.policy)?;
                let hash = self.hasher.hash(&req.password)?;
                (User::new(&req.email, &req.name, hash, Role::Staff), true)
            }
        };

        let link = BusinessStaff::new(business_id, user.id, req.department_id, req.position);
        let link = store
            .add_staff(if created { Some(&user) } else { None }, &link)
            .await?;

        tracing::info!(
            business_id = %business_id,
            user_id = %user.id,
            new_account = created,
            "Staff member linked"
        );

        if created {
            mirror_best_effort(self.mirror.as_ref(), &user.principal()).await;
        }

        Ok(StaffResponse {
            staff: link,
            user: Some(user.into()),
        })
    }

    /// 更新部门 / 职位
    pub async fn update(
        &self,
        ctx: &AccessContext,
        staff_id: Uuid,
        req: UpdateStaffRequest,
    ) -> Result<StaffResponse, AppError> {
        let stored: BusinessStaff = self.resources.get_for_write(ctx, staff_id).await?;

        let mut merged = stored.clone();
        if req.department_id.is_some() && req.department_id != stored.department_id {
            self.check_department(stored.business_id, req.department_id).await?;
            merged.department_id = req.department_id;
        }
        if req.position.is_some() {
            merged.position = req.position;
        }

        let saved = self.resources.save(ctx, stored, merged).await?;
        let mut found = self.with_users(vec![saved]).await?;
        found
            .pop()
            .ok_or_else(|| AppError::not_found(ResourceKind::BusinessStaff.label()))
    }

    /// 移除员工：删除关联并把账号角色重置为 STAFF（同一事务）
    pub async fn remove(&self, ctx: &AccessContext, staff_id: Uuid) -> Result<(), AppError> {
        ctx.ensure_can_write(ResourceKind::BusinessStaff)?;
        let filter = ScopeFilter::for_kind(ctx, ResourceKind::BusinessStaff)?;

        let removed = self
            .resources
            .store()
            .remove_staff(staff_id, &filter)
            .await?
            .ok_or_else(|| AppError::not_found(ResourceKind::BusinessStaff.label()))?;

        tracing::info!(
            business_id = %removed.business_id,
            user_id = %removed.user_id,
            "Staff member removed"
        );
        Ok(())
    }
}
