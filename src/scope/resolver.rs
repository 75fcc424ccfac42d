//! 角色/归属解析：主体 -> 业务作用域
//!
//! 每个请求重新计算，不做缓存，员工调岗在下一个请求即生效。

use super::kind::ResourceKind;
use crate::{
    error::AppError,
    models::user::{Principal, Role},
    repository::{DirectoryStore, Store},
};
use std::sync::Arc;
use uuid::Uuid;

/// 请求级访问上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    pub principal: Principal,
    /// 所有者的业务或员工的雇主业务；管理员为 None
    pub business_id: Option<Uuid>,
}

impl AccessContext {
    /// 管理员可以显式绕过作用域（能力，而不是缺少作用域）
    pub fn is_admin(&self) -> bool {
        self.principal.role == Role::Admin
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if !self.is_admin() {
            return Err(AppError::forbidden("Administrator access required"));
        }
        Ok(())
    }

    /// 写权限检查（在任何查询之前执行）
    pub fn ensure_can_write(&self, kind: ResourceKind) -> Result<(), AppError> {
        if !kind.write_policy().allows(self.role()) {
            tracing::warn!(
                user_id = %self.principal.id,
                role = %self.role(),
                kind = %kind,
                "Write denied by role policy"
            );
            return Err(AppError::forbidden("Insufficient role for this operation"));
        }
        Ok(())
    }

    /// 确定新记录归属的业务
    ///
    /// 非管理员使用解析出的业务，指定其他业务返回 Forbidden；
    /// 管理员必须显式给出 business_id。
    pub fn business_for_create(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        if self.is_admin() {
            return requested.ok_or_else(|| {
                AppError::validation("business_id: required for platform administrators")
            });
        }

        let business_id = self
            .business_id
            .ok_or_else(|| AppError::forbidden("No business associated with this account"))?;

        match requested {
            Some(other) if other != business_id => {
                tracing::warn!(
                    user_id = %self.principal.id,
                    requested = %other,
                    "Create targeted a foreign business"
                );
                Err(AppError::forbidden("Cannot create resources for another business"))
            }
            _ => Ok(business_id),
        }
    }
}

/// 角色/归属解析器
#[derive(Clone)]
pub struct ScopeResolver {
    store: Arc<dyn Store>,
}

impl ScopeResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// 解析主体所属业务，所有权优先于员工关系
    pub async fn resolve(&self, principal: Principal) -> Result<AccessContext, AppError> {
        if principal.role == Role::Admin {
            return Ok(AccessContext {
                principal,
                business_id: None,
            });
        }

        let owned = self.store.owned_business(principal.id).await?;

        let business_id = match (owned, principal.role) {
            (Some(business), role) => {
                if role == Role::Staff {
                    tracing::warn!(
                        user_id = %principal.id,
                        business_id = %business.id,
                        "Staff principal also owns a business, ownership takes precedence"
                    );
                }
                Some(business.id)
            }
            (None, Role::Staff) => self
                .store
                .staff_assignment(principal.id)
                .await?
                .map(|link| link.business_id),
            (None, _) => None,
        };

        if business_id.is_none() {
            tracing::debug!(
                user_id = %principal.id,
                role = %principal.role,
                "No business resolved for principal"
            );
        }

        Ok(AccessContext {
            principal,
            business_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{business::Business, staff::BusinessStaff, user::User},
        repository::MemoryStore,
    };

    async fn owner_with_business(store: &MemoryStore, email: &str, role: Role) -> (User, Business) {
        let owner = User::new(email, "Owner", "hash".to_string(), role);
        let business = Business::new("Acme", owner.id);
        store.register_owner(&owner, &business).await.unwrap();
        (owner, business)
    }

    #[tokio::test]
    async fn test_owner_resolves_to_owned_business() {
        let store = Arc::new(MemoryStore::new());
        let (owner, business) = owner_with_business(&store, "o@example.com", Role::BusinessOwner).await;

        let ctx = ScopeResolver::new(store).resolve(owner.principal()).await.unwrap();
        assert_eq!(ctx.business_id, Some(business.id));
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn test_staff_resolves_to_employer() {
        let store = Arc::new(MemoryStore::new());
        let (_, business) = owner_with_business(&store, "o@example.com", Role::BusinessOwner).await;
        let staff = User::new("s@example.com", "Staff", "hash".to_string(), Role::Staff);
        store
            .add_staff(Some(&staff), &BusinessStaff::new(business.id, staff.id, None, None))
            .await
            .unwrap();

        let ctx = ScopeResolver::new(store).resolve(staff.principal()).await.unwrap();
        assert_eq!(ctx.business_id, Some(business.id));
    }

    #[tokio::test]
    async fn test_ownership_wins_over_assignment() {
        let store = Arc::new(MemoryStore::new());
        let (_, employer) = owner_with_business(&store, "o@example.com", Role::BusinessOwner).await;
        let (dual, owned) = owner_with_business(&store, "dual@example.com", Role::Staff).await;
        store
            .add_staff(None, &BusinessStaff::new(employer.id, dual.id, None, None))
            .await
            .unwrap();

        let ctx = ScopeResolver::new(store).resolve(dual.principal()).await.unwrap();
        assert_eq!(ctx.business_id, Some(owned.id));
    }

    #[tokio::test]
    async fn test_unassigned_and_admin_have_no_business() {
        let store = Arc::new(MemoryStore::new());
        let resolver = ScopeResolver::new(store);

        let staff = User::new("s@example.com", "Staff", "hash".to_string(), Role::Staff);
        let ctx = resolver.resolve(staff.principal()).await.unwrap();
        assert_eq!(ctx.business_id, None);
        assert!(ctx.business_for_create(None).is_err());

        let admin = User::new("a@example.com", "Admin", "hash".to_string(), Role::Admin);
        let ctx = resolver.resolve(admin.principal()).await.unwrap();
        assert_eq!(ctx.business_id, None);
        assert!(ctx.is_admin());
        assert!(matches!(ctx.business_for_create(None), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_foreign_business_is_forbidden() {
        let ctx = AccessContext {
            principal: Principal {
                id: Uuid::new_v4(),
                email: "o@example.com".to_string(),
                role: Role::BusinessOwner,
            },
            business_id: Some(Uuid::new_v4()),
        };
        assert!(matches!(
            ctx.business_for_create(Some(Uuid::new_v4())),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(ctx.business_for_create(ctx.business_id).ok(), ctx.business_id);
        assert!(ctx.ensure_can_write(ResourceKind::Zone).is_ok());
    }
}
