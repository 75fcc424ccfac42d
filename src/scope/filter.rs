//! 由 [`AccessContext`] 派生、与存储无关的行过滤器
//!
//! 每个过滤器针对一种 [`ResourceKind`]，携带三种规则之一。
//! 存储负责渲染（Postgres 用子查询，内存存储沿外键查找），
//! 并且必须拒绝为其他类型构建的过滤器。

use super::{kind::ResourceKind, resolver::AccessContext};
use crate::error::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRule {
    /// 平台管理员：不做行级限制
    Unrestricted,
    /// 只保留归属路径终点为该业务的行
    Business(Uuid),
    /// 不匹配任何行，用于没有业务的非管理员
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeFilter {
    kind: ResourceKind,
    rule: ScopeRule,
}

impl ScopeFilter {
    /// 按 `ctx` 的视角为 `kind` 构建过滤器
    ///
    /// 失败即关闭：没有业务的非管理员得到 [`ScopeRule::Deny`]，
    /// 绝不会是不受限的过滤器。没有归属路径的类型属于编程错误。
    pub fn for_kind(ctx: &AccessContext, kind: ResourceKind) -> Result<Self, AppError> {
        let rule = if ctx.is_admin() {
            ScopeRule::Unrestricted
        } else {
            match ctx.business_id {
                Some(business_id) => ScopeRule::Business(business_id),
                None => ScopeRule::Deny,
            }
        };
        Self::new(kind, rule)
    }

    /// 固定到某个业务，与调用者无关
    pub fn for_business(kind: ResourceKind, business_id: Uuid) -> Result<Self, AppError> {
        Self::new(kind, ScopeRule::Business(business_id))
    }

    pub fn unrestricted(kind: ResourceKind) -> Result<Self, AppError> {
        Self::new(kind, ScopeRule::Unrestricted)
    }

    fn new(kind: ResourceKind, rule: ScopeRule) -> Result<Self, AppError> {
        if kind.ownership_link().is_none() {
            tracing::error!(kind = %kind, "Scope filter requested for kind without ownership path");
            return Err(AppError::Internal(format!("no ownership path for {}", kind)));
        }
        Ok(Self { kind, rule })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn rule(&self) -> ScopeRule {
        self.rule
    }

    pub fn is_deny(&self) -> bool {
        self.rule == ScopeRule::Deny
    }

    /// 存储渲染前的类型检查
    pub fn ensure_kind(&self, kind: ResourceKind) -> Result<(), AppError> {
        if self.kind != kind {
            tracing::error!(expected = %kind, actual = %self.kind, "Scope filter kind mismatch");
            return Err(AppError::Internal(format!(
                "scope filter for {} used on {}",
                self.kind, kind
            )));
        }
        Ok(())
    }

    /// 相同规则，换到另一种类型（例如查父记录）
    pub fn retarget(&self, kind: ResourceKind) -> Result<Self, AppError> {
        Self::new(kind, self.rule)
    }

    /// 对已知所属业务的行求值
    pub fn admits(&self, owning_business: Option<Uuid>) -> bool {
        match self.rule {
            ScopeRule::Unrestricted => true,
            ScopeRule::Deny => false,
            ScopeRule::Business(id) => owning_business == Some(id),
        }
    }
}
