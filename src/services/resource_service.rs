//! 各租户资源共用的作用域 CRUD
//!
//! 每个操作在访问存储前都先为记录类型构建 [`ScopeFilter`]，不存在未过滤的调用路径。

use crate::{
    error::AppError,
    repository::{DirectoryStore, ResourceStore, ScopedRecord, Store},
    scope::{AccessContext, ResourceKind, ScopeFilter},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn Store>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// 角色策略 + 作用域存在性，在任何查询之前执行
    pub fn authorize_create(&self, ctx: &AccessContext, kind: ResourceKind) -> Result<(), AppError> {
        ctx.ensure_can_write(kind)?;
        if !ctx.is_admin() && ctx.business_id.is_none() {
            return Err(AppError::forbidden("No business associated with this account"));
        }
        Ok(())
    }

    pub async fn list<T>(&self, ctx: &AccessContext) -> Result<Vec<T>, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        if filter.is_deny() {
            return Ok(Vec::new());
        }
        <dyn Store as ResourceStore<T>>::list(&*self.store, &filter).await
    }

    /// 某个父记录下、作用域内的子记录
    pub async fn list_by_parent<T>(&self, ctx: &AccessContext, parent_id: Uuid) -> Result<Vec<T>, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        if filter.is_deny() {
            return Ok(Vec::new());
        }
        <dyn Store as ResourceStore<T>>::list_by_parent(&*self.store, parent_id, &filter).await
    }

    pub async fn count<T>(&self, ctx: &AccessContext) -> Result<i64, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        <dyn Store as ResourceStore<T>>::count(&*self.store, &filter).await
    }

    /// 作用域外与不存在返回相同结果
    pub async fn get<T>(&self, ctx: &AccessContext, id: Uuid) -> Result<T, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        self.fetch_with(&filter, id).await
    }

    /// 先检查角色策略，再按作用域查找待修改的行
    pub async fn get_for_write<T>(&self, ctx: &AccessContext, id: Uuid) -> Result<T, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        ctx.ensure_can_write(T::KIND)?;
        self.get(ctx, id).await
    }

    /// 用显式过滤器查找，例如固定到子记录业务的父记录
    pub async fn fetch_with<T>(&self, filter: &ScopeFilter, id: Uuid) -> Result<T, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        <dyn Store as ResourceStore<T>>::fetch(&*self.store, id, filter)
            .await?
            .ok_or_else(|| AppError::not_found(T::KIND.label()))
    }

    /// 属于 `business_id` 的父记录，其余一律 NotFound
    pub async fn parent_in_business<P>(&self, business_id: Uuid, id: Uuid) -> Result<P, AppError>
    where
        P: ScopedRecord,
        dyn Store: ResourceStore<P>,
    {
        let filter = ScopeFilter::for_business(P::KIND, business_id)?;
        self.fetch_with(&filter, id).await
    }

    pub async fn create<T>(&self, row: T) -> Result<T, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        let created = <dyn Store as ResourceStore<T>>::insert(&*self.store, &row).await?;
        tracing::info!(kind = %T::KIND, id = %created.id(), "Record created");
        Ok(created)
    }

    /// 用 `merged` 覆盖 `stored`（来自 [`Self::get_for_write`]），没有变化时原样返回
    pub async fn save<T>(&self, ctx: &AccessContext, stored: T, mut merged: T) -> Result<T, AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        if merged == stored {
            tracing::debug!(kind = %T::KIND, id = %stored.id(), "Update is a no-op");
            return Ok(stored);
        }

        merged.touch(Utc::now());
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        let updated = <dyn Store as ResourceStore<T>>::update(&*self.store, &merged, &filter)
            .await?
            .ok_or_else(|| AppError::not_found(T::KIND.label()))?;

        tracing::info!(kind = %T::KIND, id = %updated.id(), "Record updated");
        Ok(updated)
    }

    pub async fn delete<T>(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError>
    where
        T: ScopedRecord,
        dyn Store: ResourceStore<T>,
    {
        ctx.ensure_can_write(T::KIND)?;
        let filter = ScopeFilter::for_kind(ctx, T::KIND)?;
        if !<dyn Store as ResourceStore<T>>::delete(&*self.store, id, &filter).await? {
            return Err(AppError::not_found(T::KIND.label()));
        }

        tracing::info!(kind = %T::KIND, id = %id, "Record deleted");
        Ok(())
    }

    /// 新建直属记录（部门、物业等）归属的业务，管理员必须指定已存在的业务
    pub async fn target_business(
        &self,
        ctx: &AccessContext,
        requested: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        let business_id = ctx.business_for_create(requested)?;
        if ctx.is_admin() && self.store.find_business(business_id).await?.is_none() {
            return Err(AppError::not_found("Business"));
        }
        Ok(business_id)
    }
}
