//! 数据访问层
//!
//! 只通过 [`Store`] 访问存储，处理器拿不到连接池。
//! 每次带作用域的读写都需要为该记录类型构建的 [`ScopeFilter`]。

pub mod memory_store;
pub mod pg_store;

pub use memory_store::{FaultPoint, MemoryStore};
pub use pg_store::PgStore;

use crate::{
    error::AppError,
    models::{
        alert_rule::AlertRule,
        business::Business,
        credential::VtApiCredential,
        dashboard::DashboardStats,
        department::Department,
        note::Note,
        site::{Building, Camera, Property, Zone},
        staff::BusinessStaff,
        user::User,
    },
    scope::{ResourceKind, ScopeFilter},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 沿归属路径属于某个业务的记录
pub trait ScopedRecord: Clone + PartialEq + Send + Sync + Unpin + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> Uuid;

    /// 第一跳归属列的值（`business_id` / `property_id` / `zone_id`）
    fn owner_ref(&self) -> Uuid;

    fn touch(&mut self, at: DateTime<Utc>);
}

/// 单一记录类型的作用域 CRUD
#[async_trait]
pub trait ResourceStore<T: ScopedRecord>: Send + Sync {
    async fn list(&self, filter: &ScopeFilter) -> Result<Vec<T>, AppError>;

    /// 第一跳归属列等于 `parent_id` 的记录，同样受 filter 约束
    async fn list_by_parent(&self, parent_id: Uuid, filter: &ScopeFilter)
        -> Result<Vec<T>, AppError>;

    async fn fetch(&self, id: Uuid, filter: &ScopeFilter) -> Result<Option<T>, AppError>;

    async fn count(&self, filter: &ScopeFilter) -> Result<i64, AppError>;

    async fn insert(&self, row: &T) -> Result<T, AppError>;

    /// 仅当已存储的同 id 记录通过 filter 时写入
    async fn update(&self, row: &T, filter: &ScopeFilter) -> Result<Option<T>, AppError>;

    /// 仅当已存储记录通过 filter 时删除
    async fn delete(&self, id: Uuid, filter: &ScopeFilter) -> Result<bool, AppError>;
}

/// 用户、业务与员工关系，以及必须在单个事务中完成的多步写操作
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;

    async fn create_user(&self, user: &User) -> Result<User, AppError>;

    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, AppError>;

    /// `owner_id` 名下最早创建的业务
    async fn owned_business(&self, owner_id: Uuid) -> Result<Option<Business>, AppError>;

    async fn staff_assignment(&self, user_id: Uuid) -> Result<Option<BusinessStaff>, AppError>;

    /// 原子写入所有者与业务
    async fn register_owner(&self, owner: &User, business: &Business) -> Result<(), AppError>;

    /// 原子写入新用户（如有）与员工关系
    async fn add_staff(
        &self,
        new_user: Option<&User>,
        link: &BusinessStaff,
    ) -> Result<BusinessStaff, AppError>;

    /// 同一事务内删除员工关系并把角色重置为 STAFF。
    /// 返回被删除的关系；不在作用域内时返回 None。
    async fn remove_staff(
        &self,
        staff_id: Uuid,
        filter: &ScopeFilter,
    ) -> Result<Option<BusinessStaff>, AppError>;

    /// 作用域内、非演示账号的员工关系数
    async fn count_staff(&self, filter: &ScopeFilter, demo_marker: &str)
        -> Result<i64, AppError>;

    async fn list_users(&self, demo_marker: &str) -> Result<Vec<User>, AppError>;

    async fn list_businesses(&self, demo_marker: &str) -> Result<Vec<Business>, AppError>;

    async fn dashboard_stats(&self, demo_marker: &str) -> Result<DashboardStats, AppError>;
}

/// API 需要的全部存储能力
pub trait Store:
    DirectoryStore
    + ResourceStore<BusinessStaff>
    + ResourceStore<Property>
    + ResourceStore<Building>
    + ResourceStore<Zone>
    + ResourceStore<Camera>
    + ResourceStore<Department>
    + ResourceStore<AlertRule>
    + ResourceStore<Note>
    + ResourceStore<VtApiCredential>
{
}

impl<S> Store for S where
    S: DirectoryStore
        + ResourceStore<BusinessStaff>
        + ResourceStore<Property>
        + ResourceStore<Building>
        + ResourceStore<Zone>
        + ResourceStore<Camera>
        + ResourceStore<Department>
        + ResourceStore<AlertRule>
        + ResourceStore<Note>
        + ResourceStore<VtApiCredential>
{
}
