//! 内存存储（测试与本地演示用）
//!
//! 与 Postgres 表结构保持一致：邮箱唯一、每个用户最多一条员工关系、级联删除。
//! 多步写操作在表的副本上执行，全部成功后才替换回去。

use super::{DirectoryStore, ResourceStore, ScopedRecord};
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
        user::{Role, User},
    },
    scope::{Owner, ResourceKind, ScopeFilter},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// 注入到多步写操作中的一次性故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// remove_staff：删除关系之后、重置角色之前失败
    AfterStaffUnlink,
    /// add_staff：写入用户之后、写入关系之前失败
    AfterStaffUserInsert,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    businesses: BTreeMap<Uuid, Business>,
    staff: BTreeMap<Uuid, BusinessStaff>,
    properties: BTreeMap<Uuid, Property>,
    buildings: BTreeMap<Uuid, Building>,
    zones: BTreeMap<Uuid, Zone>,
    cameras: BTreeMap<Uuid, Camera>,
    departments: BTreeMap<Uuid, Department>,
    alert_rules: BTreeMap<Uuid, AlertRule>,
    notes: BTreeMap<Uuid, Note>,
    credentials: BTreeMap<Uuid, VtApiCredential>,
}

impl Tables {
    /// `kind` 表中 `id` 行的归属列值
    fn owner_ref_of(&self, kind: ResourceKind, id: Uuid) -> Option<Uuid> {
        match kind {
            ResourceKind::BusinessStaff => self.staff.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Property => self.properties.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Building => self.buildings.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Zone => self.zones.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Camera => self.cameras.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Department => self.departments.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::AlertRule => self.alert_rules.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::Note => self.notes.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::VtCredential => self.credentials.get(&id).map(ScopedRecord::owner_ref),
            ResourceKind::User | ResourceKind::Business => None,
        }
    }

    /// 沿归属路径向上查找业务；悬空引用返回 None
    fn business_of(&self, kind: ResourceKind, owner_ref: Uuid) -> Option<Uuid> {
        match kind.ownership_link()?.owner {
            Owner::Business => Some(owner_ref),
            Owner::Parent(parent) => {
                let next = self.owner_ref_of(parent, owner_ref)?;
                self.business_of(parent, next)
            }
        }
    }

    fn admits<T: ScopedRecord>(&self, row: &T, filter: &ScopeFilter) -> bool {
        filter.admits(self.business_of(T::KIND, row.owner_ref()))
    }

    fn parent_exists(&self, kind: ResourceKind, owner_ref: Uuid) -> bool {
        match kind.ownership_link().map(|link| link.owner) {
            Some(Owner::Business) => self.businesses.contains_key(&owner_ref),
            Some(Owner::Parent(parent)) => self.owner_ref_of(parent, owner_ref).is_some(),
            None => false,
        }
    }

    fn insert_user(&mut self, user: &User) -> Result<(), AppError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Email already registered"));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn insert_staff_link(&mut self, link: &BusinessStaff) -> Result<(), AppError> {
        if self.staff.values().any(|s| s.user_id == link.user_id) {
            return Err(AppError::conflict("User is already assigned to a business"));
        }
        if !self.users.contains_key(&link.user_id) {
            return Err(AppError::internal_error("staff link references a missing user"));
        }
        self.staff.insert(link.id, link.clone());
        Ok(())
    }

    fn remove_department(&mut self, id: Uuid) -> bool {
        if self.departments.remove(&id).is_none() {
            return false;
        }
        for link in self.staff.values_mut() {
            if link.department_id == Some(id) {
                link.department_id = None;
            }
        }
        true
    }

    fn remove_zone(&mut self, id: Uuid) -> bool {
        if self.zones.remove(&id).is_none() {
            return false;
        }
        self.cameras.retain(|_, c| c.zone_id != id);
        for rule in self.alert_rules.values_mut() {
            if rule.zone_id == Some(id) {
                rule.zone_id = None;
            }
        }
        true
    }

    fn remove_building(&mut self, id: Uuid) -> bool {
        if self.buildings.remove(&id).is_none() {
            return false;
        }
        for zone in self.zones.values_mut() {
            if zone.building_id == Some(id) {
                zone.building_id = None;
            }
        }
        true
    }

    fn remove_property(&mut self, id: Uuid) -> bool {
        if self.properties.remove(&id).is_none() {
            return false;
        }
        self.buildings.retain(|_, b| b.property_id != id);
        self.notes.retain(|_, n| n.property_id != id);
        let zones: Vec<Uuid> = self
            .zones
            .values()
            .filter(|z| z.property_id == id)
            .map(|z| z.id)
            .collect();
        for zone in zones {
            self.remove_zone(zone);
        }
        true
    }

    fn is_demo_user(&self, user_id: Uuid, marker: &str) -> bool {
        self.users
            .get(&user_id)
            .map(|u| u.is_demo(marker))
            .unwrap_or(false)
    }
}

/// 每种记录对应的表
trait MemoryRecord: ScopedRecord {
    fn rows(tables: &Tables) -> &BTreeMap<Uuid, Self>;

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<Uuid, Self>;

    fn created_at(&self) -> DateTime<Utc>;

    /// 删除一行，级联规则与数据库一致
    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        Self::rows_mut(tables).remove(&id).is_some()
    }

    /// 主键之外的唯一约束
    fn check_unique(_tables: &Tables, _row: &Self) -> Result<(), AppError> {
        Ok(())
    }
}

macro_rules! table_access {
    ($field:ident) => {
        fn rows(tables: &Tables) -> &BTreeMap<Uuid, Self> {
            &tables.$field
        }

        fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<Uuid, Self> {
            &mut tables.$field
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    };
}

impl MemoryRecord for BusinessStaff {
    table_access!(staff);

    fn check_unique(tables: &Tables, row: &Self) -> Result<(), AppError> {
        if tables
            .staff
            .values()
            .any(|s| s.user_id == row.user_id && s.id != row.id)
        {
            return Err(AppError::conflict("User is already assigned to a business"));
        }
        Ok(())
    }
}

impl MemoryRecord for Property {
    table_access!(properties);

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_property(id)
    }
}

impl MemoryRecord for Building {
    table_access!(buildings);

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_building(id)
    }
}

impl MemoryRecord for Zone {
    table_access!(zones);

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_zone(id)
    }
}

impl MemoryRecord for Camera {
    table_access!(cameras);
}

impl MemoryRecord for Department {
    table_access!(departments);

    fn remove(tables: &mut Tables, id: Uuid) -> bool {
        tables.remove_department(id)
    }
}

impl MemoryRecord for AlertRule {
    table_access!(alert_rules);
}

impl MemoryRecord for Note {
    table_access!(notes);
}

impl MemoryRecord for VtApiCredential {
    table_access!(credentials);

    fn check_unique(tables: &Tables, row: &Self) -> Result<(), AppError> {
        if tables
            .credentials
            .values()
            .any(|c| c.key_prefix == row.key_prefix && c.id != row.id)
        {
            return Err(AppError::conflict("Credential key prefix already in use"));
        }
        Ok(())
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fault: Mutex<Option<FaultPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为下一次到达 `point` 的写操作设置一次性故障
    pub async fn fail_at(&self, point: FaultPoint) {
        *self.fault.lock().await = Some(point);
    }

    async fn trip(&self, point: FaultPoint) -> Result<(), AppError> {
        let mut fault = self.fault.lock().await;
        if *fault == Some(point) {
            *fault = None;
            tracing::warn!(?point, "Injected store fault");
            return Err(AppError::internal_error("injected store fault"));
        }
        Ok(())
    }

    async fn list_rows<T: MemoryRecord>(
        &self,
        filter: &ScopeFilter,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let tables = self.tables.read().await;
        let mut rows: Vec<T> = T::rows(&tables)
            .values()
            .filter(|row| parent_id.map_or(true, |parent| row.owner_ref() == parent))
            .filter(|row| tables.admits(*row, filter))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at(), row.id()));
        Ok(rows)
    }

    async fn fetch_row<T: MemoryRecord>(
        &self,
        id: Uuid,
        filter: &ScopeFilter,
    ) -> Result<Option<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let tables = self.tables.read().await;
        Ok(T::rows(&tables)
            .get(&id)
            .filter(|row| tables.admits(*row, filter))
            .cloned())
    }

    async fn count_rows<T: MemoryRecord>(&self, filter: &ScopeFilter) -> Result<i64, AppError> {
        filter.ensure_kind(T::KIND)?;
        let tables = self.tables.read().await;
        let count = T::rows(&tables)
            .values()
            .filter(|row| tables.admits(*row, filter))
            .count();
        Ok(count as i64)
    }

    async fn insert_row<T: MemoryRecord>(&self, row: &T) -> Result<T, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.parent_exists(T::KIND, row.owner_ref()) {
            return Err(AppError::internal_error("foreign key violation on insert"));
        }
        T::check_unique(&tables, row)?;
        if T::rows(&tables).contains_key(&row.id()) {
            return Err(AppError::conflict("Record already exists"));
        }
        T::rows_mut(&mut tables).insert(row.id(), row.clone());
        Ok(row.clone())
    }

    async fn update_row<T: MemoryRecord>(
        &self,
        row: &T,
        filter: &ScopeFilter,
    ) -> Result<Option<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut tables = self.tables.write().await;
        let in_scope = T::rows(&tables)
            .get(&row.id())
            .map(|stored| tables.admits(stored, filter))
            .unwrap_or(false);
        if !in_scope {
            return Ok(None);
        }
        if !tables.parent_exists(T::KIND, row.owner_ref()) {
            return Err(AppError::internal_error("foreign key violation on update"));
        }
        T::check_unique(&tables, row)?;
        T::rows_mut(&mut tables).insert(row.id(), row.clone());
        Ok(Some(row.clone()))
    }

    async fn delete_row<T: MemoryRecord>(
        &self,
        id: Uuid,
        filter: &ScopeFilter,
    ) -> Result<bool, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut tables = self.tables.write().await;
        let in_scope = T::rows(&tables)
            .get(&id)
            .map(|stored| tables.admits(stored, filter))
            .unwrap_or(false);
        if !in_scope {
            return Ok(false);
        }
        Ok(T::remove(&mut tables, id))
    }
}

macro_rules! memory_resource {
    ($($ty:ty),* $(,)?) => {
        $(
            #[async_trait]
            impl ResourceStore<$ty> for MemoryStore {
                async fn list(&self, filter: &ScopeFilter) -> Result<Vec<$ty>, AppError> {
                    self.list_rows(filter, None).await
                }

                async fn list_by_parent(
                    &self,
                    parent_id: Uuid,
                    filter: &ScopeFilter,
                ) -> Result<Vec<$ty>, AppError> {
                    self.list_rows(filter, Some(parent_id)).await
                }

                async fn fetch(
                    &self,
                    id: Uuid,
                    filter: &ScopeFilter,
                ) -> Result<Option<$ty>, AppError> {
                    self.fetch_row(id, filter).await
                }

                async fn count(&self, filter: &ScopeFilter) -> Result<i64, AppError> {
                    self.count_rows::<$ty>(filter).await
                }

                async fn insert(&self, row: &$ty) -> Result<$ty, AppError> {
                    self.insert_row(row).await
                }

                async fn update(
                    &self,
                    row: &$ty,
                    filter: &ScopeFilter,
                ) -> Result<Option<$ty>, AppError> {
                    self.update_row(row, filter).await
                }

                async fn delete(&self, id: Uuid, filter: &ScopeFilter) -> Result<bool, AppError> {
                    self.delete_row::<$ty>(id, filter).await
                }
            }
        )*
    };
}

memory_resource!(
    BusinessStaff,
    Property,
    Building,
    Zone,
    Camera,
    Department,
    AlertRule,
    Note,
    VtApiCredential,
);

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn create_user(&self, user: &User) -> Result<User, AppError> {
        self.tables.write().await.insert_user(user)?;
        Ok(user.clone())
    }

    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        Ok(self.tables.read().await.businesses.get(&id).cloned())
    }

    async fn owned_business(&self, owner_id: Uuid) -> Result<Option<Business>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .businesses
            .values()
            .filter(|b| b.owner_id == owner_id)
            .min_by_key(|b| (b.created_at, b.id))
            .cloned())
    }

    async fn staff_assignment(&self, user_id: Uuid) -> Result<Option<BusinessStaff>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .staff
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn register_owner(&self, owner: &User, business: &Business) -> Result<(), AppError> {
        let mut guard = self.tables.write().await;
        let mut tx = guard.clone();
        tx.insert_user(owner)?;
        tx.businesses.insert(business.id, business.clone());
        *guard = tx;
        Ok(())
    }

    async fn add_staff(
        &self,
        new_user: Option<&User>,
        link: &BusinessStaff,
    ) -> Result<BusinessStaff, AppError> {
        let mut guard = self.tables.write().await;
        let mut tx = guard.clone();
        if let Some(user) = new_user {
            tx.insert_user(user)?;
            self.trip(FaultPoint::AfterStaffUserInsert).await?;
        }
        if !tx.businesses.contains_key(&link.business_id) {
            return Err(AppError::internal_error("staff link references a missing business"));
        }
        tx.insert_staff_link(link)?;
        *guard = tx;
        Ok(link.clone())
    }

    async fn remove_staff(
        &self,
        staff_id: Uuid,
        filter: &ScopeFilter,
    ) -> Result<Option<BusinessStaff>, AppError> {
        filter.ensure_kind(ResourceKind::BusinessStaff)?;
        let mut guard = self.tables.write().await;
        let mut tx = guard.clone();

        let link = match tx.staff.get(&staff_id) {
            Some(link) if tx.admits(link, filter) => link.clone(),
            _ => return Ok(None),
        };
        tx.staff.remove(&staff_id);
        self.trip(FaultPoint::AfterStaffUnlink).await?;

        if let Some(user) = tx.users.get_mut(&link.user_id) {
            user.role = Role::Staff;
            user.updated_at = Utc::now();
        }
        *guard = tx;
        Ok(Some(link))
    }

    async fn count_staff(&self, filter: &ScopeFilter, demo_marker: &str) -> Result<i64, AppError> {
        filter.ensure_kind(ResourceKind::BusinessStaff)?;
        let tables = self.tables.read().await;
        let count = tables
            .staff
            .values()
            .filter(|s| tables.admits(*s, filter))
            .filter(|s| !tables.is_demo_user(s.user_id, demo_marker))
            .count();
        Ok(count as i64)
    }

    async fn list_users(&self, demo_marker: &str) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| !u.is_demo(demo_marker))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn list_businesses(&self, demo_marker: &str) -> Result<Vec<Business>, AppError> {
        let tables = self.tables.read().await;
        let mut businesses: Vec<Business> = tables
            .businesses
            .values()
            .filter(|b| !tables.is_demo_user(b.owner_id, demo_marker))
            .cloned()
            .collect();
        businesses.sort_by_key(|b| (b.created_at, b.id));
        Ok(businesses)
    }

    async fn dashboard_stats(&self, demo_marker: &str) -> Result<DashboardStats, AppError> {
        let tables = self.tables.read().await;
        let mut stats = DashboardStats::default();
        for user in tables.users.values().filter(|u| !u.is_demo(demo_marker)) {
            stats.total_users += 1;
            match user.role {
                Role::Admin => stats.admin_users += 1,
                Role::BusinessOwner => stats.business_owners += 1,
                Role::Staff => stats.staff_members += 1,
            }
        }
        stats.active_businesses = tables
            .businesses
            .values()
            .filter(|b| b.is_active && !tables.is_demo_user(b.owner_id, demo_marker))
            .count() as i64;
        Ok(stats)
    }
}
