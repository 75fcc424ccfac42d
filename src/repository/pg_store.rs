//! Postgres 存储
//!
//! 作用域过滤直接渲染进 SQL 语句，作用域外的行不会被读取、更新或删除。

use super::{DirectoryStore, ResourceStore, ScopedRecord};
use crate::{
    db,
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
    scope::{Owner, ResourceKind, ScopeFilter, ScopeRule},
};
use async_trait::async_trait;
use sqlx::{
    postgres::PgRow, query_builder::Separated, FromRow, PgPool, Postgres, QueryBuilder, Row,
};
use uuid::Uuid;

/// 作用域表的列布局
pub trait PgRecord: ScopedRecord + for<'r> FromRow<'r, PgRow> {
    /// 除 `id` 外的所有列，按绑定顺序
    const COLUMNS: &'static [&'static str];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// 把 `filter` 对应的行谓词追加到 `qb`
pub fn push_scope(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &ScopeFilter,
) -> Result<(), AppError> {
    match filter.rule() {
        ScopeRule::Unrestricted => {
            qb.push("TRUE");
            Ok(())
        }
        ScopeRule::Deny => {
            qb.push("FALSE");
            Ok(())
        }
        ScopeRule::Business(business_id) => push_ownership(qb, filter.kind(), business_id),
    }
}

fn push_ownership(
    qb: &mut QueryBuilder<'_, Postgres>,
    kind: ResourceKind,
    business_id: Uuid,
) -> Result<(), AppError> {
    let link = kind
        .ownership_link()
        .ok_or_else(|| AppError::Internal(format!("no ownership path for {}", kind)))?;

    match link.owner {
        Owner::Business => {
            qb.push(link.column).push(" = ").push_bind(business_id);
        }
        Owner::Parent(parent) => {
            qb.push(link.column)
                .push(" IN (SELECT id FROM ")
                .push(parent.table())
                .push(" WHERE ");
            push_ownership(qb, parent, business_id)?;
            qb.push(")");
        }
    }
    Ok(())
}

/// Postgres 存储
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl<T: PgRecord> ResourceStore<T> for PgStore {
    async fn list(&self, filter: &ScopeFilter) -> Result<Vec<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE ", T::KIND.table()));
        push_scope(&mut qb, filter)?;
        qb.push(" ORDER BY created_at, id");

        let rows = qb.build_query_as::<T>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn list_by_parent(&self, parent_id: Uuid, filter: &ScopeFilter) -> Result<Vec<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let link = T::KIND
            .ownership_link()
            .ok_or_else(|| AppError::Internal(format!("no ownership path for {}", T::KIND)))?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT * FROM {} WHERE {} = ",
            T::KIND.table(),
            link.column
        ));
        qb.push_bind(parent_id).push(" AND (");
        push_scope(&mut qb, filter)?;
        qb.push(") ORDER BY created_at, id");

        let rows = qb.build_query_as::<T>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn fetch(&self, id: Uuid, filter: &ScopeFilter) -> Result<Option<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {} WHERE id = ", T::KIND.table()));
        qb.push_bind(id).push(" AND (");
        push_scope(&mut qb, filter)?;
        qb.push(")");

        let row = qb.build_query_as::<T>().fetch_optional(&self.db).await?;
        Ok(row)
    }

    async fn count(&self, filter: &ScopeFilter) -> Result<i64, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE ", T::KIND.table()));
        push_scope(&mut qb, filter)?;

        let count: i64 = qb.build_query_scalar().fetch_one(&self.db).await?;
        Ok(count)
    }

    async fn insert(&self, row: &T) -> Result<T, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (id, {}) VALUES (",
            T::KIND.table(),
            T::COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            values.push_bind(row.id());
            row.push_values(&mut values);
        }
        qb.push(") RETURNING *");

        qb.build_query_as::<T>()
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(e, &format!("{} already exists", T::KIND.label()))
            })
    }

    async fn update(&self, row: &T, filter: &ScopeFilter) -> Result<Option<T>, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET ({}) = ROW(",
            T::KIND.table(),
            T::COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            row.push_values(&mut values);
        }
        qb.push(") WHERE id = ").push_bind(row.id()).push(" AND (");
        push_scope(&mut qb, filter)?;
        qb.push(") RETURNING *");

        qb.build_query_as::<T>()
            .fetch_optional(&self.db)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(e, &format!("{} already exists", T::KIND.label()))
            })
    }

    async fn delete(&self, id: Uuid, filter: &ScopeFilter) -> Result<bool, AppError> {
        filter.ensure_kind(T::KIND)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE id = ", T::KIND.table()));
        qb.push_bind(id).push(" AND (");
        push_scope(&mut qb, filter)?;
        qb.push(")");

        let result = qb.build().execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        db::ping(&self.db)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.db)
            .await?;

        Ok(users)
    }

    async fn create_user(&self, user: &User) -> Result<User, AppError> {
        insert_user(&self.db, user).await
    }

    async fn find_business(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(business)
    }

    async fn owned_business(&self, owner_id: Uuid) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE owner_id = $1 ORDER BY created_at, id LIMIT 1",
        )
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(business)
    }

    async fn staff_assignment(&self, user_id: Uuid) -> Result<Option<BusinessStaff>, AppError> {
        let link =
            sqlx::query_as::<_, BusinessStaff>("SELECT * FROM business_staff WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(link)
    }

    async fn register_owner(&self, owner: &User, business: &Business) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;

        insert_user(&mut *tx, owner).await?;

        sqlx::query(
            r#"
            INSERT INTO businesses (id, name, owner_id, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(business.id)
        .bind(&business.name)
        .bind(business.owner_id)
        .bind(business.is_active)
        .bind(business.created_at)
        .bind(business.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn add_staff(
        &self,
        new_user: Option<&User>,
        link: &BusinessStaff,
    ) -> Result<BusinessStaff, AppError> {
        let mut tx = self.db.begin().await?;

        if let Some(user) = new_user {
            insert_user(&mut *tx, user).await?;
        }

        let created = sqlx::query_as::<_, BusinessStaff>(
            r#"
            INSERT INTO business_staff
                (id, business_id, user_id, department_id, position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(link.id)
        .bind(link.business_id)
        .bind(link.user_id)
        .bind(link.department_id)
        .bind(&link.position)
        .bind(link.created_at)
        .bind(link.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "User is already assigned to a business"))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn remove_staff(
        &self,
        staff_id: Uuid,
        filter: &ScopeFilter,
    ) -> Result<Option<BusinessStaff>, AppError> {
        filter.ensure_kind(ResourceKind::BusinessStaff)?;
        let mut tx = self.db.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM business_staff WHERE id = ");
        qb.push_bind(staff_id).push(" AND (");
        push_scope(&mut qb, filter)?;
        qb.push(") RETURNING *");

        let removed = qb
            .build_query_as::<BusinessStaff>()
            .fetch_optional(&mut *tx)
            .await?;

        let Some(link) = removed else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(link.user_id)
            .bind(Role::Staff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(link))
    }

    async fn count_staff(&self, filter: &ScopeFilter, demo_marker: &str) -> Result<i64, AppError> {
        filter.ensure_kind(ResourceKind::BusinessStaff)?;
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM business_staff WHERE (");
        push_scope(&mut qb, filter)?;
        qb.push(") AND user_id IN (SELECT id FROM users WHERE strpos(email, ")
            .push_bind(demo_marker.to_string())
            .push(") = 0)");

        let count: i64 = qb.build_query_scalar().fetch_one(&self.db).await?;
        Ok(count)
    }

    async fn list_users(&self, demo_marker: &str) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE strpos(email, $1) = 0 ORDER BY created_at, id",
        )
        .bind(demo_marker)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn list_businesses(&self, demo_marker: &str) -> Result<Vec<Business>, AppError> {
        let businesses = sqlx::query_as::<_, Business>(
            r#"
            SELECT b.* FROM businesses b
            JOIN users u ON u.id = b.owner_id
            WHERE strpos(u.email, $1) = 0
            ORDER BY b.created_at, b.id
            "#,
        )
        .bind(demo_marker)
        .fetch_all(&self.db)
        .await?;

        Ok(businesses)
    }

    async fn dashboard_stats(&self, demo_marker: &str) -> Result<DashboardStats, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_users,
                COUNT(*) FILTER (WHERE role = 'BUSINESS_OWNER') AS business_owners,
                COUNT(*) FILTER (WHERE role = 'STAFF') AS staff_members,
                COUNT(*) FILTER (WHERE role = 'ADMIN') AS admin_users,
                (
                    SELECT COUNT(*) FROM businesses b
                    JOIN users o ON o.id = b.owner_id
                    WHERE b.is_active AND strpos(o.email, $1) = 0
                ) AS active_businesses
            FROM users
            WHERE strpos(email, $1) = 0
            "#,
        )
        .bind(demo_marker)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardStats {
            total_users: row.try_get("total_users")?,
            business_owners: row.try_get("business_owners")?,
            staff_members: row.try_get("staff_members")?,
            admin_users: row.try_get("admin_users")?,
            active_businesses: row.try_get("active_businesses")?,
        })
    }
}

async fn insert_user<'e, E>(executor: E, user: &User) -> Result<User, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "Email already registered"))
}

// ==================== 列布局 ====================

impl PgRecord for BusinessStaff {
    const COLUMNS: &'static [&'static str] = &[
        "business_id",
        "user_id",
        "department_id",
        "position",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.business_id)
            .push_bind(self.user_id)
            .push_bind(self.department_id)
            .push_bind(self.position.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Property {
    const COLUMNS: &'static [&'static str] = &[
        "business_id",
        "name",
        "address",
        "description",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.business_id)
            .push_bind(self.name.clone())
            .push_bind(self.address.clone())
            .push_bind(self.description.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Building {
    const COLUMNS: &'static [&'static str] =
        &["property_id", "name", "floors", "created_at", "updated_at"];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.property_id)
            .push_bind(self.name.clone())
            .push_bind(self.floors)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Zone {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "building_id",
        "name",
        "description",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.property_id)
            .push_bind(self.building_id)
            .push_bind(self.name.clone())
            .push_bind(self.description.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Camera {
    const COLUMNS: &'static [&'static str] = &[
        "zone_id",
        "name",
        "stream_url",
        "status",
        "model",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.zone_id)
            .push_bind(self.name.clone())
            .push_bind(self.stream_url.clone())
            .push_bind(self.status)
            .push_bind(self.model.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Department {
    const COLUMNS: &'static [&'static str] = &[
        "business_id",
        "name",
        "description",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.business_id)
            .push_bind(self.name.clone())
            .push_bind(self.description.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for AlertRule {
    const COLUMNS: &'static [&'static str] = &[
        "business_id",
        "zone_id",
        "name",
        "trigger",
        "severity",
        "threshold",
        "notify_email",
        "is_active",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.business_id)
            .push_bind(self.zone_id)
            .push_bind(self.name.clone())
            .push_bind(self.trigger)
            .push_bind(self.severity)
            .push_bind(self.threshold)
            .push_bind(self.notify_email.clone())
            .push_bind(self.is_active)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for Note {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "author_id",
        "content",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.property_id)
            .push_bind(self.author_id)
            .push_bind(self.content.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

impl PgRecord for VtApiCredential {
    const COLUMNS: &'static [&'static str] = &[
        "business_id",
        "label",
        "key_prefix",
        "key_hash",
        "created_by",
        "created_at",
        "updated_at",
    ];

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.business_id)
            .push_bind(self.label.clone())
            .push_bind(self.key_prefix.clone())
            .push_bind(self.key_hash.clone())
            .push_bind(self.created_by)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filter: &ScopeFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE ");
        push_scope(&mut qb, filter).unwrap();
        qb.sql().to_string()
    }

    #[test]
    fn test_camera_scope_sql() {
        let filter = ScopeFilter::for_business(ResourceKind::Camera, Uuid::new_v4()).unwrap();
        assert_eq!(
            rendered(&filter),
            "SELECT * FROM t WHERE zone_id IN (SELECT id FROM zones WHERE \
             property_id IN (SELECT id FROM properties WHERE business_id = $1))"
        );
    }

    #[test]
    fn test_direct_scope_sql() {
        let filter = ScopeFilter::for_business(ResourceKind::AlertRule, Uuid::new_v4()).unwrap();
        assert_eq!(rendered(&filter), "SELECT * FROM t WHERE business_id = $1");
    }

    #[test]
    fn test_unrestricted_sql() {
        let all = ScopeFilter::unrestricted(ResourceKind::Note).unwrap();
        assert_eq!(rendered(&all), "SELECT * FROM t WHERE TRUE");
    }

    #[test]
    fn test_column_layouts_skip_id() {
        assert!(!Camera::COLUMNS.contains(&"id"));
        assert_eq!(AlertRule::COLUMNS.len(), 10);
        assert!(Zone::COLUMNS.contains(&"building_id"));
    }
}
