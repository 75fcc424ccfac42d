//! 业务（租户）模型

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 业务：数据隔离单元，只属于一个所有者
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    pub fn new(name: &str, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            owner_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
