//! 资源类型及其回溯到业务的归属路径

use crate::models::user::Role;
use serde::Serialize;

/// API 层涉及的全部实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    User,
    Business,
    BusinessStaff,
    Property,
    Building,
    Zone,
    Camera,
    Department,
    AlertRule,
    Note,
    VtCredential,
}

/// 归属外键指向的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// 该列就是业务 id
    Business,
    /// 该列指向另一种作用域类型的行
    Parent(ResourceKind),
}

/// 归属路径上的一跳：本表的 `column` 引用 `owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipLink {
    pub column: &'static str,
    pub owner: Owner,
}

/// 谁可以创建、更新、删除该类型的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// 业务所有者（及平台管理员）
    OwnerOnly,
    /// 业务所有者和员工（及平台管理员）
    Members,
}

impl WritePolicy {
    pub fn allows(self, role: Role) -> bool {
        match (self, role) {
            (_, Role::Admin) | (_, Role::BusinessOwner) => true,
            (WritePolicy::Members, Role::Staff) => true,
            (WritePolicy::OwnerOnly, Role::Staff) => false,
        }
    }
}

impl ResourceKind {
    pub fn table(self) -> &'static str {
        match self {
            ResourceKind::User => "users",
            ResourceKind::Business => "businesses",
            ResourceKind::BusinessStaff => "business_staff",
            ResourceKind::Property => "properties",
            ResourceKind::Building => "buildings",
            ResourceKind::Zone => "zones",
            ResourceKind::Camera => "cameras",
            ResourceKind::Department => "departments",
            ResourceKind::AlertRule => "alert_rules",
            ResourceKind::Note => "notes",
            ResourceKind::VtCredential => "vt_api_credentials",
        }
    }

    /// NotFound 消息中使用的名称
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::Business => "Business",
            ResourceKind::BusinessStaff => "Staff member",
            ResourceKind::Property => "Property",
            ResourceKind::Building => "Building",
            ResourceKind::Zone => "Zone",
            ResourceKind::Camera => "Camera",
            ResourceKind::Department => "Department",
            ResourceKind::AlertRule => "Alert rule",
            ResourceKind::Note => "Note",
            ResourceKind::VtCredential => "VT API credential",
        }
    }

    /// 归属路径的第一跳，非租户数据返回 None
    pub fn ownership_link(self) -> Option<OwnershipLink> {
        let link = |column, owner| Some(OwnershipLink { column, owner });
        match self {
            ResourceKind::User | ResourceKind::Business => None,
            ResourceKind::BusinessStaff
            | ResourceKind::Property
            | ResourceKind::Department
            | ResourceKind::AlertRule
            | ResourceKind::VtCredential => link("business_id", Owner::Business),
            ResourceKind::Building | ResourceKind::Zone | ResourceKind::Note => {
                link("property_id", Owner::Parent(ResourceKind::Property))
            }
            ResourceKind::Camera => link("zone_id", Owner::Parent(ResourceKind::Zone)),
        }
    }

    /// 从本类型到业务（不含）经过的类型
    pub fn ownership_path(self) -> Option<Vec<ResourceKind>> {
        let mut path = vec![self];
        let mut link = self.ownership_link()?;
        while let Owner::Parent(parent) = link.owner {
            path.push(parent);
            link = parent.ownership_link()?;
        }
        Some(path)
    }

    pub fn write_policy(self) -> WritePolicy {
        match self {
            ResourceKind::Zone
            | ResourceKind::Camera
            | ResourceKind::AlertRule
            | ResourceKind::Note => WritePolicy::Members,
            _ => WritePolicy::OwnerOnly,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
