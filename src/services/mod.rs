//! 业务逻辑服务层

pub mod auth_service;
pub mod dashboard_service;
pub mod identity_mirror;
pub mod resource_service;
pub mod site_service;
pub mod staff_service;
pub mod tenant_service;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use identity_mirror::{DisabledMirror, HttpIdentityMirror, IdentityMirror};
pub use resource_service::ResourceService;
pub use site_service::SiteService;
pub use staff_service::StaffService;
pub use tenant_service::TenantService;
