//! 租户作用域：主体 -> 业务 -> 行过滤器

pub mod filter;
pub mod kind;
pub mod resolver;

pub use filter::{ScopeFilter, ScopeRule};
pub use kind::{Owner, OwnershipLink, ResourceKind, WritePolicy};
pub use resolver::{AccessContext, ScopeResolver};
