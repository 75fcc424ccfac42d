//! HTTP 处理器模块

pub mod auth;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod site;
pub mod staff;
pub mod tenant;

pub use extract::{ValidatedJson, ValidatedPath};
