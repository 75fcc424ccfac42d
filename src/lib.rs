//! VisionTrack 租户隔离 API
//! 会话解析、业务归属解析、作用域过滤与各资源的 CRUD

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod scope;
pub mod services;
pub mod telemetry;
