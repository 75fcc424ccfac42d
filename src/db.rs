//! 数据库连接池与迁移管理
//! PostgreSQL 连接池、迁移与就绪探测

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::{Duration, Instant};

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let db_url = config.url.expose_secret();

    tracing::debug!("Creating database connection pool...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(db_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool created successfully"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            DbError::MigrationFailed(e.to_string())
        })?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// 存储就绪探测：执行一次 `SELECT 1` 并记录耗时与连接池水位
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    let started = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    metrics::gauge!("vt_db_pool_size").set(pool.size() as f64);
    metrics::gauge!("vt_db_pool_idle").set(pool.num_idle() as f64);
    metrics::histogram!("vt_db_ping_seconds").record(started.elapsed().as_secs_f64());

    match result {
        Ok(1) => Ok(()),
        Ok(other) => Err(DbError::Unavailable(format!("unexpected ping result {}", other))),
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            Err(DbError::Unavailable(e.to_string()))
        }
    }
}

/// 数据库错误类型
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),
}
