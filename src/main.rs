//! VisionTrack API 主入口

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use visiontrack_api::{
    auth::PasswordHasher,
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{PgStore, Store},
    routes,
    services::identity_mirror,
    telemetry,
};

enum Command {
    Serve,
    CreateAdmin { email: String, password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    let command = match args.get(1).map(String::as_str) {
        None => Command::Serve,
        Some("--version") => {
            println!("visiontrack-api {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") => {
            print_help();
            return Ok(());
        }
        Some("--create-admin") => match (args.get(2), args.get(3)) {
            (Some(email), Some(password)) => Command::CreateAdmin {
                email: email.clone(),
                password: password.clone(),
            },
            _ => {
                eprintln!("用法: visiontrack-api --create-admin <email> <password>");
                std::process::exit(1);
            }
        },
        Some(other) => {
            eprintln!("未知参数: {}", other);
            print_help();
            std::process::exit(1);
        }
    };

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(path) = std::env::var("VT_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "VisionTrack API starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 构建应用状态，存储客户端在这里创建并注入
    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));
    let mirror = identity_mirror::from_config(&config.identity_mirror)?;
    let app_state = Arc::new(AppState::new(
        config.clone(),
        store,
        mirror,
        PasswordHasher::new(),
    )?);

    if let Command::CreateAdmin { email, password } = command {
        let admin = app_state.auth_service.create_admin(&email, &password).await?;
        println!("Administrator created: {} ({})", admin.email, admin.id);
        return Ok(());
    }

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // 超时后强制退出
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("visiontrack-api {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: visiontrack-api [选项]");
    println!();
    println!("选项:");
    println!("  --version                          打印版本信息并退出");
    println!("  --help                             打印此帮助信息并退出");
    println!("  --create-admin <email> <password>  创建平台管理员并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 VT_ 前缀的环境变量完成（嵌套字段用 __ 分隔）");
    println!("  可用选项请参考 .env.example");
}
