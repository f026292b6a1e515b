use media_system::{
    auth::jwt::TokenCodec,
    auth::remote::HttpSuperAdminValidator,
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::membership_repo::PgMembershipStore,
    routes,
    services::{AuditService, AuthService, LogMailer, TenantService},
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("media-system {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    if let Ok(env_name) = std::env::var("MEDIA_ENV") {
        dotenv::from_filename(format!(".env.{}", env_name)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);

    // 不安全默认值（密钥/开发 API Key）启动即告警
    config.warn_if_insecure_defaults();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Media platform service starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    let token_codec = Arc::new(TokenCodec::from_config(&config.security)?);
    let audit_service = Arc::new(AuditService::new(db_pool.clone()));
    let membership_store = Arc::new(PgMembershipStore::new(db_pool.clone()));
    let superadmin_validator =
        Arc::new(HttpSuperAdminValidator::from_config(&config.remote_validator)?);

    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        token_codec.clone(),
        Arc::new(config.clone()),
        audit_service.clone(),
        Arc::new(LogMailer),
    ));

    let tenant_service = Arc::new(TenantService::new(membership_store));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_pool,
        token_codec,
        auth_service,
        tenant_service,
        audit_service,
        superadmin_validator,
    });

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

    tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
    tracing::warn!("Graceful shutdown timeout reached, forcing exit");
}

fn print_help() {
    println!("media-system {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: media-system [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过环境变量完成（前缀 MEDIA_）");
    println!("  可用选项请参考 .env.example");
}
