use og_backend::config::LoggingConfig;
use og_backend::startup::run_startup_checks;
use og_backend::{AppConfig, AppState, ShutdownManager, build_app};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // Load config（日志尚未初始化，失败直接输出到 stderr）
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging);
    tracing::info!("配置文件: {:?}", AppConfig::get_config_path());

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run_startup_checks(config).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let state = match AppState::from_config(config, shutdown_manager.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Image service init failed: {}", e);
            std::process::exit(1);
        }
    };
    let app = build_app(state, config);

    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Image API: http://{}{}/image", addr, config.api.prefix.trim_end_matches('/'));
    tracing::info!("OpenAPI: http://{}/api-docs/openapi.json", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("渲染并发上限: {}", config.image.effective_parallelism());

    let graceful = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_manager.graceful(config.shutdown.timeout_duration()));

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
