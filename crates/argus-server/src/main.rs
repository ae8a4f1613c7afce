mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = argus_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::info!(env = %config.env, "starting argus-server");

    let pool_config = argus_db::PoolConfig::from_app_config(&config);
    let pool = argus_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = argus_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let scanner = Arc::new(argus_scanner::Scanner::from_app_config(&config, pool.clone())?);
    let _scheduler = scheduler::build_scheduler(Arc::clone(&scanner), &config.scan_cron).await?;

    let auth = AuthState::from_env(config.env.is_development())?;
    let app = build_app(AppState { pool, scanner }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level when both are set.
fn init_tracing(fallback_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback_level)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received; draining connections");
}
