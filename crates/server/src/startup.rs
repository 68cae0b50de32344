use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use chrono::Duration;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::auth::repo::SeaOrmAuthRepository;
use service::auth::{AuthRepository, AuthService, SigningSecret, TokenIssuer};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

fn token_issuer(cfg: &AppConfig) -> Result<TokenIssuer, StartupError> {
    cfg.auth.validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let secret = SigningSecret::new(cfg.auth.jwt_secret.clone())
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let access_ttl = Duration::try_hours(cfg.auth.access_token_ttl_hours)
        .ok_or_else(|| StartupError::InvalidConfig("auth.access_token_ttl_hours out of range".into()))?;
    let refresh_ttl = Duration::try_days(cfg.auth.refresh_token_ttl_days)
        .ok_or_else(|| StartupError::InvalidConfig("auth.refresh_token_ttl_days out of range".into()))?;
    Ok(TokenIssuer::with_ttls(secret, access_ttl, refresh_ttl))
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl_c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown_signal_received");
}

/// Public entry: load config, build the app and serve until a shutdown signal
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    run_with_config(cfg, shutdown_signal()).await
}

/// Connect, migrate, bind and serve with the given configuration.
pub async fn run_with_config<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Fail on a bad secret or address before touching the database
    let tokens = token_issuer(&cfg)?;
    let addr = bind_addr(&cfg)?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!("migrations_applied");
    }

    let repo: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository::new(db));
    let state = ServerState::new(Arc::new(AuthService::new(repo, tokens)));
    let app: Router = routes::build_router(state, build_cors());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server_listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server_stopped");
    Ok(())
}
