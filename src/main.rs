use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};

use city_home_service as api;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %format!("{err:#}"), "service failed to start");
        eprintln!("city-home-service: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = match api::config::load_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            api::config::init_fallback_tracing();
            return Err(anyhow::Error::new(err).context("failed to load configuration"));
        }
    };
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::errors::expose_error_details(cfg.is_development());
    api::handlers::health::init_start_time();

    let jwt_secret = cfg
        .resolve_jwt_secret()
        .context("JWT secret is required outside development")?;

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool)
            .await
            .context("failed running migrations")?;
    }

    tokio::fs::create_dir_all(&cfg.upload_dir)
        .await
        .with_context(|| format!("failed to create upload directory {}", cfg.upload_dir))?;

    let notifier = api::services::notifications::WhatsAppNotifier::from_config(&cfg.whatsapp)
        .context("failed to build WhatsApp client")?;
    if notifier.is_enabled() {
        info!("WhatsApp booking notifications enabled");
    } else {
        warn!("WhatsApp is not configured; booking notifications are disabled");
    }

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;

    let state = api::AppState::new(cfg, db_pool, jwt_secret, notifier);
    let app = api::app_router(state);

    // Bind and serve
    info!("city-home-service listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
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
    info!("shutdown signal received");
}
