use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ortho_api::background;
use ortho_api::bootstrap::{self, BootstrapAdmin};
use ortho_api::config::ServerConfig;
use ortho_api::router::build_app_router;
use ortho_api::state::AppState;
use ortho_db::repositories::LegacySyncRunRepo;
use ortho_sync::{MySqlBookingSource, SyncEngine};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ortho_api=debug,ortho_sync=info,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        legacy_sync = config.legacy_sync.database_url.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = ortho_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    ortho_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    ortho_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    bootstrap::verify_roles(&pool)
        .await
        .expect("Role lookup table is incomplete");

    if let Some(admin) = BootstrapAdmin::from_env() {
        bootstrap::ensure_admin(&pool, &admin)
            .await
            .expect("Failed to create bootstrap administrator");
    }

    // --- Photo storage ---
    let image_store = ortho_media::build_store(&config.media).expect("Invalid media configuration");
    tracing::info!(store = image_store.name(), "Image store ready");

    // --- Legacy sync ---
    let sync_engine = match &config.legacy_sync.database_url {
        Some(url) => {
            let source = MySqlBookingSource::connect_lazy(url, config.legacy_sync.batch_limit)
                .expect("Invalid LEGACY_DATABASE_URL");
            let failed = LegacySyncRunRepo::fail_stale(&pool)
                .await
                .expect("Failed to close interrupted sync runs");
            if failed > 0 {
                tracing::warn!(failed, "Marked interrupted legacy sync runs as failed");
            }
            Some(Arc::new(SyncEngine::new(pool.clone(), Arc::new(source))))
        }
        None => {
            tracing::info!("LEGACY_DATABASE_URL not set, legacy sync disabled");
            None
        }
    };

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let mut jobs = vec![
        tokio::spawn(background::payment_overdue::run(pool.clone(), cancel.clone())),
        tokio::spawn(background::session_cleanup::run(pool.clone(), cancel.clone())),
    ];
    if let Some(engine) = &sync_engine {
        jobs.push(tokio::spawn(background::legacy_sync::run(
            Arc::clone(engine),
            Duration::from_secs(config.legacy_sync.interval_secs),
            cancel.clone(),
        )));
    }
    tracing::info!(count = jobs.len(), "Background jobs started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        image_store,
        sync_engine,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    for job in jobs {
        if tokio::time::timeout(grace, job).await.is_err() {
            tracing::warn!("Background job did not stop within the shutdown timeout");
        }
    }
    tracing::info!("Background jobs stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
