use anyhow::Context;
use library_lending::{
    adapters::{
        postgres::{PostgresBookRepository, PostgresLoanRepository},
        smtp::SmtpEmailService,
    },
    api::{handlers::AppState, router::create_router},
    application::{
        ServiceDependencies,
        notification::{DailySchedule, spawn_late_loan_notifier},
    },
    config::AppConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .envがあれば読み込む（なくてもよい）
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "library_lending={},tower_http=debug,axum=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Database ready");

    // Initialize adapters
    let book_repository = Arc::new(PostgresBookRepository::new(pool.clone()));
    let loan_repository = Arc::new(PostgresLoanRepository::new(pool.clone()));
    let email_service = Arc::new(SmtpEmailService::new(config.email.clone()));

    // Create service dependencies
    let service_deps = ServiceDependencies {
        book_repository,
        loan_repository,
        email_service,
        late_after_days: config.loans.late_after_days,
    };

    let cancel = CancellationToken::new();

    // 延滞通知ジョブ
    let notifier = if config.notification.enabled {
        let schedule = DailySchedule::new(config.notification.daily_at()?);
        Some(spawn_late_loan_notifier(
            service_deps.clone(),
            schedule,
            config.notification.message.clone(),
            cancel.clone(),
        ))
    } else {
        tracing::info!("Late loan notifier disabled");
        None
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("Server error")?;

    // サーバー停止後にジョブを止めて終了を待つ
    cancel.cancel();
    if let Some(handle) = notifier {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Late loan notifier ended abnormally");
        }
    }

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
