//! Pharmacy back-office alerting daemon.
//!
//! Wires the crates together and runs the reconciliation scheduler until
//! Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use pharmacy_core::config::AppConfig;
use pharmacy_database::DatabasePool;
use pharmacy_service::{Services, Stores};
use pharmacy_worker::jobs::ReconciliationJobHandler;
use pharmacy_worker::{CronScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %format!("{e:#}"), "Server error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `PHARMACY_ENV` overlay and environment variables.
fn load_configuration() -> anyhow::Result<AppConfig> {
    let env = std::env::var("PHARMACY_ENV").unwrap_or_else(|_| "development".to_string());
    let base = std::env::var("PHARMACY_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    AppConfig::load_from(&base, &env)
        .with_context(|| format!("loading '{base}' for environment '{env}'"))
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting pharmacy alerting");

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database)
        .await
        .context("database connection failed")?;
    db.ping().await.context("database ping failed")?;

    if config.database.run_migrations {
        pharmacy_database::migration::run_migrations(db.pool())
            .await
            .context("migration failed")?;
    } else {
        tracing::info!("Automatic migrations disabled");
    }

    // ── Step 2: Stores, observers and services ───────────────────
    let stores = Stores::from_pool(&db);
    let services = Services::build(stores, config.alerting.clone()).await;
    tracing::info!("Services initialized");

    // ── Step 3: Reconciliation scheduler ─────────────────────────
    let scheduler = if config.scheduler.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ReconciliationJobHandler::new(Arc::clone(
            &services.reconciliation,
        ))));

        let scheduler = CronScheduler::new(Arc::new(executor), config.scheduler.clone()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::warn!("Scheduler disabled, no batch checks will run");
        None
    };

    // ── Step 4: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");

    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
        }
    }
    db.close().await;

    tracing::info!("Pharmacy alerting shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
}
