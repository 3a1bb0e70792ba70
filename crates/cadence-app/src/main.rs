use chrono::Utc;
use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use cadence_app::app::api::routes;
use cadence_app::authorizer_handler::AuthorizerHandler;
use cadence_app::config::ConfigHandler;
use cadence_app::db_handler::DbProviderHandler;
use cadence_core::config::{Settings, load_config};
use cadence_db::db::DbProvider;
use cadence_db::db::connection::{DbPool, create_pool};
use cadence_db::db::migrate::run_pending_migrations;
use cadence_service::auth::Authorizer;
use cadence_service::auth::casbin::shared_enforcer;
use cadence_service::series::materialize_due_series;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Cadence recurring event service");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_pending_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    if std::env::args().any(|arg| arg == "--sweep") {
        return sweep(&pool, &config).await;
    }

    let authorizer = Authorizer::new(shared_enforcer().await?);

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(AuthorizerHandler { authorizer })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

/// One maintenance pass: extend every series whose horizon is running out.
async fn sweep(pool: &DbPool, config: &Settings) -> anyhow::Result<()> {
    let mut conn = pool.get_connection().await?;
    let inserted = materialize_due_series(&mut conn, &config.materialization, Utc::now()).await?;
    tracing::info!(inserted, "Materialization sweep finished");
    Ok(())
}
