use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrflow_backend::{
    app,
    config::Config,
    db::create_pool,
    repositories::PgStore,
    state::AppState,
    utils::time::SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrflow_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        time_zone = %config.time_zone,
        leave_default_days = config.leave_default_days,
        overtime_manager_min_hours = config.overtime_manager_min_hours,
        leave_overdraft_policy = ?config.leave_overdraft_policy,
        legacy_role_heuristics = config.legacy_role_heuristics,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr = config.bind_addr;
    let clock = Arc::new(SystemClock::new(config.time_zone));
    let state = AppState::new(PgStore::new(pool), config, clock);
    let app = app::router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
