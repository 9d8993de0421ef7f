use anyhow::Context;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use theatre_service::{
    config::Config,
    database::Database,
    models::User,
    services::auth::hash_password,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Theatre API");

    // Connect to the database
    let db = Database::new(&config.database.url, config.database.pool_size)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    // Run migrations
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    // Seed the admin account
    if let Some(admin) = &config.admin {
        let password_hash = hash_password(&admin.password)?;
        let user = User::upsert_admin(&admin.username, &password_hash, &db).await?;
        info!("Admin user {} ({}) is ready", user.username, user.id);
    }

    let app_state = AppState::from_database(config.clone(), db)?;

    if let Err(e) = app_state.cache.ping().await {
        warn!("Redis is not reachable yet: {}", e);
    } else {
        info!("Redis connected");
    }

    let app = theatre_service::app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("HOST/PORT do not form a socket address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
