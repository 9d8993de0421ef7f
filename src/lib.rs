pub mod config;
pub mod database;
pub mod redis_client;
pub mod error;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::cache::CacheService;
use crate::config::Config;
use crate::database::Database;
use crate::redis_client::RedisClient;
use crate::services::{CatalogStore, ReservationEngine, SchedulingStore, TicketingEngine, TokenService};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: CacheService,
    pub config: Config,
    pub tokens: TokenService,
    pub catalog: CatalogStore,
    pub scheduling: SchedulingStore,
    pub ticketing: TicketingEngine,
    pub reservations: ReservationEngine,
}

impl AppState {
    /// Подключается к Postgres сразу; Redis - при первом обращении
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::new(&config.database.url, config.database.pool_size).await?;
        Self::from_database(config, db)
    }

    pub fn from_database(config: Config, db: Database) -> anyhow::Result<Arc<Self>> {
        let redis = RedisClient::new(&config.redis.url)?;
        let pool = db.pool.clone();

        Ok(Arc::new(Self {
            cache: CacheService::new(redis),
            tokens: TokenService::new(&config.jwt),
            catalog: CatalogStore::new(pool.clone()),
            scheduling: SchedulingStore::new(pool.clone(), config.app.time_zone.clone()),
            ticketing: TicketingEngine::new(pool.clone()),
            reservations: ReservationEngine::new(pool),
            db,
            config,
        }))
    }

    /// Состояние без сетевых подключений (для тестов маршрутизации)
    pub fn lazy(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::lazy(&config.database.url, config.database.pool_size)?;
        Self::from_database(config, db)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Theatre API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes(state.clone()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
