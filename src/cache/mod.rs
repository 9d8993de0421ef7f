use crate::redis_client::RedisClient;

pub mod auth;

/// Redis хранит только реестр refresh-токенов.
/// Свободные места не кешируются: они всегда считаются из БД.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
}

impl CacheService {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    pub async fn ping(&self) -> redis::RedisResult<()> {
        self.redis.ping().await
    }
}
