use crate::cache::CacheService;
use redis::AsyncCommands;
use tracing::info;

fn refresh_key(jti: &str) -> String {
    format!("auth:refresh:{}", jti)
}

impl CacheService {
    /// Запомнить выданный refresh-токен на время его жизни
    pub async fn remember_refresh_token(
        &self,
        jti: &str,
        user_id: i64,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        conn.set_ex(refresh_key(jti), user_id, ttl_seconds).await
    }

    /// Атомарно забрать refresh-токен (GETDEL). None - токен уже использован или отозван
    pub async fn consume_refresh_token(&self, jti: &str) -> Result<Option<i64>, redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        conn.get_del(refresh_key(jti)).await
    }

    /// Отозвать refresh-токен (logout)
    pub async fn revoke_refresh_token(&self, jti: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn().await?;
        let removed: u32 = conn.del(refresh_key(jti)).await?;
        if removed > 0 {
            info!("Revoked refresh token {}", jti);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_keys_are_namespaced() {
        assert_eq!(refresh_key("abc"), "auth:refresh:abc");
    }
}
