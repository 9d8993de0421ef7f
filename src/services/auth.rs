//! JWT-токены (access/refresh) и пароли.
//!
//! Access-токен самодостаточен: из него строится `Principal` без похода в БД.
//! Refresh-токен действует, только пока его `jti` лежит в Redis; при обмене он
//! удаляется атомарно, поэтому повторное использование дает 401.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, Result};
use crate::models::UserView;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// id пользователя
    pub sub: i64,
    pub username: String,
    pub is_staff: bool,
    pub kind: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Выпущенная пара + данные refresh-токена для реестра в Redis
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub pair: TokenPair,
    pub refresh_jti: String,
    pub refresh_ttl_seconds: u64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    fn sign(&self, user: &UserView, kind: TokenKind, ttl: Duration) -> Result<(String, Claims)> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    pub fn issue(&self, user: &UserView) -> Result<IssuedTokens> {
        let (access, _) = self.sign(user, TokenKind::Access, self.access_ttl)?;
        let (refresh, refresh_claims) = self.sign(user, TokenKind::Refresh, self.refresh_ttl)?;

        Ok(IssuedTokens {
            pair: TokenPair { access, refresh },
            refresh_jti: refresh_claims.jti,
            refresh_ttl_seconds: self.refresh_ttl.num_seconds().max(1) as u64,
        })
    }

    /// Проверяет подпись, срок и тип токена
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.kind != expected {
            return Err(AppError::Unauthenticated("Token has wrong type"));
        }
        Ok(claims)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, password_hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(access_minutes: i64) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "test-secret".into(),
            access_ttl_minutes: access_minutes,
            refresh_ttl_days: 7,
        })
    }

    fn user() -> UserView {
        UserView { id: 42, username: "testuser".into(), is_staff: true }
    }

    #[test]
    fn access_token_round_trip() {
        let tokens = service(90).issue(&user()).unwrap();
        let claims = service(90).decode(&tokens.pair.access, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "testuser");
        assert!(claims.is_staff);
        assert_eq!(claims.exp - claims.iat, 90 * 60);
    }

    #[test]
    fn refresh_lifetime_is_seven_days() {
        let tokens = service(90).issue(&user()).unwrap();
        assert_eq!(tokens.refresh_ttl_seconds, 7 * 24 * 3600);

        let claims = service(90).decode(&tokens.pair.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(claims.jti, tokens.refresh_jti);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let tokens = service(90).issue(&user()).unwrap();
        assert!(service(90).decode(&tokens.pair.refresh, TokenKind::Access).is_err());
        assert!(service(90).decode(&tokens.pair.access, TokenKind::Refresh).is_err());
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let expired = service(-5).issue(&user()).unwrap();
        assert!(service(90).decode(&expired.pair.access, TokenKind::Access).is_err());

        let other = TokenService::new(&JwtConfig {
            secret: "another-secret".into(),
            access_ttl_minutes: 90,
            refresh_ttl_days: 7,
        });
        let foreign = other.issue(&user()).unwrap();
        assert!(service(90).decode(&foreign.pair.access, TokenKind::Access).is_err());
    }

    #[test]
    fn passwords_are_hashed() {
        let hash = hash_password("test-1-2-3").unwrap();
        assert_ne!(hash, "test-1-2-3");
        assert!(verify_password("test-1-2-3", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
