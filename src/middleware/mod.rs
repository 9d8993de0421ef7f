pub mod access;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::AppError;
use crate::services::auth::{Claims, TokenKind, TokenService};

pub use access::{authorize, ResourceClass, Role};

/// Аутентифицированный пользователь запроса.
/// Передается в движки явно, глобального "текущего пользователя" нет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub is_staff: bool,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal { user_id: claims.sub, username: claims.username, is_staff: claims.is_staff }
    }
}

/// Достает пользователя из `Authorization: Bearer <access>`.
/// Нет заголовка - Ok(None) (аноним), битый токен - 401.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Option<Principal>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated("Invalid Authorization header format"))?;

    let claims = tokens
        .decode(token, TokenKind::Access)
        .map_err(|_| AppError::Unauthenticated("Given token not valid for any token type"))?;

    Ok(Some(claims.into()))
}

// Principal кладет в extensions guard из access.rs
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthenticated("Authentication credentials were not provided."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::UserView;
    use axum::http::HeaderValue;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: "middleware-secret".into(),
            access_ttl_minutes: 90,
            refresh_ttl_days: 7,
        })
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        headers
    }

    #[test]
    fn no_header_is_anonymous() {
        assert_eq!(authenticate(&HeaderMap::new(), &tokens()).unwrap(), None);
    }

    #[test]
    fn access_token_yields_principal() {
        let service = tokens();
        let user = UserView { id: 3, username: "anna".into(), is_staff: false };
        let issued = service.issue(&user).unwrap();

        let principal = authenticate(&bearer(&issued.pair.access), &service).unwrap().unwrap();
        assert_eq!(principal, Principal { user_id: 3, username: "anna".into(), is_staff: false });
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let service = tokens();
        let user = UserView { id: 3, username: "anna".into(), is_staff: false };
        let issued = service.issue(&user).unwrap();

        assert!(matches!(
            authenticate(&bearer(&issued.pair.refresh), &service),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn basic_auth_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(authenticate(&headers, &tokens()), Err(AppError::Unauthenticated(_))));
    }
}
