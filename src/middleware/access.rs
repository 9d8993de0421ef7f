//! Контроль доступа: (роль, HTTP-метод, класс ресурса) -> разрешить / 401 / 403.
//!
//! | ресурс      | аноним | пользователь              | админ |
//! |-------------|--------|---------------------------|-------|
//! | Catalog     | 401    | чтение; запись -> 403     | все   |
//! | Reservation | 401    | GET/POST/DELETE; свои     | все   |
//! | Account     | 401    | все                       | все   |
//!
//! Проверка выполняется route-layer'ом до того, как запрос дойдет до хендлера.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{authenticate, Principal};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    Authenticated,
    Admin,
}

impl Role {
    pub fn of(principal: Option<&Principal>) -> Self {
        match principal {
            None => Role::Anonymous,
            Some(p) if p.is_staff => Role::Admin,
            Some(_) => Role::Authenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Пьесы, актеры, жанры, залы, спектакли, билеты
    Catalog,
    Reservation,
    /// Профиль текущего пользователя
    Account,
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub fn authorize(role: Role, resource: ResourceClass, method: &Method) -> Result<(), AppError> {
    match (role, resource) {
        (Role::Anonymous, _) => Err(AppError::Unauthenticated(
            "Authentication credentials were not provided.",
        )),
        (Role::Admin, _) => Ok(()),
        (Role::Authenticated, ResourceClass::Catalog) if is_read(method) => Ok(()),
        (Role::Authenticated, ResourceClass::Reservation)
            if is_read(method) || matches!(*method, Method::POST | Method::DELETE) =>
        {
            Ok(())
        }
        (Role::Authenticated, ResourceClass::Account) => Ok(()),
        (Role::Authenticated, _) => Err(AppError::Forbidden),
    }
}

async fn guard(
    state: &AppState,
    resource: ResourceClass,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate(request.headers(), &state.tokens)?;
    authorize(Role::of(principal.as_ref()), resource, request.method())?;

    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }
    Ok(next.run(request).await)
}

pub async fn catalog_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, ResourceClass::Catalog, request, next).await
}

pub async fn reservation_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, ResourceClass::Reservation, request, next).await
}

pub async fn account_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, ResourceClass::Account, request, next).await
}
