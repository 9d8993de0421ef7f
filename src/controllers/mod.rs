pub mod actors;
pub mod extract;
pub mod genres;
pub mod performances;
pub mod plays;
pub mod reservations;
pub mod theatre_halls;
pub mod tickets;
pub mod users;

use axum::{middleware::from_fn_with_state, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::access::{catalog_guard, reservation_guard};
use crate::services::Page;
use crate::AppState;

pub use extract::{AppJson, AppPath, AppQuery};

/// `?page=2&pageSize=50`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.page_size)
    }
}

// /theatre/api/* закрыт route-layer'ами, /api/user/* проверяет доступ сам
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let catalog = Router::new()
        .merge(plays::routes())
        .merge(actors::routes())
        .merge(genres::routes())
        .merge(theatre_halls::routes())
        .merge(performances::routes())
        .merge(tickets::routes())
        .route_layer(from_fn_with_state(state.clone(), catalog_guard));

    let reservations = reservations::routes()
        .route_layer(from_fn_with_state(state.clone(), reservation_guard));

    Router::new()
        .nest("/theatre/api", catalog.merge(reservations))
        .nest("/api/user", users::routes(state))
}
