use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery};
use crate::error::{AppError, Result};
use crate::models::{NewTicket, Ticket, TicketDetail};
use crate::services::Page;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/{id}", get(get_ticket).delete(delete_ticket))
}

#[derive(Debug, Deserialize)]
pub struct TicketsQuery {
    pub performance: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

pub fn parse_performance(raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::field("performance", "performance must be an id")),
        None => Ok(None),
    }
}

// Только свободные билеты
async fn list_tickets(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<TicketsQuery>,
) -> Result<Json<Vec<Ticket>>> {
    let performance = parse_performance(params.performance.as_deref())?;
    let page = Page::new(params.page, params.page_size);

    Ok(Json(state.ticketing.list_available(performance, page).await?))
}

async fn get_ticket(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Json<TicketDetail>> {
    Ok(Json(state.ticketing.get_ticket(id).await?))
}

async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let ticket = state.ticketing.create_ticket(payload).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn delete_ticket(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.ticketing.delete_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
