use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery};
use crate::error::Result;
use crate::models::{NewPerformance, Performance, PerformanceDetail, PerformanceFilter, PerformanceListItem};
use crate::services::Page;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/performances", get(list_performances).post(create_performance))
        .route("/performances/{id}", get(get_performance).delete(delete_performance))
}

// Фильтры приходят строками, разбираем сами, чтобы вернуть ошибку по полю
#[derive(Debug, Deserialize)]
pub struct PerformancesQuery {
    pub play: Option<String>,
    pub date: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

async fn list_performances(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PerformancesQuery>,
) -> Result<Json<Vec<PerformanceListItem>>> {
    let filter = PerformanceFilter::parse(params.play.as_deref(), params.date.as_deref())?;
    let page = Page::new(params.page, params.page_size);

    Ok(Json(state.scheduling.list_performances(&filter, page).await?))
}

async fn get_performance(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<PerformanceDetail>> {
    Ok(Json(state.scheduling.get_performance(id).await?))
}

async fn create_performance(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewPerformance>,
) -> Result<(StatusCode, Json<Performance>)> {
    let performance = state.scheduling.create_performance(payload).await?;
    Ok((StatusCode::CREATED, Json(performance)))
}

async fn delete_performance(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.scheduling.delete_performance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
