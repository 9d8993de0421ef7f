use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery, PageQuery};
use crate::error::Result;
use crate::models::{NewPlay, PlayDetail, PlayListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plays", get(list_plays).post(create_play))
        .route("/plays/{id}", get(get_play).delete(delete_play))
}

async fn list_plays(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<PlayListItem>>> {
    Ok(Json(state.catalog.list_plays(query.page()).await?))
}

async fn get_play(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Json<PlayDetail>> {
    Ok(Json(state.catalog.get_play(id).await?))
}

async fn create_play(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewPlay>,
) -> Result<(StatusCode, Json<PlayDetail>)> {
    let play = state.catalog.create_play(payload).await?;
    Ok((StatusCode::CREATED, Json(play)))
}

async fn delete_play(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.catalog.delete_play(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
