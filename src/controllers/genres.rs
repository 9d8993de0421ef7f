use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery, PageQuery};
use crate::error::Result;
use crate::models::{Genre, NewGenre};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/{id}", get(get_genre).delete(delete_genre))
}

async fn list_genres(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<Genre>>> {
    Ok(Json(state.catalog.list_genres(query.page()).await?))
}

async fn get_genre(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Json<Genre>> {
    Ok(Json(state.catalog.get_genre(id).await?))
}

async fn create_genre(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewGenre>,
) -> Result<(StatusCode, Json<Genre>)> {
    let genre = state.catalog.create_genre(payload).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn delete_genre(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
