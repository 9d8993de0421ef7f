use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery, PageQuery};
use crate::error::Result;
use crate::models::{NewTheatreHall, TheatreHall, TheatreHallDetail};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/theatre-halls", get(list_halls).post(create_hall))
        .route("/theatre-halls/{id}", get(get_hall).delete(delete_hall))
}

async fn list_halls(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<TheatreHall>>> {
    Ok(Json(state.scheduling.list_halls(query.page()).await?))
}

// карточка зала дополнительно отдает capacity
async fn get_hall(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Json<TheatreHallDetail>> {
    Ok(Json(state.scheduling.get_hall(id).await?))
}

async fn create_hall(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewTheatreHall>,
) -> Result<(StatusCode, Json<TheatreHall>)> {
    let hall = state.scheduling.create_hall(payload).await?;
    Ok((StatusCode::CREATED, Json(hall)))
}

async fn delete_hall(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.scheduling.delete_hall(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
