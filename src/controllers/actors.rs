use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery, PageQuery};
use crate::error::Result;
use crate::models::{Actor, ActorListItem, NewActor};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/actors", get(list_actors).post(create_actor))
        .route("/actors/{id}", get(get_actor).delete(delete_actor))
}

async fn list_actors(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<ActorListItem>>> {
    Ok(Json(state.catalog.list_actors(query.page()).await?))
}

async fn get_actor(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Json<ActorListItem>> {
    Ok(Json(state.catalog.get_actor(id).await?))
}

async fn create_actor(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewActor>,
) -> Result<(StatusCode, Json<Actor>)> {
    let actor = state.catalog.create_actor(payload).await?;
    Ok((StatusCode::CREATED, Json(actor)))
}

async fn delete_actor(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<StatusCode> {
    state.catalog.delete_actor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
