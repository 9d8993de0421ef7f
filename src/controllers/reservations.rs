use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery, PageQuery};
use crate::error::Result;
use crate::middleware::Principal;
use crate::models::{NewReservation, ReservationDetail, ReservationListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation).delete(delete_reservation))
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<ReservationListItem>>> {
    Ok(Json(state.reservations.list_reservations(&principal, query.page()).await?))
}

async fn get_reservation(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ReservationDetail>> {
    Ok(Json(state.reservations.get_reservation(&principal, id).await?))
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppJson(payload): AppJson<NewReservation>,
) -> Result<(StatusCode, Json<ReservationListItem>)> {
    let reservation = state.reservations.create_reservation(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode> {
    state.reservations.delete_reservation(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
