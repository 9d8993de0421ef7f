use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Ticket, TicketDetail};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationListItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationDetail {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<TicketDetail>,
}

// created_at не принимаем от клиента, его ставит БД
#[derive(Debug, Deserialize, Validate)]
pub struct NewReservation {
    #[validate(length(min = 1, message = "at least one ticket is required"))]
    pub tickets: Vec<i64>,
    pub performance: Option<i64>,
}
