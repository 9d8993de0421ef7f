use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::PerformanceListItem;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    #[serde(rename = "performance")]
    pub performance_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketDetail {
    #[sqlx(rename = "ticket_id")]
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    #[sqlx(flatten)]
    pub performance: PerformanceListItem,
}

#[derive(Debug, Deserialize)]
pub struct NewTicket {
    pub performance: i64,
    pub row: i32,
    pub seat: i32,
}
