use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{NewTicket, TheatreHall, Ticket, TicketDetail};
use crate::services::catalog::{delete_by_id, invalid_pk};
use crate::services::{scheduling, Page};

/// Проверка места и ряда по геометрии зала.
///
/// Место проверяется раньше ряда: если неверны оба, в ошибке будет `seat`.
pub fn validate_seat(seat: i32, row: i32, hall: &TheatreHall) -> Result<()> {
    if !(1..=hall.seats_in_row).contains(&seat) {
        return Err(AppError::OutOfRange { field: "seat", max: hall.seats_in_row });
    }
    if !(1..=hall.rows).contains(&row) {
        return Err(AppError::OutOfRange { field: "row", max: hall.rows });
    }
    Ok(())
}

/// Билет вместе со спектаклем одним запросом; `tail` - условие и сортировка
pub(crate) fn ticket_detail_sql(tail: &str) -> String {
    format!(
        r#"
        SELECT t.id AS ticket_id, t.row, t.seat, perf.*
        FROM tickets t
        JOIN ({}) perf ON perf.id = t.performance_id
        {}"#,
        scheduling::PERFORMANCE_LIST_SQL,
        tail
    )
}

/// Билеты - единица инвентаря. Билет существует независимо от брони.
#[derive(Clone)]
pub struct TicketingEngine {
    pool: PgPool,
}

impl TicketingEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Свободные билеты: уже привязанные к брони не показываем
    pub async fn list_available(&self, performance: Option<i64>, page: Page) -> Result<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT t.id, t.row, t.seat, t.performance_id
            FROM tickets t
            WHERE NOT EXISTS (SELECT 1 FROM reservation_tickets rt WHERE rt.ticket_id = t.id)
              AND ($1::BIGINT IS NULL OR t.performance_id = $1)
            ORDER BY t.performance_id, t.row, t.seat
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(performance)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    pub async fn get_ticket(&self, id: i64) -> Result<TicketDetail> {
        sqlx::query_as::<_, TicketDetail>(&ticket_detail_sql("WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("ticket"))
    }

    pub async fn create_ticket(&self, new_ticket: NewTicket) -> Result<Ticket> {
        let NewTicket { performance, row, seat } = new_ticket;

        let hall = scheduling::hall_of_performance(&self.pool, performance)
            .await?
            .ok_or_else(|| invalid_pk("performance", performance))?;

        validate_seat(seat, row, &hall)?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE performance_id = $1 AND row = $2 AND seat = $3)"
        )
        .bind(performance)
        .bind(row)
        .bind(seat)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(AppError::DuplicateSeat { row, seat });
        }

        let inserted = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (performance_id, row, seat) VALUES ($1, $2, $3)
             RETURNING id, row, seat, performance_id"
        )
        .bind(performance)
        .bind(row)
        .bind(seat)
        .fetch_one(&self.pool)
        .await;

        // параллельная вставка того же места упирается в UNIQUE
        let ticket = match inserted.map_err(AppError::from) {
            Ok(ticket) => ticket,
            Err(AppError::Duplicate { field: "seat", .. }) => {
                return Err(AppError::DuplicateSeat { row, seat });
            }
            Err(e) => return Err(e),
        };

        info!(
            "Ticket {} created: performance {}, row {}, seat {}",
            ticket.id, performance, row, seat
        );
        Ok(ticket)
    }

    pub async fn delete_ticket(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "tickets", "ticket", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hall(rows: i32, seats_in_row: i32) -> TheatreHall {
        TheatreHall { id: 1, name: "Main".into(), rows, seats_in_row }
    }

    fn failed_field(result: Result<()>) -> Option<&'static str> {
        match result {
            Err(AppError::OutOfRange { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn seat_and_row_inside_hall_pass() {
        let h = hall(5, 10);
        assert!(validate_seat(1, 1, &h).is_ok());
        assert!(validate_seat(10, 5, &h).is_ok());
    }

    #[test]
    fn seat_out_of_range() {
        let h = hall(5, 10);
        assert_eq!(failed_field(validate_seat(0, 1, &h)), Some("seat"));
        assert_eq!(failed_field(validate_seat(11, 1, &h)), Some("seat"));
    }

    #[test]
    fn row_out_of_range_with_valid_seat() {
        let h = hall(5, 10);
        assert_eq!(failed_field(validate_seat(3, 0, &h)), Some("row"));
        assert_eq!(failed_field(validate_seat(3, 6, &h)), Some("row"));
    }

    #[test]
    fn seat_is_reported_before_row() {
        let h = hall(5, 10);
        assert_eq!(failed_field(validate_seat(0, 0, &h)), Some("seat"));
        assert_eq!(failed_field(validate_seat(99, 99, &h)), Some("seat"));
    }

    #[test]
    fn error_message_carries_hall_bound() {
        let err = validate_seat(1, 7, &hall(6, 10)).unwrap_err();
        assert_eq!(err.to_string(), "row must be in the range [1, 6]");
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_hall_geometry(
            rows in 1i32..40,
            seats in 1i32..40,
            row in -5i32..50,
            seat in -5i32..50,
        ) {
            let h = hall(rows, seats);
            let result = validate_seat(seat, row, &h);
            let seat_ok = seat >= 1 && seat <= seats;
            let row_ok = row >= 1 && row <= rows;

            match failed_field(result) {
                None => prop_assert!(seat_ok && row_ok),
                Some("seat") => prop_assert!(!seat_ok),
                Some("row") => prop_assert!(seat_ok && !row_ok),
                Some(other) => prop_assert!(false, "unexpected field {}", other),
            }
        }
    }
}
