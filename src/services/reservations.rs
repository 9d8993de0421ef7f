//! Брони: пользователь забирает один или несколько свободных билетов.
//!
//! Вся пачка билетов проверяется и записывается в одной транзакции: либо
//! привязываются все билеты, либо ни один. Финальную защиту от двойной брони
//! дает UNIQUE(ticket_id) в `reservation_tickets` - он срабатывает при вставке,
//! даже если две параллельные транзакции обе прошли предварительную проверку.

use sqlx::{FromRow, PgPool};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::models::{
    NewReservation, Reservation, ReservationDetail, ReservationListItem, TheatreHall, Ticket,
    TicketDetail,
};
use crate::services::catalog::invalid_pk;
use crate::services::ticketing::{ticket_detail_sql, validate_seat};
use crate::services::Page;

/// Билет-кандидат вместе с геометрией зала и признаком брони
#[derive(Debug, Clone, FromRow)]
pub struct CandidateTicket {
    pub id: i64,
    pub performance_id: i64,
    pub row: i32,
    pub seat: i32,
    pub hall_id: i64,
    pub hall_name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub reserved: bool,
}

impl CandidateTicket {
    fn hall(&self) -> TheatreHall {
        TheatreHall {
            id: self.hall_id,
            name: self.hall_name.clone(),
            rows: self.rows,
            seats_in_row: self.seats_in_row,
        }
    }
}

/// Проверка пачки до записи. Порядок проверок для каждого билета:
/// существует -> нужный спектакль -> место в зале -> не забронирован.
pub fn check_batch(
    requested: &[i64],
    found: &[CandidateTicket],
    performance: Option<i64>,
) -> Result<()> {
    let mut seen = BTreeSet::new();
    if let Some(dup) = requested.iter().find(|id| !seen.insert(**id)) {
        return Err(AppError::field("tickets", format!("ticket {} is listed more than once", dup)));
    }

    for id in requested {
        let ticket = found
            .iter()
            .find(|t| t.id == *id)
            .ok_or_else(|| invalid_pk("tickets", *id))?;

        if let Some(performance_id) = performance {
            if ticket.performance_id != performance_id {
                return Err(AppError::field(
                    "tickets",
                    format!("ticket {} does not belong to performance {}", id, performance_id),
                ));
            }
        }

        validate_seat(ticket.seat, ticket.row, &ticket.hall())?;

        if ticket.reserved {
            return Err(AppError::AlreadyReserved(Some(*id)));
        }
    }

    Ok(())
}

#[derive(FromRow)]
struct BoundTicket {
    reservation_id: i64,
    id: i64,
    row: i32,
    seat: i32,
    performance_id: i64,
}

// Раскладываем билеты по броням, сохраняя порядок броней
fn group_tickets(reservations: Vec<Reservation>, rows: Vec<BoundTicket>) -> Vec<ReservationListItem> {
    let mut by_reservation: BTreeMap<i64, Vec<Ticket>> = BTreeMap::new();
    for r in rows {
        by_reservation.entry(r.reservation_id).or_default().push(Ticket {
            id: r.id,
            row: r.row,
            seat: r.seat,
            performance_id: r.performance_id,
        });
    }

    reservations
        .into_iter()
        .map(|r| ReservationListItem {
            id: r.id,
            created_at: r.created_at,
            tickets: by_reservation.remove(&r.id).unwrap_or_default(),
        })
        .collect()
}

#[derive(Clone)]
pub struct ReservationEngine {
    pool: PgPool,
}

impl ReservationEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_reservation(
        &self,
        principal: &Principal,
        new_reservation: NewReservation,
    ) -> Result<ReservationListItem> {
        new_reservation.validate()?;
        let requested = new_reservation.tickets;

        let mut tx = self.pool.begin().await?;

        let candidates = sqlx::query_as::<_, CandidateTicket>(
            r#"
            SELECT
                t.id,
                t.performance_id,
                t.row,
                t.seat,
                h.id AS hall_id,
                h.name AS hall_name,
                h.rows,
                h.seats_in_row,
                EXISTS(SELECT 1 FROM reservation_tickets rt WHERE rt.ticket_id = t.id) AS reserved
            FROM tickets t
            JOIN performances p ON p.id = t.performance_id
            JOIN theatre_halls h ON h.id = p.theatre_hall_id
            WHERE t.id = ANY($1)
            "#
        )
        .bind(&requested)
        .fetch_all(&mut *tx)
        .await?;

        check_batch(&requested, &candidates, new_reservation.performance)?;

        // created_at ставит БД
        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id) VALUES ($1) RETURNING id, user_id, created_at"
        )
        .bind(principal.user_id)
        .fetch_one(&mut *tx)
        .await?;

        // конкурентная бронь того же билета падает здесь на UNIQUE -> AlreadyReserved,
        // транзакция откатывается при drop
        sqlx::query(
            "INSERT INTO reservation_tickets (reservation_id, ticket_id) SELECT $1, UNNEST($2::BIGINT[])"
        )
        .bind(reservation.id)
        .bind(&requested)
        .execute(&mut *tx)
        .await?;

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT t.id, t.row, t.seat, t.performance_id
            FROM reservation_tickets rt
            JOIN tickets t ON t.id = rt.ticket_id
            WHERE rt.reservation_id = $1
            ORDER BY t.id
            "#
        )
        .bind(reservation.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Reservation {} created by user {} for tickets {:?}",
            reservation.id, principal.user_id, requested
        );

        Ok(ReservationListItem {
            id: reservation.id,
            created_at: reservation.created_at,
            tickets,
        })
    }

    /// Только брони вызывающего пользователя - это граница авторизации
    pub async fn list_reservations(&self, principal: &Principal, page: Page) -> Result<Vec<ReservationListItem>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT r.id, r.user_id, r.created_at
            FROM reservations r
            WHERE r.user_id = $1
              AND EXISTS (SELECT 1 FROM reservation_tickets rt WHERE rt.reservation_id = r.id)
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(principal.user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = reservations.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, BoundTicket>(
            r#"
            SELECT rt.reservation_id, t.id, t.row, t.seat, t.performance_id
            FROM reservation_tickets rt
            JOIN tickets t ON t.id = rt.ticket_id
            WHERE rt.reservation_id = ANY($1)
            ORDER BY t.id
            "#
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_tickets(reservations, rows))
    }

    pub async fn get_reservation(&self, principal: &Principal, id: i64) -> Result<ReservationDetail> {
        let reservation = self.owned(principal, id).await?;

        let tickets = sqlx::query_as::<_, TicketDetail>(&ticket_detail_sql(
            "WHERE t.id IN (SELECT ticket_id FROM reservation_tickets WHERE reservation_id = $1) ORDER BY t.id",
        ))
        .bind(reservation.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReservationDetail {
            id: reservation.id,
            created_at: reservation.created_at,
            tickets,
        })
    }

    /// Удаление брони освобождает ее билеты; сами билеты остаются.
    /// Чужая бронь неотличима от несуществующей (404).
    pub async fn delete_reservation(&self, principal: &Principal, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM reservations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(principal.user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("reservation"));
        }

        info!("Reservation {} deleted by user {}", id, principal.user_id);
        Ok(())
    }

    async fn owned(&self, principal: &Principal, id: i64) -> Result<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "SELECT id, user_id, created_at FROM reservations WHERE id = $1 AND user_id = $2"
        )
        .bind(id)
        .bind(principal.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("reservation"))
    }
}
