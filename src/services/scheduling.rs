//! Расписание: залы и спектакли.
//!
//! Число свободных мест никогда не хранится - оно считается при каждом чтении
//! как `rows * seats_in_row - (билеты спектакля с живой бронью)`. Билет без
//! брони место не занимает.

use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::performance::available_seats;
use crate::models::{
    NewPerformance, NewTheatreHall, Performance, PerformanceDetail, PerformanceFilter,
    PerformanceListItem, Play, TakenPlace, TheatreHall, TheatreHallDetail,
};
use crate::services::catalog::delete_by_id;
use crate::services::Page;

// Общая часть запроса для списков спектаклей с подсчетом свободных мест
pub(crate) const PERFORMANCE_LIST_SQL: &str = r#"
    SELECT
        p.id,
        pl.title AS play_title,
        h.name AS theatre_hall_name,
        p.show_time,
        h.rows::BIGINT * h.seats_in_row::BIGINT - (
            SELECT COUNT(*)
            FROM tickets t
            JOIN reservation_tickets rt ON rt.ticket_id = t.id
            WHERE t.performance_id = p.id
        ) AS available_seats
    FROM performances p
    JOIN plays pl ON pl.id = p.play_id
    JOIN theatre_halls h ON h.id = p.theatre_hall_id
"#;

/// Спектакли одной пьесы (для карточки пьесы)
pub(crate) async fn performances_of_play(pool: &PgPool, play_id: i64) -> Result<Vec<PerformanceListItem>> {
    let items = sqlx::query_as::<_, PerformanceListItem>(
        &format!("{} WHERE p.play_id = $1 ORDER BY p.show_time, p.id", PERFORMANCE_LIST_SQL)
    )
    .bind(play_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Один спектакль в списочном представлении
async fn performance_item(pool: &PgPool, id: i64) -> Result<PerformanceListItem> {
    sqlx::query_as::<_, PerformanceListItem>(&format!("{} WHERE p.id = $1", PERFORMANCE_LIST_SQL))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("performance"))
}

/// Зал, в котором идет спектакль. Геометрия берется из зала в момент запроса.
pub(crate) async fn hall_of_performance(
    conn: impl sqlx::PgExecutor<'_>,
    performance_id: i64,
) -> Result<Option<TheatreHall>> {
    let hall = sqlx::query_as::<_, TheatreHall>(
        r#"
        SELECT h.id, h.name, h.rows, h.seats_in_row
        FROM performances p
        JOIN theatre_halls h ON h.id = p.theatre_hall_id
        WHERE p.id = $1
        "#
    )
    .bind(performance_id)
    .fetch_optional(conn)
    .await?;

    Ok(hall)
}

#[derive(Clone)]
pub struct SchedulingStore {
    pool: PgPool,
    time_zone: String,
}

impl SchedulingStore {
    pub fn new(pool: PgPool, time_zone: impl Into<String>) -> Self {
        Self { pool, time_zone: time_zone.into() }
    }

    /* ---------- THEATRE HALLS ---------- */

    pub async fn list_halls(&self, page: Page) -> Result<Vec<TheatreHall>> {
        let halls = sqlx::query_as::<_, TheatreHall>(
            "SELECT id, name, rows, seats_in_row FROM theatre_halls ORDER BY id LIMIT $1 OFFSET $2"
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(halls)
    }

    pub async fn get_hall(&self, id: i64) -> Result<TheatreHallDetail> {
        let hall = sqlx::query_as::<_, TheatreHall>(
            "SELECT id, name, rows, seats_in_row FROM theatre_halls WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("theatre hall"))?;

        Ok(hall.into())
    }

    // rows/seats_in_row >= 1 проверяем здесь, а не при создании билетов
    pub async fn create_hall(&self, new_hall: NewTheatreHall) -> Result<TheatreHall> {
        new_hall.validate()?;

        let hall = sqlx::query_as::<_, TheatreHall>(
            "INSERT INTO theatre_halls (name, rows, seats_in_row) VALUES ($1, $2, $3)
             RETURNING id, name, rows, seats_in_row"
        )
        .bind(&new_hall.name)
        .bind(new_hall.rows)
        .bind(new_hall.seats_in_row)
        .fetch_one(&self.pool)
        .await?;

        info!("Theatre hall {} created ({}x{})", hall.id, hall.rows, hall.seats_in_row);
        Ok(hall)
    }

    // Спектакли зала удаляются каскадом
    pub async fn delete_hall(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "theatre_halls", "theatre hall", id).await
    }

    /* ---------- PERFORMANCES ---------- */

    pub async fn list_performances(
        &self,
        filter: &PerformanceFilter,
        page: Page,
    ) -> Result<Vec<PerformanceListItem>> {
        let sql = format!(
            r#"{}
            WHERE ($1::BIGINT[] IS NULL OR p.play_id = ANY($1))
              AND ($2::DATE IS NULL OR (p.show_time AT TIME ZONE $3)::DATE = $2)
            ORDER BY p.show_time, p.id
            LIMIT $4 OFFSET $5"#,
            PERFORMANCE_LIST_SQL
        );

        let items = sqlx::query_as::<_, PerformanceListItem>(&sql)
            .bind(filter.play_ids.as_deref())
            .bind(filter.date)
            .bind(&self.time_zone)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn get_performance(&self, id: i64) -> Result<PerformanceDetail> {
        let performance = sqlx::query_as::<_, Performance>(
            "SELECT id, play_id, theatre_hall_id, show_time FROM performances WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("performance"))?;

        let play = sqlx::query_as::<_, Play>("SELECT id, title, description FROM plays WHERE id = $1")
            .bind(performance.play_id)
            .fetch_one(&self.pool)
            .await?;

        let hall = sqlx::query_as::<_, TheatreHall>(
            "SELECT id, name, rows, seats_in_row FROM theatre_halls WHERE id = $1"
        )
        .bind(performance.theatre_hall_id)
        .fetch_one(&self.pool)
        .await?;

        let taken_places = self.taken_places(id).await?;
        let available = available_seats(hall.capacity(), taken_places.len() as i64);

        Ok(PerformanceDetail {
            id: performance.id,
            show_time: performance.show_time,
            play,
            theatre_hall: hall.into(),
            available_seats: available,
            taken_places,
        })
    }

    /// Места, занятые живыми бронями
    pub async fn taken_places(&self, performance_id: i64) -> Result<Vec<TakenPlace>> {
        let places = sqlx::query_as::<_, TakenPlace>(
            r#"
            SELECT t.row, t.seat
            FROM tickets t
            JOIN reservation_tickets rt ON rt.ticket_id = t.id
            WHERE t.performance_id = $1
            ORDER BY t.row, t.seat
            "#
        )
        .bind(performance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(places)
    }

    pub async fn available_seats(&self, performance_id: i64) -> Result<i64> {
        Ok(performance_item(&self.pool, performance_id).await?.available_seats)
    }

    pub async fn create_performance(&self, new_performance: NewPerformance) -> Result<Performance> {
        let play_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM plays WHERE id = $1)")
            .bind(new_performance.play)
            .fetch_one(&self.pool)
            .await?;
        if !play_exists {
            return Err(AppError::field(
                "play",
                format!("Invalid pk \"{}\" - object does not exist.", new_performance.play),
            ));
        }

        let hall_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM theatre_halls WHERE id = $1)"
        )
        .bind(new_performance.theatre_hall)
        .fetch_one(&self.pool)
        .await?;
        if !hall_exists {
            return Err(AppError::field(
                "theatre_hall",
                format!("Invalid pk \"{}\" - object does not exist.", new_performance.theatre_hall),
            ));
        }

        // если play/зал удалят между проверкой и вставкой - сработает FK и AppError
        let performance = sqlx::query_as::<_, Performance>(
            "INSERT INTO performances (play_id, theatre_hall_id, show_time) VALUES ($1, $2, $3)
             RETURNING id, play_id, theatre_hall_id, show_time"
        )
        .bind(new_performance.play)
        .bind(new_performance.theatre_hall)
        .bind(new_performance.show_time)
        .fetch_one(&self.pool)
        .await?;

        info!("Performance {} scheduled at {}", performance.id, performance.show_time);
        Ok(performance)
    }

    // Билеты спектакля (и их привязки к броням) удаляются каскадом
    pub async fn delete_performance(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "performances", "performance", id).await
    }
}
