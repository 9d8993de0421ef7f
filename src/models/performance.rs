use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Play, TheatreHallDetail};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Performance {
    pub id: i64,
    #[serde(rename = "play")]
    pub play_id: i64,
    #[serde(rename = "theatre_hall")]
    pub theatre_hall_id: i64,
    pub show_time: DateTime<Utc>,
}

/// Спектакль в списке: названия вместо id и число свободных мест
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PerformanceListItem {
    pub id: i64,
    #[serde(rename = "play")]
    pub play_title: String,
    #[serde(rename = "theatre_hall")]
    pub theatre_hall_name: String,
    pub show_time: DateTime<Utc>,
    pub available_seats: i64,
}

#[derive(Debug, Clone, Copy, FromRow, Serialize, PartialEq, Eq)]
pub struct TakenPlace {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceDetail {
    pub id: i64,
    pub show_time: DateTime<Utc>,
    pub play: Play,
    pub theatre_hall: TheatreHallDetail,
    pub available_seats: i64,
    pub taken_places: Vec<TakenPlace>,
}

#[derive(Debug, Deserialize)]
pub struct NewPerformance {
    pub play: i64,
    pub theatre_hall: i64,
    pub show_time: DateTime<Utc>,
}

/// Свободные места = вместимость зала - билеты с живой бронью
pub fn available_seats(capacity: i64, reserved_tickets: i64) -> i64 {
    capacity - reserved_tickets
}

/// Фильтр списка спектаклей: `?play=1,2&date=2024-12-20`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceFilter {
    pub play_ids: Option<Vec<i64>>,
    pub date: Option<NaiveDate>,
}

impl PerformanceFilter {
    pub fn parse(play: Option<&str>, date: Option<&str>) -> Result<Self> {
        let play_ids = match play.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let ids = raw
                    .split(',')
                    .map(|id| id.trim().parse::<i64>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| {
                        AppError::field("play", "play must be a comma-separated list of ids")
                    })?;
                Some(ids)
            }
            None => None,
        };

        let date = match date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::field("date", "date must be in YYYY-MM-DD format"))?,
            ),
            None => None,
        };

        Ok(PerformanceFilter { play_ids, date })
    }
}
