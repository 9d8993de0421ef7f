use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Genre, PerformanceListItem};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Play {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// Пьеса в списке: имена актеров и жанры уже денормализованы
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlayListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActorSummary {
    pub id: i64,
    pub full_name: String,
}

/// Полная карточка пьесы со спектаклями и свободными местами
#[derive(Debug, Clone, Serialize)]
pub struct PlayDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub actors: Vec<ActorSummary>,
    pub genres: Vec<Genre>,
    pub performances: Vec<PerformanceListItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPlay {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters long"))]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub actors: Vec<i64>,
    #[serde(default)]
    pub genres: Vec<i64>,
}
