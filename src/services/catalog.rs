use sqlx::{PgConnection, PgPool};
use std::collections::BTreeSet;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::play::ActorSummary;
use crate::models::{
    Actor, ActorListItem, Genre, NewActor, NewGenre, NewPlay, Play, PlayDetail, PlayListItem,
};
use crate::services::{scheduling, Page};

/// Каталог: пьесы, актеры, жанры и связи между ними
#[derive(Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

/// Убирает повторы, результат отсортирован по id
pub(crate) fn unique_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Первый запрошенный id, которого нет среди найденных
pub(crate) fn first_missing(requested: &[i64], found: &[i64]) -> Option<i64> {
    requested.iter().copied().find(|id| !found.contains(id))
}

pub(crate) fn invalid_pk(field: &str, id: i64) -> AppError {
    AppError::field(field, format!("Invalid pk \"{}\" - object does not exist.", id))
}

// Проверяем, что все id существуют, до записи связей
async fn ensure_exist(conn: &mut PgConnection, table: &str, field: &str, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!("SELECT id FROM {} WHERE id = ANY($1)", table);
    let found: Vec<i64> = sqlx::query_scalar(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    match first_missing(ids, &found) {
        Some(id) => Err(invalid_pk(field, id)),
        None => Ok(()),
    }
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /* ---------- PLAYS ---------- */

    pub async fn list_plays(&self, page: Page) -> Result<Vec<PlayListItem>> {
        // имена актеров и жанры собираем подзапросами, без запроса на каждую пьесу
        let plays = sqlx::query_as::<_, PlayListItem>(
            r#"
            SELECT
                p.id,
                p.title,
                p.description,
                ARRAY(
                    SELECT a.first_name || ' ' || a.last_name
                    FROM plays_actors pa
                    JOIN actors a ON a.id = pa.actor_id
                    WHERE pa.play_id = p.id
                    ORDER BY a.id
                ) AS actors,
                ARRAY(
                    SELECT g.name::TEXT
                    FROM plays_genres pg
                    JOIN genres g ON g.id = pg.genre_id
                    WHERE pg.play_id = p.id
                    ORDER BY g.id
                ) AS genres
            FROM plays p
            ORDER BY p.id
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(plays)
    }

    pub async fn get_play(&self, id: i64) -> Result<PlayDetail> {
        let play = sqlx::query_as::<_, Play>("SELECT id, title, description FROM plays WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("play"))?;

        let actors = sqlx::query_as::<_, ActorSummary>(
            r#"
            SELECT a.id, a.first_name || ' ' || a.last_name AS full_name
            FROM plays_actors pa
            JOIN actors a ON a.id = pa.actor_id
            WHERE pa.play_id = $1
            ORDER BY a.id
            "#
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM plays_genres pg
            JOIN genres g ON g.id = pg.genre_id
            WHERE pg.play_id = $1
            ORDER BY g.id
            "#
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let performances = scheduling::performances_of_play(&self.pool, id).await?;

        Ok(PlayDetail {
            id: play.id,
            title: play.title,
            description: play.description,
            actors,
            genres,
            performances,
        })
    }

    pub async fn create_play(&self, new_play: NewPlay) -> Result<PlayDetail> {
        new_play.validate()?;
        let actor_ids = unique_ids(&new_play.actors);
        let genre_ids = unique_ids(&new_play.genres);

        let mut tx = self.pool.begin().await?;

        ensure_exist(&mut tx, "actors", "actors", &actor_ids).await?;
        ensure_exist(&mut tx, "genres", "genres", &genre_ids).await?;

        let play_id: i64 = sqlx::query_scalar(
            "INSERT INTO plays (title, description) VALUES ($1, $2) RETURNING id"
        )
        .bind(&new_play.title)
        .bind(&new_play.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO plays_actors (play_id, actor_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(play_id)
            .bind(&actor_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO plays_genres (play_id, genre_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(play_id)
            .bind(&genre_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Play {} created", play_id);

        self.get_play(play_id).await
    }

    pub async fn delete_play(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "plays", "play", id).await
    }

    /* ---------- ACTORS ---------- */

    pub async fn list_actors(&self, page: Page) -> Result<Vec<ActorListItem>> {
        let actors = sqlx::query_as::<_, ActorListItem>(
            &format!("{} ORDER BY a.id LIMIT $1 OFFSET $2", ACTOR_LIST_SQL)
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(actors)
    }

    pub async fn get_actor(&self, id: i64) -> Result<ActorListItem> {
        sqlx::query_as::<_, ActorListItem>(&format!("{} WHERE a.id = $1", ACTOR_LIST_SQL))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("actor"))
    }

    pub async fn create_actor(&self, new_actor: NewActor) -> Result<Actor> {
        new_actor.validate()?;

        // уникальность имени и фамилии проверяет БД, ошибку маппит AppError
        let actor = sqlx::query_as::<_, Actor>(
            "INSERT INTO actors (first_name, last_name) VALUES ($1, $2)
             RETURNING id, first_name, last_name"
        )
        .bind(&new_actor.first_name)
        .bind(&new_actor.last_name)
        .fetch_one(&self.pool)
        .await?;

        info!("Actor {} created: {}", actor.id, actor.full_name());
        Ok(actor)
    }

    pub async fn delete_actor(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "actors", "actor", id).await
    }

    /* ---------- GENRES ---------- */

    pub async fn list_genres(&self, page: Page) -> Result<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres ORDER BY id LIMIT $1 OFFSET $2"
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    pub async fn get_genre(&self, id: i64) -> Result<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("genre"))
    }

    pub async fn create_genre(&self, new_genre: NewGenre) -> Result<Genre> {
        new_genre.validate()?;

        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES ($1) RETURNING id, name"
        )
        .bind(&new_genre.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(genre)
    }

    pub async fn delete_genre(&self, id: i64) -> Result<()> {
        delete_by_id(&self.pool, "genres", "genre", id).await
    }
}

const ACTOR_LIST_SQL: &str = r#"
    SELECT
        a.id,
        a.first_name,
        a.last_name,
        a.first_name || ' ' || a.last_name AS full_name,
        ARRAY(
            SELECT p.title::TEXT
            FROM plays_actors pa
            JOIN plays p ON p.id = pa.play_id
            WHERE pa.actor_id = a.id
            ORDER BY p.id
        ) AS plays
    FROM actors a
"#;

// DELETE по id; 0 строк -> 404
pub(crate) async fn delete_by_id(pool: &PgPool, table: &str, resource: &'static str, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = $1", table);
    let deleted = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(resource));
    }
    info!("Deleted {} {}", resource, id);
    Ok(())
}
