use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView { id: user.id, username: user.username.clone(), is_staff: user.is_staff }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, max = 150, message = "username must be 1-150 characters long"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters long"))]
    pub password: String,
}

impl User {
    // Найти пользователя по username
    pub async fn find_by_username(username: &str, db: &Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_staff, created_at FROM users WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn find_by_id(id: i64, db: &Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_staff, created_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn create(
        username: &str,
        password_hash: &str,
        is_staff: bool,
        db: &Database,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, is_staff)
             VALUES ($1, $2, $3)
             RETURNING id, username, password_hash, is_staff, created_at"
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .fetch_one(&db.pool)
        .await
    }

    // Создать админа или повысить существующего; пароль перезаписываем
    pub async fn upsert_admin(username: &str, password_hash: &str, db: &Database) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, is_staff)
             VALUES ($1, $2, TRUE)
             ON CONFLICT (username) DO UPDATE
             SET password_hash = EXCLUDED.password_hash, is_staff = TRUE
             RETURNING id, username, password_hash, is_staff, created_at"
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&db.pool)
        .await
    }
}
