//! Ошибки приложения и их отображение в HTTP-ответы.
//!
//! Все ответы об ошибках - JSON. Ошибки валидации и нарушения уникальности
//! всегда содержат поле, из-за которого запрос отклонен: `{"seat": "..."}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;

/// Ошибки по полям: поле -> сообщение
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Место или ряд вне геометрии зала
    #[error("{field} must be in the range [1, {max}]")]
    OutOfRange { field: &'static str, max: i32 },

    #[error("row {row}, seat {seat} is already taken for this performance")]
    DuplicateSeat { row: i32, seat: i32 },

    #[error("{}", already_reserved_message(.0))]
    AlreadyReserved(Option<i64>),

    /// Нарушение уникальности в каталоге / пользователях
    #[error("{message}")]
    Duplicate { field: &'static str, message: String },

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

fn already_reserved_message(ticket_id: &Option<i64>) -> String {
    match ticket_id {
        Some(id) => format!("ticket {} is already reserved", id),
        None => "one or more tickets are already reserved".to_string(),
    }
}

impl AppError {
    /// Ошибка валидации по одному полю
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.into());
        AppError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::OutOfRange { .. }
            | AppError::DuplicateSeat { .. }
            | AppError::AlreadyReserved(_)
            | AppError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Redis(_) | AppError::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> serde_json::Value {
        let single = |field: &str| {
            let mut errors = FieldErrors::new();
            errors.insert(field.to_string(), self.to_string());
            json!(errors)
        };

        match self {
            AppError::Validation(errors) => json!(errors),
            AppError::OutOfRange { field, .. } => single(field),
            AppError::DuplicateSeat { .. } => single("seat"),
            AppError::AlreadyReserved(_) => single("tickets"),
            AppError::Duplicate { field, .. } => single(field),
            AppError::Unauthenticated(_) | AppError::Forbidden => json!({ "detail": self.to_string() }),
            AppError::NotFound(_) => json!({ "detail": self.to_string() }),
            AppError::Token(_) => json!({ "detail": "Given token not valid for any token type" }),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "detail": "Database error" })
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                json!({ "detail": "Token store unavailable" })
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {:?}", e);
                json!({ "detail": "Internal error" })
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

// Нарушения ограничений БД превращаем в ошибки с именем поля.
// Так гонки, проскочившие мимо предварительной проверки, все равно дают 400.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let (unique, foreign_key, constraint) = match &err {
            sqlx::Error::Database(db) => (
                db.is_unique_violation(),
                db.is_foreign_key_violation(),
                db.constraint().map(str::to_owned).unwrap_or_default(),
            ),
            _ => return AppError::Database(err),
        };

        if unique {
            let (field, message) = match constraint.as_str() {
                "actors_first_name_key" => ("first_name", "actor with this first name already exists."),
                "actors_last_name_key" => ("last_name", "actor with this last name already exists."),
                "genres_name_key" => ("name", "genre with this name already exists."),
                "users_username_key" => ("username", "A user with that username already exists."),
                "tickets_performance_row_seat_key" => {
                    ("seat", "ticket with this performance, row and seat already exists.")
                }
                "reservation_tickets_ticket_id_key" => return AppError::AlreadyReserved(None),
                _ => return AppError::Database(err),
            };
            return AppError::Duplicate { field, message: message.to_string() };
        }

        if foreign_key {
            let field = match constraint.as_str() {
                "performances_play_id_fkey" => "play",
                "performances_theatre_hall_id_fkey" => "theatre_hall",
                "tickets_performance_id_fkey" => "performance",
                "plays_actors_actor_id_fkey" => "actors",
                "plays_genres_genre_id_fkey" => "genres",
                "reservation_tickets_ticket_id_fkey" => "tickets",
                "reservations_user_id_fkey" => return AppError::Unauthenticated("User not found"),
                _ => return AppError::Database(err),
            };
            return AppError::field(field, "Invalid pk - object does not exist.");
        }

        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", first.code));
                fields.insert(field.to_string(), message);
            }
        }
        AppError::Validation(fields)
    }
}

/// Ключ для ошибок, не привязанных к конкретному полю
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

// "Failed to deserialize query string: page: invalid digit" -> "page: invalid digit"
fn rejection_detail(text: &str) -> &str {
    text.split_once(": ").map_or(text, |(_, detail)| detail)
}

fn strip_position(detail: &str) -> &str {
    match detail.rfind(" at line ") {
        Some(idx) => &detail[..idx],
        None => detail,
    }
}

/// Ошибку serde (`path: message` или `missing field ...`) привязываем к полю верхнего уровня
fn deserialize_error(detail: &str) -> AppError {
    let detail = strip_position(detail);

    if let Some(field) = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return AppError::field(field, "This field is required.");
    }

    match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            let field = path.split(['.', '[']).next().unwrap_or(path);
            AppError::field(field, message)
        }
        _ => AppError::field(NON_FIELD_ERRORS, detail),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => deserialize_error(rejection_detail(&e.body_text())),
            other => AppError::field(NON_FIELD_ERRORS, other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        match rejection {
            QueryRejection::FailedToDeserializeQueryString(e) => {
                deserialize_error(rejection_detail(&e.body_text()))
            }
            other => AppError::field(NON_FIELD_ERRORS, other.body_text()),
        }
    }
}

// /plays/abc - такого объекта нет
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::NotFound("object")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_the_field() {
        let err = AppError::OutOfRange { field: "seat", max: 12 };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({ "seat": "seat must be in the range [1, 12]" }));
    }

    #[test]
    fn already_reserved_is_a_tickets_error() {
        let err = AppError::AlreadyReserved(Some(7));
        assert_eq!(err.body(), json!({ "tickets": "ticket 7 is already reserved" }));

        let err = AppError::AlreadyReserved(None);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            AppError::Unauthenticated("Authentication credentials were not provided.").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("reservation").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_is_not_a_constraint_error() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
    }

    fn field_of(err: AppError) -> (String, String) {
        match err {
            AppError::Validation(fields) => fields.into_iter().next().unwrap(),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn type_errors_are_keyed_by_path() {
        let (field, message) = field_of(deserialize_error(
            "row: invalid type: string \"x\", expected i32 at line 1 column 25",
        ));
        assert_eq!(field, "row");
        assert_eq!(message, "invalid type: string \"x\", expected i32");

        let (field, _) = field_of(deserialize_error("tickets[1]: invalid type: string \"a\", expected i64"));
        assert_eq!(field, "tickets");
    }

    #[test]
    fn missing_fields_are_required() {
        let (field, message) = field_of(deserialize_error("missing field `row` at line 1 column 27"));
        assert_eq!(field, "row");
        assert_eq!(message, "This field is required.");
    }

    #[test]
    fn root_errors_have_no_field() {
        let (field, _) = field_of(deserialize_error("invalid type: sequence, expected struct NewTicket"));
        assert_eq!(field, NON_FIELD_ERRORS);
    }

    #[test]
    fn rejection_prefix_is_dropped() {
        assert_eq!(
            rejection_detail("Failed to deserialize query string: page: invalid digit found in string"),
            "page: invalid digit found in string"
        );
    }
}
