use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TheatreHall {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

impl TheatreHall {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TheatreHallDetail {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub capacity: i64,
}

impl From<TheatreHall> for TheatreHallDetail {
    fn from(hall: TheatreHall) -> Self {
        let capacity = hall.capacity();
        TheatreHallDetail {
            id: hall.id,
            name: hall.name,
            rows: hall.rows,
            seats_in_row: hall.seats_in_row,
            capacity,
        }
    }
}

fn default_dimension() -> i32 {
    10
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewTheatreHall {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters long"))]
    pub name: String,
    #[serde(default = "default_dimension")]
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub rows: i32,
    #[serde(default = "default_dimension")]
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub seats_in_row: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_rows_times_seats() {
        let hall = TheatreHall { id: 1, name: "Blue".into(), rows: 12, seats_in_row: 20 };
        assert_eq!(hall.capacity(), 240);
        assert_eq!(TheatreHallDetail::from(hall).capacity, 240);
    }

    #[test]
    fn zero_rows_fail_at_hall_creation() {
        let hall = NewTheatreHall { name: "Empty".into(), rows: 0, seats_in_row: 5 };
        let errors = hall.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("rows"));
        assert!(!fields.contains_key("seats_in_row"));
    }

    #[test]
    fn dimensions_default_to_ten() {
        let hall: NewTheatreHall = serde_json::from_str(r#"{"name": "Red"}"#).unwrap();
        assert_eq!((hall.rows, hall.seats_in_row), (10, 10));
        assert!(hall.validate().is_ok());
    }
}
