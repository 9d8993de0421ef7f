use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Actor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Для списка: полное имя и названия пьес собираются одним запросом
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActorListItem {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub plays: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewActor {
    #[validate(length(min = 1, max = 75, message = "first_name must be 1-75 characters long"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 75, message = "last_name must be 1-75 characters long"))]
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_first_and_last() {
        let actor = Actor { id: 1, first_name: "Jason".into(), last_name: "Statham".into() };
        assert_eq!(actor.full_name(), "Jason Statham");
    }

    #[test]
    fn blank_names_are_rejected() {
        let actor = NewActor { first_name: String::new(), last_name: "Bob".into() };
        let errors = actor.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }
}
