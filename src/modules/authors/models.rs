use library_db::Author;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// Output representation of an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: Uuid,
    /// First and last name joined by a space
    pub name: String,
    /// Age in whole years on the day the representation was built
    pub age: i32,
    pub genre: String,
}

impl AuthorDto {
    pub fn from_entity(author: &Author, today: Date) -> Self {
        Self {
            id: author.id,
            name: format!("{} {}", author.first_name, author.last_name),
            age: age_on(author.date_of_birth, today),
            genre: author.genre.clone(),
        }
    }
}

/// Request model for creating an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorForCreation {
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: Date,
    pub genre: String,
}

impl AuthorForCreation {
    pub fn into_entity(self, id: Uuid) -> Author {
        Author {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            genre: self.genre,
        }
    }
}

/// Completed years between `date_of_birth` and `today`.
pub fn age_on(date_of_birth: Date, today: Date) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    let birthday_pending = (u8::from(today.month()), today.day())
        < (u8::from(date_of_birth.month()), date_of_birth.day());
    if birthday_pending {
        age -= 1;
    }
    age
}
