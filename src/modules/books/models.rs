use garde::Validate;
use library_db::Book;
use library_http::{validation, AppError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_REQUIRED: &str = "You should fill out a title.";
pub const DESCRIPTION_EQUALS_TITLE: &str =
    "The provided book description should be different from the book title.";

/// Output representation of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

impl From<&Book> for BookDto {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            author_id: book.author_id,
            title: book.title.clone(),
            description: book.description.clone(),
        }
    }
}

/// Request model for creating a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookForCreation {
    #[serde(default)]
    #[garde(custom(title_is_present), length(chars, max = 100))]
    pub title: Option<String>,
    #[serde(default)]
    #[garde(length(chars, max = 500))]
    pub description: Option<String>,
}

/// Request model for replacing a book, and the shape PATCH operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookForUpdate {
    #[serde(default)]
    #[garde(custom(title_is_present), length(chars, max = 100))]
    pub title: Option<String>,
    #[serde(default)]
    #[garde(length(chars, max = 500))]
    pub description: Option<String>,
}

fn title_is_present(title: &Option<String>, _ctx: &()) -> garde::Result {
    match title.as_deref() {
        Some(title) if !title.trim().is_empty() => Ok(()),
        _ => Err(garde::Error::new(TITLE_REQUIRED)),
    }
}

/// Fields shared by the book input models.
pub trait BookInput: Validate<Context = ()> {
    /// Key under which input-level (cross-field) failures are reported
    const INPUT_NAME: &'static str;

    fn title(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
}

impl BookInput for BookForCreation {
    const INPUT_NAME: &'static str = "BookForCreation";

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl BookInput for BookForUpdate {
    const INPUT_NAME: &'static str = "BookForUpdate";

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Structural rules plus "description must differ from title"; 422 on failure.
pub fn validate_book<T: BookInput>(input: &T) -> Result<(), AppError> {
    validation::validate(input, |input, errors| {
        if input.description() == input.title() {
            errors.add(T::INPUT_NAME, DESCRIPTION_EQUALS_TITLE);
        }
    })
    .into_result("the book is invalid")
}

impl BookForCreation {
    pub fn into_entity(self, id: Uuid, author_id: Uuid) -> Book {
        Book {
            id,
            author_id,
            title: self.title.unwrap_or_default(),
            description: self.description,
        }
    }
}

impl BookForUpdate {
    pub fn from_entity(book: &Book) -> Self {
        Self {
            title: Some(book.title.clone()),
            description: book.description.clone(),
        }
    }

    pub fn into_entity(self, id: Uuid, author_id: Uuid) -> Book {
        Book {
            id,
            author_id,
            title: self.title.unwrap_or_default(),
            description: self.description,
        }
    }

    /// Overwrite every mutable field of `book`; identity is kept.
    pub fn apply_to(self, book: &mut Book) {
        book.title = self.title.unwrap_or_default();
        book.description = self.description;
    }
}
