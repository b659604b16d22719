use serde_json::Value;

use super::models::BookForUpdate;
use crate::patch::Patchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Description,
}

impl Patchable for BookForUpdate {
    type Field = BookField;

    fn resolve(token: &str) -> Option<BookField> {
        if token.eq_ignore_ascii_case("title") {
            Some(BookField::Title)
        } else if token.eq_ignore_ascii_case("description") {
            Some(BookField::Description)
        } else {
            None
        }
    }

    fn read(&self, field: BookField) -> Value {
        let value = match field {
            BookField::Title => &self.title,
            BookField::Description => &self.description,
        };
        value.clone().map_or(Value::Null, Value::String)
    }

    fn write(&mut self, field: BookField, value: Value) -> Result<(), String> {
        let value = match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => return Err(format!("expected a string or null, found {}", other)),
        };
        match field {
            BookField::Title => self.title = value,
            BookField::Description => self.description = value,
        }
        Ok(())
    }

    fn reset(&mut self, field: BookField) {
        match field {
            BookField::Title => self.title = None,
            BookField::Description => self.description = None,
        }
    }
}
