//! Validation pipeline: structural `garde` rules followed by cross-field
//! rules, collected into one field-keyed error set.

use serde_json::json;

use crate::error::AppError;

/// Field-keyed validation failures, in the order they were found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_report(report: &garde::Report) -> Self {
        let entries = report
            .iter()
            .map(|(path, error)| (path.to_string(), error.message().to_string()))
            .collect();
        Self { entries }
    }

    /// Register a failure under `key`, a field name or an input type name.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.push((key.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m.as_str()))
    }

    /// `Ok` when nothing failed, otherwise a 422 carrying every entry.
    pub fn into_result(self, message: impl Into<String>) -> Result<(), AppError> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let details = self
            .entries
            .into_iter()
            .map(|(field, error)| json!({ "field": field, "error": error }))
            .collect();
        Err(AppError::validation(details, message))
    }
}

/// Run the structural rules of `value`, then `rules` against the same value.
pub fn validate<T, F>(value: &T, rules: F) -> ValidationErrors
where
    T: garde::Validate<Context = ()>,
    F: FnOnce(&T, &mut ValidationErrors),
{
    let mut errors = match value.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(report) => ValidationErrors::from_report(&report),
    };
    rules(value, &mut errors);
    errors
}
