//! Decoding of comma-separated id lists carried in a single path segment,
//! e.g. `/authorscollection/(3d24...,7ab1...)`.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdListError {
    #[error("id list must be wrapped in parentheses")]
    NotGrouped,

    #[error("'{token}' is not a valid id: {reason}")]
    InvalidId { token: String, reason: String },
}

/// Decode a raw list with an explicit element parser.
///
/// Returns `Ok(None)` when `raw` is blank. Entries that are empty before
/// trimming (`"a,,b"`) are skipped; every other entry is trimmed and parsed,
/// and the first entry that fails to parse fails the whole list.
pub fn decode_id_list<T, E, F>(raw: &str, mut parse: F) -> Result<Option<Vec<T>>, IdListError>
where
    F: FnMut(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    if raw.trim().is_empty() {
        return Ok(None);
    }

    raw.split(',')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let token = entry.trim();
            parse(token).map_err(|err| IdListError::InvalidId {
                token: token.to_string(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

/// [`decode_id_list`] using the element type's [`FromStr`] representation.
pub fn decode_ids<T>(raw: &str) -> Result<Option<Vec<T>>, IdListError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    decode_id_list(raw, T::from_str)
}

/// Strip the `(` `)` group around a path segment.
pub fn ungroup(segment: &str) -> Result<&str, IdListError> {
    segment
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or(IdListError::NotGrouped)
}
