//! Genre catalogue and `genreIds` payload parsing.

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;

use crate::{store::BlogStore, Genre, GenreWithCount};

/// Why a `genreIds` payload could not be turned into a list of ids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenreIdsError {
    /// A string payload that does not parse as JSON.
    #[error("genre ids are not valid JSON: {0}")]
    InvalidJson(String),
    /// Neither a list nor a single id.
    #[error("expected a list of genre ids, got {0}")]
    UnexpectedShape(String),
    /// An element that is not a positive integer.
    #[error("invalid genre id {0}")]
    InvalidId(String),
}

/// Parse a `genreIds` payload.
///
/// Accepts a JSON array, a JSON-encoded string holding an array (form
/// uploads send `"[1,2]"`), or a single id. Ids may be numbers or numeric
/// strings and must be positive. The result is sorted and deduplicated.
pub fn parse_genre_ids(raw: &Value) -> Result<Vec<i64>, GenreIdsError> {
    let mut ids = match raw {
        Value::String(text) => {
            let decoded: Value = serde_json::from_str(text.trim())
                .map_err(|err| GenreIdsError::InvalidJson(err.to_string()))?;
            if decoded.is_string() {
                return Err(GenreIdsError::UnexpectedShape(decoded.to_string()));
            }
            ids_from_value(&decoded)?
        },
        other => ids_from_value(other)?,
    };
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn ids_from_value(value: &Value) -> Result<Vec<i64>, GenreIdsError> {
    match value {
        Value::Array(items) => items.iter().map(genre_id).collect(),
        Value::Number(_) => Ok(vec![genre_id(value)?]),
        other => Err(GenreIdsError::UnexpectedShape(other.to_string())),
    }
}

fn genre_id(value: &Value) -> Result<i64, GenreIdsError> {
    let id = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
        .ok_or_else(|| GenreIdsError::InvalidId(value.to_string()))
}

impl BlogStore {
    /// All genres with the number of linked articles, ordered by name.
    pub async fn list_genres(&self) -> Result<Vec<GenreWithCount>> {
        sqlx::query_as::<_, GenreWithCount>(
            "SELECT g.id, g.name, COUNT(ag.article_id) AS article_count \
             FROM genres g LEFT JOIN article_genres ag ON ag.genre_id = g.id \
             GROUP BY g.id, g.name ORDER BY g.name",
        )
        .fetch_all(self.pool())
        .await
        .context("failed to list genres")
    }

    /// Insert a genre; `None` when the name is already taken.
    pub async fn create_genre(&self, name: &str) -> Result<Option<Genre>> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES (?) ON CONFLICT(name) DO NOTHING RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_optional(self.pool())
        .await
        .with_context(|| format!("failed to create genre {name}"))
    }

    /// The genre called `name`, inserted first when missing.
    pub async fn find_or_create_genre(&self, name: &str) -> Result<Genre> {
        if let Some(genre) = self.create_genre(name).await? {
            return Ok(genre);
        }
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE name = ?")
            .bind(name.trim())
            .fetch_one(self.pool())
            .await
            .with_context(|| format!("failed to load genre {name}"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_genre_ids, GenreIdsError};

    #[test]
    fn accepts_arrays_strings_and_single_ids() {
        assert_eq!(parse_genre_ids(&json!([3, 1, 3])), Ok(vec![1, 3]));
        assert_eq!(parse_genre_ids(&json!(" [2, \"5\"] ")), Ok(vec![2, 5]));
        assert_eq!(parse_genre_ids(&json!("[]")), Ok(vec![]));
        assert_eq!(parse_genre_ids(&json!(7)), Ok(vec![7]));
        assert_eq!(parse_genre_ids(&json!("4")), Ok(vec![4]));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            parse_genre_ids(&json!("[1, 2")),
            Err(GenreIdsError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_genre_ids(&json!({"id": 1})),
            Err(GenreIdsError::UnexpectedShape(_))
        ));
        assert!(matches!(
            parse_genre_ids(&json!("\"[1]\"")),
            Err(GenreIdsError::UnexpectedShape(_))
        ));
        assert!(matches!(
            parse_genre_ids(&json!([1, "abc"])),
            Err(GenreIdsError::InvalidId(_))
        ));
        assert!(matches!(parse_genre_ids(&json!([0])), Err(GenreIdsError::InvalidId(_))));
        assert!(matches!(parse_genre_ids(&json!(null)), Err(GenreIdsError::UnexpectedShape(_))));
    }
}
