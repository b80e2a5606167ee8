//! A single JSON document collection

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;

/// Storage failures; every variant is fatal to a run
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document {id} already exists in '{collection}'")]
    DuplicateKey { collection: String, id: i64 },

    #[error("No document {id} in '{collection}'")]
    MissingTarget { collection: String, id: i64 },

    #[error("Document has no integer 'id' field")]
    MissingId,

    #[error("Invalid collection or field name: '{0}'")]
    InvalidName(String),
}

/// Collection and field names end up inside SQL text, so they are restricted
/// to identifier characters
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct Statements {
    insert: String,
    set_field: String,
    max_id: String,
    count: String,
    clear: String,
    find_one: String,
    select_ids: String,
    select_docs: String,
    select_field: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            insert: format!(r#"INSERT INTO "{table}" (id, doc) VALUES (?, ?)"#),
            set_field: format!(r#"UPDATE "{table}" SET doc = json_set(doc, ?, json(?)) WHERE id = ?"#),
            max_id: format!(r#"SELECT MAX(id) FROM "{table}""#),
            count: format!(r#"SELECT COUNT(*) FROM "{table}""#),
            clear: format!(r#"DELETE FROM "{table}""#),
            find_one: format!(r#"SELECT doc FROM "{table}" WHERE id = ?"#),
            select_ids: format!(r#"SELECT id FROM "{table}" ORDER BY id"#),
            select_docs: format!(r#"SELECT doc FROM "{table}" ORDER BY id"#),
            select_field: format!(r#"SELECT id, doc -> ? FROM "{table}" ORDER BY id"#),
        }
    }
}

/// Handle to one collection table
#[derive(Debug, Clone)]
pub struct Collection {
    pool: SqlitePool,
    name: String,
    sql: Statements,
}

impl Collection {
    /// Open the collection, creating its table on first use
    pub async fn open(pool: &SqlitePool, name: &str) -> Result<Self, StoreError> {
        if !is_valid_identifier(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{name}" (
                id INTEGER PRIMARY KEY,
                doc TEXT NOT NULL
            )
            "#
        ))
        .execute(pool)
        .await?;

        Ok(Self {
            pool: pool.clone(),
            name: name.to_string(),
            sql: Statements::for_table(name),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a document keyed by its `id` field
    ///
    /// Fails with `DuplicateKey` when the id is already present.
    pub async fn insert(&self, doc: &Value) -> Result<(), StoreError> {
        let id = doc
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(StoreError::MissingId)?;

        let result = sqlx::query(&self.sql.insert)
            .bind(id)
            .bind(doc.to_string())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed") =>
            {
                Err(StoreError::DuplicateKey {
                    collection: self.name.clone(),
                    id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set one top-level field of an existing document
    ///
    /// Fails with `MissingTarget` when no document has the id.
    pub async fn set_field(&self, id: i64, field: &str, value: &Value) -> Result<(), StoreError> {
        if !is_valid_identifier(field) {
            return Err(StoreError::InvalidName(field.to_string()));
        }

        let result = sqlx::query(&self.sql.set_field)
            .bind(format!("$.{field}"))
            .bind(value.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingTarget {
                collection: self.name.clone(),
                id,
            });
        }
        Ok(())
    }

    /// Greatest id in the collection, `None` when empty
    pub async fn max_id(&self) -> Result<Option<i64>, StoreError> {
        let max = sqlx::query_scalar::<_, Option<i64>>(&self.sql.max_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(&self.sql.count)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Remove every document, returning how many were removed
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(&self.sql.clear).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<Value>, StoreError> {
        let raw = sqlx::query_scalar::<_, String>(&self.sql.find_one)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(|doc| serde_json::from_str(&doc).map_err(StoreError::from))
            .transpose()
    }

    /// Ids in ascending order
    pub fn stream_ids(&self) -> BoxStream<'_, Result<i64, StoreError>> {
        sqlx::query_scalar::<_, i64>(&self.sql.select_ids)
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .boxed()
    }

    /// Full documents in ascending id order
    pub fn stream_documents(&self) -> BoxStream<'_, Result<Value, StoreError>> {
        sqlx::query_scalar::<_, String>(&self.sql.select_docs)
            .fetch(&self.pool)
            .map(|row| -> Result<Value, StoreError> {
                let doc = row?;
                Ok(serde_json::from_str(&doc)?)
            })
            .boxed()
    }

    /// One top-level field of every document, `None` where the field is absent
    pub fn stream_field(&self, field: &str) -> BoxStream<'_, Result<(i64, Option<Value>), StoreError>> {
        if !is_valid_identifier(field) {
            let err = StoreError::InvalidName(field.to_string());
            return futures::stream::once(async move { Err(err) }).boxed();
        }

        sqlx::query_as::<_, (i64, Option<String>)>(&self.sql.select_field)
            .bind(format!("$.{field}"))
            .fetch(&self.pool)
            .map(|row| -> Result<(i64, Option<Value>), StoreError> {
                let (id, raw) = row?;
                let value = raw.map(|json| serde_json::from_str(&json)).transpose()?;
                Ok((id, value))
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("movies"));
        assert!(is_valid_identifier("new_people_2"));
        assert!(is_valid_identifier("_staged"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2movies"));
        assert!(!is_valid_identifier("movies; DROP TABLE people"));
        assert!(!is_valid_identifier("new-movies"));
        assert!(!is_valid_identifier("credits.cast"));
    }

    #[test]
    fn test_statements_quote_table_name() {
        let sql = Statements::for_table("new_movies");
        assert_eq!(sql.insert, r#"INSERT INTO "new_movies" (id, doc) VALUES (?, ?)"#);
        assert!(sql.select_field.contains("doc -> ?"));
    }
}
