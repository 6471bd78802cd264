//! SQLite-based document storage.
//!
//! Provides persistent storage for:
//! - Typed documents (residents, preferences, events, ...) with
//!   revision-checked updates and query-by-type
//! - A key-value side store for lightweight application state
//!
//! The document table is deliberately schemaless: each row carries a type
//! tag, a revision counter and a JSON body. Queries filter on the type tag
//! (optionally on one body field); uniqueness beyond the id is enforced by
//! callers via lookup-before-write.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, DatabaseError};

use super::data_dir;

/// A stored document: JSON body plus store metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub id: String,
    pub doc_type: String,
    /// Monotonically increasing revision counter; updates must present the
    /// current value or fail with a conflict.
    pub revision: i64,
    pub body: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// A domain type that lives in the document store.
pub trait DocumentKind: Serialize + DeserializeOwned {
    /// Type tag stored alongside the document body.
    const DOC_TYPE: &'static str;

    /// Document id of this value.
    fn doc_id(&self) -> &str;
}

/// Key-value port for lightweight persisted flags (throttle timestamps,
/// guided-flow state). Core logic depends on this trait, not on SQLite.
pub trait KeyValueStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn kv_delete(&self, key: &str) -> Result<(), DatabaseError>;
}

/// SQLite database holding the document and key-value tables.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/carelog/carelog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("carelog.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                doc_type    TEXT NOT NULL,
                revision    INTEGER NOT NULL DEFAULT 1,
                body        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_doc_type ON documents(doc_type);",
        )?;
        Ok(())
    }

    // ── Raw document operations ──────────────────────────────────────

    /// Fetch a document by id.
    ///
    /// # Errors
    /// `DatabaseError::NotFound` if no document has this id.
    pub fn get(&self, id: &str) -> Result<Document, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, doc_type, revision, body, updated_at FROM documents WHERE id = ?1",
        )?;
        let doc = stmt
            .query_row(params![id], row_to_document)
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound { id: id.to_string() })?;
        Ok(doc)
    }

    /// Insert or update a document.
    ///
    /// A new id is inserted at revision 1 with `expected_revision = None`.
    /// Updating an existing document requires the caller to supply the
    /// current revision; a stale or missing marker fails with
    /// `DatabaseError::Conflict`.
    pub fn put(
        &self,
        id: &str,
        doc_type: &str,
        expected_revision: Option<i64>,
        body: &serde_json::Value,
    ) -> Result<Document, DatabaseError> {
        let current: Option<i64> = self
            .conn
            .prepare("SELECT revision FROM documents WHERE id = ?1")?
            .query_row(params![id], |row| row.get(0))
            .optional()?;

        let now = Utc::now();
        let body_text = body.to_string();
        let revision = match (current, expected_revision) {
            (None, None) => {
                self.conn.execute(
                    "INSERT INTO documents (id, doc_type, revision, body, updated_at)
                     VALUES (?1, ?2, 1, ?3, ?4)",
                    params![id, doc_type, body_text, now.to_rfc3339()],
                )?;
                1
            }
            (None, Some(_)) => {
                return Err(DatabaseError::NotFound { id: id.to_string() });
            }
            (Some(stored), Some(expected)) if stored == expected => {
                let next = stored + 1;
                self.conn.execute(
                    "UPDATE documents SET doc_type = ?2, revision = ?3, body = ?4, updated_at = ?5
                     WHERE id = ?1",
                    params![id, doc_type, next, body_text, now.to_rfc3339()],
                )?;
                next
            }
            (Some(_), _) => {
                return Err(DatabaseError::Conflict { id: id.to_string() });
            }
        };

        Ok(Document {
            id: id.to_string(),
            doc_type: doc_type.to_string(),
            revision,
            body: body.clone(),
            updated_at: now,
        })
    }

    /// Remove a document, checking the revision marker.
    pub fn remove(&self, id: &str, revision: i64) -> Result<(), DatabaseError> {
        let current: Option<i64> = self
            .conn
            .prepare("SELECT revision FROM documents WHERE id = ?1")?
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        match current {
            None => Err(DatabaseError::NotFound { id: id.to_string() }),
            Some(stored) if stored == revision => {
                self.conn
                    .execute("DELETE FROM documents WHERE id = ?1", params![id])?;
                Ok(())
            }
            Some(_) => Err(DatabaseError::Conflict { id: id.to_string() }),
        }
    }

    /// List all documents with the given type tag.
    pub fn list_by_type(&self, doc_type: &str) -> Result<Vec<Document>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, doc_type, revision, body, updated_at FROM documents
             WHERE doc_type = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![doc_type], row_to_document)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// List documents with the given type tag whose body field equals `value`.
    ///
    /// `field` must be a plain top-level field name; it is interpolated into
    /// a JSON path, never into SQL.
    pub fn list_by_type_and_field(
        &self,
        doc_type: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, DatabaseError> {
        let path = format!("$.{field}");
        let mut stmt = self.conn.prepare(
            "SELECT id, doc_type, revision, body, updated_at FROM documents
             WHERE doc_type = ?1 AND json_extract(body, ?2) = ?3 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![doc_type, path, value], row_to_document)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Total number of stored documents (any type).
    pub fn count_documents(&self) -> Result<i64, DatabaseError> {
        let count = self
            .conn
            .prepare("SELECT COUNT(*) FROM documents")?
            .query_row([], |row| row.get(0))?;
        Ok(count)
    }

    // ── Typed helpers ────────────────────────────────────────────────

    /// Insert a new typed document.
    pub fn insert<T: DocumentKind>(&self, value: &T) -> Result<Document, CoreError> {
        let body = serde_json::to_value(value)?;
        Ok(self.put(value.doc_id(), T::DOC_TYPE, None, &body)?)
    }

    /// Update an existing typed document at the given revision.
    pub fn update<T: DocumentKind>(&self, value: &T, revision: i64) -> Result<Document, CoreError> {
        let body = serde_json::to_value(value)?;
        Ok(self.put(value.doc_id(), T::DOC_TYPE, Some(revision), &body)?)
    }

    /// Load one typed document and its revision.
    pub fn load<T: DocumentKind>(&self, id: &str) -> Result<Option<(T, i64)>, CoreError> {
        match self.get(id) {
            Ok(doc) => {
                let value = serde_json::from_value(doc.body)?;
                Ok(Some((value, doc.revision)))
            }
            Err(DatabaseError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load all documents of a type, silently skipping bodies that no longer
    /// deserialize (partial-failure tolerance).
    pub fn load_all<T: DocumentKind>(&self) -> Result<Vec<T>, CoreError> {
        let docs = self.list_by_type(T::DOC_TYPE)?;
        Ok(docs
            .into_iter()
            .filter_map(|d| serde_json::from_value(d.body).ok())
            .collect())
    }

    /// Load all documents of a type whose body `field` equals `value`.
    pub fn load_where<T: DocumentKind>(&self, field: &str, value: &str) -> Result<Vec<T>, CoreError> {
        let docs = self.list_by_type_and_field(T::DOC_TYPE, field, value)?;
        Ok(docs
            .into_iter()
            .filter_map(|d| serde_json::from_value(d.body).ok())
            .collect())
    }
}

impl KeyValueStore for Database {
    fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(result)
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn row_to_document(row: &rusqlite::Row) -> Result<Document, rusqlite::Error> {
    let body_text: String = row.get(3)?;
    let body = serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);
    let updated_at_text: String = row.get(4)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    Ok(Document {
        id: row.get(0)?,
        doc_type: row.get(1)?,
        revision: row.get(2)?,
        body,
        updated_at,
    })
}
