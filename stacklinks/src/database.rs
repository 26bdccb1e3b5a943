//! SQLite document store for links and collections
//!
//! Two tables, `collections` and `links`. Tags are stored as a JSON array,
//! timestamps as RFC 3339 text. Owner queries return rows in insertion
//! order (rowid), which is the fetch order the ranker uses for ties.
//! Uses r2d2 connection pooling to allow concurrent reads without mutex blocking.

use crate::interface::{Collection, Link, Visibility};
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

const LINK_COLUMNS: &str = "id, collectionId, ownerId, url, title, description, imageUrl, tags, visibility, pinned, createdAt, updatedAt";
const COLLECTION_COLUMNS: &str = "id, ownerId, name, description, imageUrl, tags, visibility, createdAt, updatedAt";

fn conversion_error<E>(column: usize, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
}

fn parse_timestamp(row: &rusqlite::Row, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn parse_optional_timestamp(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(column, e))
    })
    .transpose()
}

fn parse_tags(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(column, e))
}

fn parse_visibility(row: &rusqlite::Row, column: usize) -> rusqlite::Result<Visibility> {
    let raw: String = row.get(column)?;
    // Unknown values fail closed
    Ok(Visibility::from_database(&raw).unwrap_or(Visibility::Private))
}

/// Thread-safe database wrapper using connection pooling
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with connection pooling
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| {
                conn.execute_batch("
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA foreign_keys=ON;
                ")?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| {
                conn.execute_batch("PRAGMA foreign_keys=ON;")?;
                Ok(())
            });

        // In-memory needs single connection to maintain state
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                ownerId TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                imageUrl TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                visibility TEXT NOT NULL DEFAULT 'public',
                createdAt TEXT NOT NULL,
                updatedAt TEXT
            );

            CREATE TABLE IF NOT EXISTS links (
                id TEXT PRIMARY KEY,
                collectionId TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
                ownerId TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                imageUrl TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                visibility TEXT NOT NULL DEFAULT 'public',
                pinned INTEGER NOT NULL DEFAULT 0,
                createdAt TEXT NOT NULL,
                updatedAt TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_collections_owner ON collections(ownerId);
            CREATE INDEX IF NOT EXISTS idx_links_owner ON links(ownerId);
            CREATE INDEX IF NOT EXISTS idx_links_collection ON links(collectionId);
        "#)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Collections
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn insert_collection(&self, collection: &Collection) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO collections (id, ownerId, name, description, imageUrl, tags, visibility, createdAt, updatedAt)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                collection.id,
                collection.owner_id,
                collection.name,
                collection.description,
                collection.image_url,
                serde_json::to_string(&collection.tags)?,
                collection.visibility.as_str(),
                collection.created_at.to_rfc3339(),
                collection.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Overwrite every mutable column. Returns false if no such collection.
    pub fn update_collection(&self, collection: &Collection) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"UPDATE collections
               SET name = ?2, description = ?3, imageUrl = ?4, tags = ?5, visibility = ?6, updatedAt = ?7
               WHERE id = ?1"#,
            params![
                collection.id,
                collection.name,
                collection.description,
                collection.image_url,
                serde_json::to_string(&collection.tags)?,
                collection.visibility.as_str(),
                collection.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a collection (CASCADE removes its links)
    pub fn delete_collection(&self, id: &str) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM collections WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn fetch_collection(&self, id: &str) -> DatabaseResult<Option<Collection>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], Self::row_to_collection).optional()?)
    }

    pub fn fetch_collections_for_owner(&self, owner_id: &str) -> DatabaseResult<Vec<Collection>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections WHERE ownerId = ?1 ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([owner_id], Self::row_to_collection)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Links
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn insert_link(&self, link: &Link) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO links (id, collectionId, ownerId, url, title, description, imageUrl, tags, visibility, pinned, createdAt, updatedAt)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            params![
                link.id,
                link.collection_id,
                link.owner_id,
                link.url,
                link.title,
                link.description,
                link.image_url,
                serde_json::to_string(&link.tags)?,
                link.visibility.as_str(),
                link.pinned,
                link.created_at.to_rfc3339(),
                link.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Overwrite every mutable column. Returns false if no such link.
    pub fn update_link(&self, link: &Link) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"UPDATE links
               SET url = ?2, title = ?3, description = ?4, imageUrl = ?5, tags = ?6,
                   visibility = ?7, pinned = ?8, updatedAt = ?9
               WHERE id = ?1"#,
            params![
                link.id,
                link.url,
                link.title,
                link.description,
                link.image_url,
                serde_json::to_string(&link.tags)?,
                link.visibility.as_str(),
                link.pinned,
                link.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_link(&self, id: &str) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM links WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn fetch_link(&self, id: &str) -> DatabaseResult<Option<Link>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], Self::row_to_link).optional()?)
    }

    /// Every link the owner has, across all collections
    pub fn fetch_links_for_owner(&self, owner_id: &str) -> DatabaseResult<Vec<Link>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE ownerId = ?1 ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([owner_id], Self::row_to_link)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Row mapping
    // ─────────────────────────────────────────────────────────────────────────────

    fn row_to_collection(row: &rusqlite::Row) -> rusqlite::Result<Collection> {
        Ok(Collection {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            tags: parse_tags(row, 5)?,
            visibility: parse_visibility(row, 6)?,
            created_at: parse_timestamp(row, 7)?,
            updated_at: parse_optional_timestamp(row, 8)?,
        })
    }

    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        Ok(Link {
            id: row.get(0)?,
            collection_id: row.get(1)?,
            owner_id: row.get(2)?,
            url: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            image_url: row.get(6)?,
            tags: parse_tags(row, 7)?,
            visibility: parse_visibility(row, 8)?,
            pinned: row.get(9)?,
            created_at: parse_timestamp(row, 10)?,
            updated_at: parse_optional_timestamp(row, 11)?,
        })
    }
}
