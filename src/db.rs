//! SQLite persistence for dialog stacks

mod schema;

pub use schema::*;

use crate::dialog::DialogStack;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt dialog stack for {conversation_id}: {source}")]
    CorruptStack {
        conversation_id: String,
        source: serde_json::Error,
    },
    #[error("Failed to encode dialog stack: {0}")]
    Encode(serde_json::Error),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn connection(&self) -> DbResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Stack Operations ====================

    /// Load the persisted stack for a conversation
    pub fn load_stack(&self, conversation_id: &str) -> DbResult<Option<DialogStack>> {
        let conn = self.connection()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT stack FROM dialog_stacks WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| {
            serde_json::from_str(&json).map_err(|source| DbError::CorruptStack {
                conversation_id: conversation_id.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Insert or replace the stack for a conversation
    pub fn save_stack(&self, conversation_id: &str, stack: &DialogStack) -> DbResult<()> {
        let json = serde_json::to_string(stack).map_err(DbError::Encode)?;
        let now = Utc::now().to_rfc3339();
        #[allow(clippy::cast_possible_wrap)]
        let depth = stack.len() as i64;

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO dialog_stacks (conversation_id, stack, depth, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(conversation_id) DO UPDATE SET
                stack = excluded.stack,
                depth = excluded.depth,
                updated_at = excluded.updated_at",
            params![conversation_id, json, depth, now],
        )?;
        Ok(())
    }

    pub fn delete_stack(&self, conversation_id: &str) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM dialog_stacks WHERE conversation_id = ?1",
            params![conversation_id],
        )?;
        Ok(())
    }

    /// Conversations ordered by most recent activity
    pub fn list_conversations(&self) -> DbResult<Vec<StoredConversation>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT conversation_id, depth, created_at, updated_at
             FROM dialog_stacks ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredConversation {
                conversation_id: row.get(0)?,
                depth: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
                updated_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;
        let conversations = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(conversations)
    }

    /// Drop conversations idle since before `cutoff`; returns how many
    pub fn purge_idle(&self, cutoff: DateTime<Utc>) -> DbResult<usize> {
        let conn = self.connection()?;
        let removed = conn.execute(
            "DELETE FROM dialog_stacks WHERE updated_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
