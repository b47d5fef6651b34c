//! SQLite implementation of the [`GrantStore`] trait.
//!
//! Outstanding grants outlive process restarts, so they get a real table. Uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use pastegate_core::{Grant, GrantId, PasteId, Permission};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{GrantStore, InsertResult};

const GRANT_COLUMNS: &str = "grant_id, paste_id, permission, created_at, expires_at";

/// SQLite-based grant store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteGrantStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGrantStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn row_to_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grant> {
    let id_bytes: Vec<u8> = row.get("grant_id")?;
    let paste_id: String = row.get("paste_id")?;
    let bits: u32 = row.get("permission")?;

    let id: [u8; 32] = id_bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(0, "grant_id".into(), Type::Blob))?;

    Ok(Grant {
        id: GrantId::from_bytes(id),
        paste_id: PasteId::new(paste_id).map_err(|e| conversion_error(1, Type::Text, e))?,
        permission: Permission::from_bits(bits).map_err(|e| conversion_error(2, Type::Integer, e))?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}

#[async_trait]
impl GrantStore for SqliteGrantStore {
    async fn insert_grant(&self, grant: &Grant) -> Result<InsertResult> {
        let grant = grant.clone();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO grants (grant_id, paste_id, permission, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    grant.id.as_bytes().as_slice(),
                    grant.paste_id.as_str(),
                    grant.permission.bits(),
                    grant.created_at,
                    grant.expires_at,
                ],
            )?;
            Ok(if changed == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn get_grant(&self, id: &GrantId) -> Result<Option<Grant>> {
        let id = *id;
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM grants WHERE grant_id = ?1", GRANT_COLUMNS),
                params![id.as_bytes().as_slice()],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn take_grant(&self, id: &GrantId) -> Result<Option<Grant>> {
        let id = *id;
        self.blocking(move |conn| {
            conn.query_row(
                &format!("DELETE FROM grants WHERE grant_id = ?1 RETURNING {}", GRANT_COLUMNS),
                params![id.as_bytes().as_slice()],
                row_to_grant,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn grants_for(&self, paste_id: &PasteId) -> Result<Vec<Grant>> {
        let paste_id = paste_id.clone();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM grants WHERE paste_id = ?1 ORDER BY created_at",
                GRANT_COLUMNS
            ))?;
            let grants = stmt
                .query_map(params![paste_id.as_str()], row_to_grant)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(grants)
        })
        .await
    }

    async fn remove_grants_for(&self, paste_id: &PasteId) -> Result<usize> {
        let paste_id = paste_id.clone();
        self.blocking(move |conn| {
            Ok(conn.execute(
                "DELETE FROM grants WHERE paste_id = ?1",
                params![paste_id.as_str()],
            )?)
        })
        .await
    }

    async fn purge_expired(&self, now: i64) -> Result<usize> {
        self.blocking(move |conn| {
            Ok(conn.execute(
                "DELETE FROM grants WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )?)
        })
        .await
    }
}
