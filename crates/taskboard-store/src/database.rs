use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use taskboard_core::DEFAULT_CATEGORIES;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::schema;

/// Handle to the SQLite database file.
///
/// Holds no open connection: every operation opens its own through
/// [`Database::acquire`] and closes it before returning.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create a database at the given path and initialize its schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
        }

        let db = Self {
            path: path.to_owned(),
        };
        db.initialize()?;

        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Create tables if absent and seed the default categories.
    ///
    /// Safe to call repeatedly: existing rows are never touched and seeding
    /// skips names that already exist.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.connect(OpenFlags::default())?;

        conn.execute_batch(schema::INIT_PRAGMAS)
            .map_err(|e| StoreError::Database(format!("pragmas: {e}")))?;

        conn.execute_batch(schema::CREATE_TABLES)
            .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

        let tx = conn.unchecked_transaction()?;
        for name in DEFAULT_CATEGORIES {
            tx.execute(schema::SEED_CATEGORY, [name])
                .map_err(|e| StoreError::Database(format!("seed categories: {e}")))?;
        }

        // Set schema version if not present
        let version: Option<u32> = tx
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;

        if version.is_none() {
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [schema::SCHEMA_VERSION],
            )
            .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;
        }
        tx.commit()?;

        debug!(path = %self.path.display(), "schema initialized");
        Ok(())
    }

    /// Open a fresh connection to the initialized database file.
    ///
    /// The file must already exist; a missing or unreadable file yields
    /// [`StoreError::Unavailable`].
    pub fn acquire(&self) -> Result<Connection, StoreError> {
        self.connect(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    /// Open a connection with the per-connection pragmas applied.
    fn connect(&self, flags: OpenFlags) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(&self.path, flags)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.execute_batch(schema::CONNECTION_PRAGMAS)
            .map_err(|e| StoreError::Unavailable(format!("pragmas: {e}")))?;

        Ok(conn)
    }

    /// Execute a closure with a connection that is closed when it returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.acquire()?;
        f(&conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
