use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// Checkout timeout; the busy handler below uses the same value so a
/// contended writer waits this long instead of failing immediately.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support.
///
/// Constructed once at startup and handed to every component through
/// `AppState`; there is no process-global handle. The pool liveness-probes
/// connections on checkout and transparently replaces dead ones, and the
/// init hook puts every connection in WAL mode so readers are not blocked
/// by the single writer.
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path)?.with_init(configure_connection);
        let pool = Pool::builder()
            .connection_timeout(CONNECT_TIMEOUT)
            .test_on_check_out(true)
            .build(manager)
            .context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    ///
    /// # Arguments
    /// * `path` - Database file path or ":memory:" for an in-memory database
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> Result<SqliteConnectionManager> {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            Ok(SqliteConnectionManager::memory())
        } else {
            Ok(SqliteConnectionManager::file(path))
        }
    }

    /// Create an in-memory database pool (useful for testing).
    ///
    /// Capped at a single connection: every in-memory connection opens its
    /// own private database, so a larger pool would hand out empty ones.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(configure_connection);
        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(CONNECT_TIMEOUT)
            .test_on_check_out(true)
            .build(manager)
            .context("Failed to create in-memory connection pool")?;
        Ok(Self { pool })
    }

    /// Initialize the database schema inside one transaction.
    /// Safe to call on every startup regardless of existing schema state.
    pub fn initialize(&self) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .context("Failed to open schema transaction")?;
        tx.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        tx.commit().context("Failed to commit schema transaction")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", CONNECT_TIMEOUT.as_millis() as i64)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        // Verify tables exist
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"authors".to_string()));
        assert!(tables.contains(&"posts".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("first initialization");
        db.initialize().expect("second initialization");

        {
            let conn = db.connection().expect("Failed to get connection");
            conn.execute("INSERT INTO authors (email) VALUES ('a@example.com')", [])
                .expect("insert after re-initialization");
        }

        db.initialize().expect("initialization with existing data");
        let conn = db.connection().expect("Failed to get connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))
            .expect("count authors");
        assert_eq!(count, 1, "re-initialization must not drop data");
    }

    #[test]
    fn test_posts_foreign_key_enforced() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().expect("Failed to get connection");
        let result = conn.execute(
            "INSERT INTO posts (id, author_id, text, post_date) VALUES (1, 999, 'x', '2024-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err(), "insert without author must be rejected");
    }

    #[test]
    fn test_memory_database_detection() {
        // Test various memory database path formats
        let memory_paths = [":memory:", " :memory: ", ":MEMORY:", " :Memory: "];

        for path in &memory_paths {
            let db = Database::new(path).expect("Failed to create memory database");
            db.initialize().expect("Failed to initialize schema");
        }

        // Test file database path
        let temp_path = "/tmp/test_feedline.db";
        let db = Database::new(temp_path).expect("Failed to create file database");
        db.initialize().expect("Failed to initialize file schema");

        // Cleanup
        drop(db);
        let _ = std::fs::remove_file(temp_path);
        let _ = std::fs::remove_file(format!("{temp_path}-wal"));
        let _ = std::fs::remove_file(format!("{temp_path}-shm"));
    }

    #[test]
    fn test_wal_mode_enabled_on_file_database() {
        let temp_path = "/tmp/test_feedline_wal.db";
        let db = Database::new(temp_path).expect("Failed to create file database");
        let conn = db.connection().expect("Failed to get connection");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("query journal mode");
        assert_eq!(mode.to_lowercase(), "wal");

        drop(conn);
        drop(db);
        let _ = std::fs::remove_file(temp_path);
        let _ = std::fs::remove_file(format!("{temp_path}-wal"));
        let _ = std::fs::remove_file(format!("{temp_path}-shm"));
    }
}
