//! SQLite database module for profile facts and view events
//!
//! This module owns the row store everything else derives from:
//!
//! - `users` - core user records (display name, homepage, avatar)
//! - `user_meta` - generic per-user key-value metadata
//! - `profile_fields` / `profile_field_values` - typed profile fields
//! - `view_events` - append-only profile view log
//! - `connections` - friendships consulted by the privacy gate
//!
//! Query functions are free functions taking `&mut SqliteConnection` so
//! they compose inside transactions and are testable against an in-memory
//! database.

pub mod connections;
pub mod models;
pub mod profile_fields;
pub mod schema;
pub mod users;
pub mod view_events;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::InsightsError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pooled SQLite database handle
pub struct Db {
    pool: DbPool,
}

impl Db {
    /// Open or create the database under the given directory
    pub fn open(data_dir: &Path) -> Result<Self, InsightsError> {
        let db_path = data_dir.join("profile-insights.db");
        info!("Opening SQLite database at {:?}", db_path);

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| InsightsError::Connection(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };

        let mut conn = db.conn()?;
        // WAL for better concurrent read performance
        conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| InsightsError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        init_schema(&mut conn)?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// Pool size is pinned to 1 so every checkout sees the same in-memory
    /// database.
    pub fn open_in_memory() -> Result<Self, InsightsError> {
        debug!("Opening in-memory SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| InsightsError::Connection(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };

        let mut conn = db.conn()?;
        init_schema(&mut conn)?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn, InsightsError> {
        self.pool
            .get()
            .map_err(|e| InsightsError::Connection(format!("Failed to get connection: {}", e)))
    }

    /// Clone of the underlying pool for engines that hold their own handle
    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, InsightsError> {
        let mut conn = self.conn()?;

        let user_count: i64 = schema::users::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

        let view_event_count: i64 = schema::view_events::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

        let connection_count: i64 = schema::connections::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

        let field_count: i64 = schema::profile_fields::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

        Ok(DbStats {
            user_count: user_count as u64,
            view_event_count: view_event_count as u64,
            connection_count: connection_count as u64,
            field_count: field_count as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub user_count: u64,
    pub view_event_count: u64,
    pub connection_count: u64,
    pub field_count: u64,
}

/// Initialize database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), InsightsError> {
    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY NOT NULL,
            display_name TEXT NOT NULL DEFAULT '',
            website_url TEXT,
            avatar_url TEXT,
            registered_at TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create users: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS user_meta (
            user_id INTEGER NOT NULL,
            meta_key TEXT NOT NULL,
            meta_value TEXT NOT NULL,
            PRIMARY KEY (user_id, meta_key)
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create user_meta: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_fields (
            id INTEGER PRIMARY KEY NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            label TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create profile_fields: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_field_values (
            user_id INTEGER NOT NULL,
            field_id INTEGER NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (user_id, field_id)
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create profile_field_values: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS view_events (
            id TEXT PRIMARY KEY NOT NULL,
            profile_user_id INTEGER NOT NULL,
            viewer_id INTEGER NOT NULL DEFAULT 0,
            ip_address TEXT NOT NULL DEFAULT '',
            viewed_on TEXT NOT NULL,
            viewed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create view_events: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS connections (
            id TEXT PRIMARY KEY NOT NULL,
            initiator_id INTEGER NOT NULL,
            friend_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create connections: {}", e)))?;

    // Indexes for the analytics read paths and the retention sweep
    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_view_events_profile ON view_events(profile_user_id, viewed_on)",
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_view_events_viewer ON view_events(viewer_id)")
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_view_events_viewed_at ON view_events(viewed_at)")
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_connections_parties ON connections(initiator_id, friend_id)",
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Failed to create index: {}", e)))?;

    debug!("Database schema initialized");
    Ok(())
}

// Re-exports
pub use models::{ProfileField, ProfileFieldValue, User, UserConnection, UserMeta, ViewEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Db::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.user_count, 0);
        assert_eq!(stats.view_event_count, 0);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(dir.path()).unwrap();
        assert_eq!(db.stats().unwrap().user_count, 0);
        // Re-open is idempotent
        drop(db);
        let db = Db::open(dir.path()).unwrap();
        assert_eq!(db.stats().unwrap().user_count, 0);
    }
}
