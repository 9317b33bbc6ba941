//! Periodic purge of aged view events
//!
//! Invoked by an externally scheduled trigger (typically daily). The purge
//! is a single timestamp-predicate delete: idempotent and safe to run
//! concurrently with recording.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use tracing::info;

use crate::db::view_events;
use crate::error::InsightsError;

/// Default retention window for view events
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Delete view events strictly older than `older_than_days`, returning the
/// number of rows removed
pub fn purge_expired_views(
    conn: &mut SqliteConnection,
    older_than_days: i64,
) -> Result<usize, InsightsError> {
    if older_than_days < 0 {
        return Err(InsightsError::InvalidInput(
            "Retention window must not be negative".into(),
        ));
    }

    let cutoff = (Utc::now() - Duration::days(older_than_days))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();

    let deleted = view_events::purge_older_than(conn, &cutoff)?;
    if deleted > 0 {
        info!("Purged {} view events older than {} days", deleted, older_than_days);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::Connection;

    fn setup_test_db() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        crate::db::init_schema(&mut conn).expect("Failed to init schema");
        conn
    }

    fn insert_aged(conn: &mut SqliteConnection, days_ago: i64) {
        use crate::db::models::NewViewEvent;
        use crate::db::schema::view_events as events;

        let at = Utc::now() - Duration::days(days_ago);
        let id = uuid::Uuid::new_v4().to_string();
        let event = NewViewEvent {
            id: &id,
            profile_user_id: 1,
            viewer_id: 2,
            ip_address: "",
            viewed_on: &at.format("%Y-%m-%d").to_string(),
            viewed_at: &at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };
        diesel::insert_into(events::table)
            .values(&event)
            .execute(conn)
            .unwrap();
    }

    #[test]
    fn test_purge_respects_window() {
        let mut conn = setup_test_db();

        insert_aged(&mut conn, 120);
        insert_aged(&mut conn, 10);

        assert_eq!(purge_expired_views(&mut conn, DEFAULT_RETENTION_DAYS).unwrap(), 1);
        assert_eq!(view_events::total_views(&mut conn, 1).unwrap(), 1);

        // Idempotent
        assert_eq!(purge_expired_views(&mut conn, DEFAULT_RETENTION_DAYS).unwrap(), 0);
        assert_eq!(view_events::total_views(&mut conn, 1).unwrap(), 1);
    }

    #[test]
    fn test_negative_window_rejected() {
        let mut conn = setup_test_db();
        assert!(matches!(
            purge_expired_views(&mut conn, -1),
            Err(InsightsError::InvalidInput(_))
        ));
    }
}
