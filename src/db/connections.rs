//! Connection (friendship) lookups for the privacy gate
//!
//! Connections are stored once per pair; lookups are order-independent
//! across (initiator_id, friend_id).

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{connection_status, current_timestamp, NewUserConnection, UserConnection};
use super::schema::connections;
use crate::error::InsightsError;

/// Create a connection between two users
pub fn create_connection(
    conn: &mut SqliteConnection,
    initiator_id: i64,
    friend_id: i64,
    status: &str,
) -> Result<UserConnection, InsightsError> {
    if initiator_id == friend_id {
        return Err(InsightsError::InvalidInput(
            "Cannot connect a user to themselves".into(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let new_connection = NewUserConnection {
        id: &id,
        initiator_id,
        friend_id,
        status,
        created_at: &now,
    };

    diesel::insert_into(connections::table)
        .values(&new_connection)
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Insert failed: {}", e)))?;

    connections::table
        .filter(connections::id.eq(&id))
        .first(conn)
        .map_err(|e| InsightsError::Internal(format!("Fetch failed: {}", e)))
}

/// Get the connection between two users, if any, in either direction
pub fn get_connection_between(
    conn: &mut SqliteConnection,
    user_a: i64,
    user_b: i64,
) -> Result<Option<UserConnection>, InsightsError> {
    connections::table
        .filter(
            (connections::initiator_id
                .eq(user_a)
                .and(connections::friend_id.eq(user_b)))
            .or(connections::initiator_id
                .eq(user_b)
                .and(connections::friend_id.eq(user_a))),
        )
        .first(conn)
        .optional()
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// Whether an accepted connection exists between two users
pub fn are_connected(
    conn: &mut SqliteConnection,
    user_a: i64,
    user_b: i64,
) -> Result<bool, InsightsError> {
    Ok(get_connection_between(conn, user_a, user_b)?
        .map(|c| c.status == connection_status::ACCEPTED)
        .unwrap_or(false))
}

/// Mark a connection as accepted
pub fn accept_connection(conn: &mut SqliteConnection, id: &str) -> Result<(), InsightsError> {
    let updated = diesel::update(connections::table.filter(connections::id.eq(id)))
        .set(connections::status.eq(connection_status::ACCEPTED))
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(InsightsError::NotFound(format!("Connection {} not found", id)));
    }
    Ok(())
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

    #[test]
    fn test_order_independent_lookup() {
        let mut conn = setup_test_db();
        create_connection(&mut conn, 1, 2, connection_status::ACCEPTED).unwrap();

        assert!(are_connected(&mut conn, 1, 2).unwrap());
        assert!(are_connected(&mut conn, 2, 1).unwrap());
        assert!(!are_connected(&mut conn, 1, 3).unwrap());
    }

    #[test]
    fn test_pending_is_not_connected() {
        let mut conn = setup_test_db();
        let c = create_connection(&mut conn, 1, 2, connection_status::PENDING).unwrap();

        assert!(!are_connected(&mut conn, 1, 2).unwrap());

        accept_connection(&mut conn, &c.id).unwrap();
        assert!(are_connected(&mut conn, 1, 2).unwrap());
    }

    #[test]
    fn test_self_connection_rejected() {
        let mut conn = setup_test_db();
        assert!(matches!(
            create_connection(&mut conn, 1, 1, connection_status::ACCEPTED),
            Err(InsightsError::InvalidInput(_))
        ));
    }
}
