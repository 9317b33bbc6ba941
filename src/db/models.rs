//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Get current UTC calendar day for day-keyed columns
pub fn current_day() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

// ============================================================================
// User Models
// ============================================================================

/// Core user row - the record the UserRecord field source reads
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub website_url: Option<String>,
    pub avatar_url: Option<String>,
    pub registered_at: String,
}

/// New user for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: i64,
    pub display_name: &'a str,
    pub website_url: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub registered_at: &'a str,
}

/// Per-user key-value metadata row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = user_meta)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserMeta {
    pub user_id: i64,
    pub meta_key: String,
    pub meta_value: String,
}

/// New metadata entry for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_meta)]
pub struct NewUserMeta<'a> {
    pub user_id: i64,
    pub meta_key: &'a str,
    pub meta_value: &'a str,
}

// ============================================================================
// Typed Profile Field Models
// ============================================================================

/// Profile field definition, keyed by slug
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profile_fields)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileField {
    pub id: i64,
    pub slug: String,
    pub label: String,
}

/// New field definition for INSERT (id assigned by SQLite)
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profile_fields)]
pub struct NewProfileField<'a> {
    pub slug: &'a str,
    pub label: &'a str,
}

/// Stored value of a typed field for one user
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profile_field_values)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileFieldValue {
    pub user_id: i64,
    pub field_id: i64,
    pub value: String,
}

/// New field value for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profile_field_values)]
pub struct NewProfileFieldValue<'a> {
    pub user_id: i64,
    pub field_id: i64,
    pub value: &'a str,
}

// ============================================================================
// View Event Models
// ============================================================================

/// Immutable profile view event row
///
/// `viewer_id` 0 marks an anonymous viewer; those rows dedup on
/// `ip_address` instead. `viewed_on` is the UTC calendar day used for
/// same-day dedup and daily history grouping.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = view_events)]
#[serde(rename_all = "camelCase")]
pub struct ViewEvent {
    pub id: String,
    pub profile_user_id: i64,
    pub viewer_id: i64,
    pub ip_address: String,
    pub viewed_on: String,
    pub viewed_at: String,
}

/// New view event for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = view_events)]
pub struct NewViewEvent<'a> {
    pub id: &'a str,
    pub profile_user_id: i64,
    pub viewer_id: i64,
    pub ip_address: &'a str,
    pub viewed_on: &'a str,
    pub viewed_at: &'a str,
}

// ============================================================================
// Connection Models
// ============================================================================

/// Connection status values stored in the `status` column
pub mod connection_status {
    pub const PENDING: &str = "pending";
    pub const ACCEPTED: &str = "accepted";
}

/// Connection (friendship) row between two users
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = connections)]
#[serde(rename_all = "camelCase")]
pub struct UserConnection {
    pub id: String,
    pub initiator_id: i64,
    pub friend_id: i64,
    pub status: String,
    pub created_at: String,
}

/// New connection for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = connections)]
pub struct NewUserConnection<'a> {
    pub id: &'a str,
    pub initiator_id: i64,
    pub friend_id: i64,
    pub status: &'a str,
    pub created_at: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formats() {
        let ts = current_timestamp();
        let day = current_day();
        assert_eq!(ts.len(), 20, "RFC 3339 Z timestamp: {}", ts);
        assert!(ts.starts_with(&day));
    }
}
