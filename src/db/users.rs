//! User record and metadata operations
//!
//! The user table is owned by the host; ids arrive from outside rather than
//! being generated here. Metadata is a plain per-user key-value store and
//! doubles as the home of small engine markers (visibility preference,
//! completion-reward flag).

use diesel::prelude::*;
use serde::Deserialize;

use super::models::{current_timestamp, NewUser, NewUserMeta, User};
use super::schema::{user_meta, users};
use crate::error::InsightsError;

/// Input for creating a user record
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub id: i64,
    pub display_name: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// ============================================================================
// User Records
// ============================================================================

/// Create a user record
pub fn create_user(conn: &mut SqliteConnection, input: CreateUserInput) -> Result<User, InsightsError> {
    let now = current_timestamp();
    let new_user = NewUser {
        id: input.id,
        display_name: &input.display_name,
        website_url: input.website_url.as_deref(),
        avatar_url: input.avatar_url.as_deref(),
        registered_at: &now,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Insert failed: {}", e)))?;

    get_user(conn, input.id)?
        .ok_or_else(|| InsightsError::Internal("Failed to retrieve created user".into()))
}

/// Get a user by id
pub fn get_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>, InsightsError> {
    users::table
        .filter(users::id.eq(user_id))
        .first(conn)
        .optional()
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// Look up a named attribute on the user record
///
/// Unknown attribute names and missing users resolve to `None`, never an
/// error; the completeness calculator treats absent as unfilled.
pub fn user_attribute(
    conn: &mut SqliteConnection,
    user_id: i64,
    attribute: &str,
) -> Result<Option<String>, InsightsError> {
    let user = match get_user(conn, user_id)? {
        Some(u) => u,
        None => return Ok(None),
    };

    Ok(match attribute {
        "display_name" => Some(user.display_name),
        "website_url" => user.website_url,
        "avatar_url" => user.avatar_url,
        _ => None,
    })
}

/// Update a named attribute on the user record
pub fn set_user_attribute(
    conn: &mut SqliteConnection,
    user_id: i64,
    attribute: &str,
    value: Option<&str>,
) -> Result<(), InsightsError> {
    let target = users::table.filter(users::id.eq(user_id));
    let updated = match attribute {
        "display_name" => diesel::update(target)
            .set(users::display_name.eq(value.unwrap_or_default()))
            .execute(conn),
        "website_url" => diesel::update(target).set(users::website_url.eq(value)).execute(conn),
        "avatar_url" => diesel::update(target).set(users::avatar_url.eq(value)).execute(conn),
        _ => {
            return Err(InsightsError::InvalidInput(format!(
                "Unknown user attribute: {}",
                attribute
            )))
        }
    }
    .map_err(|e| InsightsError::Internal(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(InsightsError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(())
}

/// Most recently registered users, newest first
pub fn recent_users(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<User>, InsightsError> {
    users::table
        .order((users::registered_at.desc(), users::id.desc()))
        .limit(limit)
        .load(conn)
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

// ============================================================================
// Metadata
// ============================================================================

/// Get a single metadata value for a user
pub fn get_meta(
    conn: &mut SqliteConnection,
    user_id: i64,
    key: &str,
) -> Result<Option<String>, InsightsError> {
    user_meta::table
        .filter(user_meta::user_id.eq(user_id))
        .filter(user_meta::meta_key.eq(key))
        .select(user_meta::meta_value)
        .first(conn)
        .optional()
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// Set a metadata value for a user (upsert)
pub fn set_meta(
    conn: &mut SqliteConnection,
    user_id: i64,
    key: &str,
    value: &str,
) -> Result<(), InsightsError> {
    let new_meta = NewUserMeta {
        user_id,
        meta_key: key,
        meta_value: value,
    };

    diesel::insert_into(user_meta::table)
        .values(&new_meta)
        .on_conflict((user_meta::user_id, user_meta::meta_key))
        .do_update()
        .set(user_meta::meta_value.eq(value))
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Upsert failed: {}", e)))?;

    Ok(())
}

/// Delete a metadata value for a user
pub fn delete_meta(conn: &mut SqliteConnection, user_id: i64, key: &str) -> Result<bool, InsightsError> {
    let deleted = diesel::delete(
        user_meta::table
            .filter(user_meta::user_id.eq(user_id))
            .filter(user_meta::meta_key.eq(key)),
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Delete failed: {}", e)))?;

    Ok(deleted > 0)
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

    fn user(id: i64, name: &str) -> CreateUserInput {
        CreateUserInput {
            id,
            display_name: name.to_string(),
            website_url: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_attribute_lookup() {
        let mut conn = setup_test_db();
        create_user(
            &mut conn,
            CreateUserInput {
                id: 1,
                display_name: "Ada".to_string(),
                website_url: Some("https://ada.example".to_string()),
                avatar_url: None,
            },
        )
        .unwrap();

        assert_eq!(
            user_attribute(&mut conn, 1, "display_name").unwrap(),
            Some("Ada".to_string())
        );
        assert_eq!(
            user_attribute(&mut conn, 1, "website_url").unwrap(),
            Some("https://ada.example".to_string())
        );
        assert_eq!(user_attribute(&mut conn, 1, "avatar_url").unwrap(), None);
        // Unknown attribute and unknown user both degrade to None
        assert_eq!(user_attribute(&mut conn, 1, "shoe_size").unwrap(), None);
        assert_eq!(user_attribute(&mut conn, 99, "display_name").unwrap(), None);
    }

    #[test]
    fn test_meta_upsert_and_delete() {
        let mut conn = setup_test_db();
        create_user(&mut conn, user(1, "Ada")).unwrap();

        assert_eq!(get_meta(&mut conn, 1, "bio").unwrap(), None);

        set_meta(&mut conn, 1, "bio", "first").unwrap();
        assert_eq!(get_meta(&mut conn, 1, "bio").unwrap(), Some("first".to_string()));

        set_meta(&mut conn, 1, "bio", "second").unwrap();
        assert_eq!(get_meta(&mut conn, 1, "bio").unwrap(), Some("second".to_string()));

        assert!(delete_meta(&mut conn, 1, "bio").unwrap());
        assert!(!delete_meta(&mut conn, 1, "bio").unwrap());
        assert_eq!(get_meta(&mut conn, 1, "bio").unwrap(), None);
    }

    #[test]
    fn test_meta_is_per_user() {
        let mut conn = setup_test_db();
        create_user(&mut conn, user(1, "Ada")).unwrap();
        create_user(&mut conn, user(2, "Grace")).unwrap();

        set_meta(&mut conn, 1, "bio", "Ada's bio").unwrap();
        assert_eq!(get_meta(&mut conn, 2, "bio").unwrap(), None);
    }

    #[test]
    fn test_set_user_attribute() {
        let mut conn = setup_test_db();
        create_user(&mut conn, user(1, "Ada")).unwrap();

        set_user_attribute(&mut conn, 1, "website_url", Some("https://a.example")).unwrap();
        assert_eq!(
            user_attribute(&mut conn, 1, "website_url").unwrap(),
            Some("https://a.example".to_string())
        );

        set_user_attribute(&mut conn, 1, "website_url", None).unwrap();
        assert_eq!(user_attribute(&mut conn, 1, "website_url").unwrap(), None);

        assert!(set_user_attribute(&mut conn, 1, "shoe_size", Some("44")).is_err());
        assert!(set_user_attribute(&mut conn, 99, "display_name", Some("x")).is_err());
    }
}
