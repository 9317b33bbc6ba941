//! Typed profile field definitions and per-user values
//!
//! Field definitions are keyed by slug; values join the definition table
//! with the value table by (user_id, field_id).

use diesel::prelude::*;

use super::models::{NewProfileField, NewProfileFieldValue, ProfileField};
use super::schema::{profile_field_values, profile_fields};
use crate::error::InsightsError;

/// Create a field definition, returning the stored row with its assigned id
pub fn create_field(
    conn: &mut SqliteConnection,
    slug: &str,
    label: &str,
) -> Result<ProfileField, InsightsError> {
    let new_field = NewProfileField { slug, label };

    diesel::insert_into(profile_fields::table)
        .values(&new_field)
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Insert failed: {}", e)))?;

    get_field_by_slug(conn, slug)?
        .ok_or_else(|| InsightsError::Internal("Failed to retrieve created field".into()))
}

/// Get a field definition by slug
pub fn get_field_by_slug(
    conn: &mut SqliteConnection,
    slug: &str,
) -> Result<Option<ProfileField>, InsightsError> {
    profile_fields::table
        .filter(profile_fields::slug.eq(slug))
        .first(conn)
        .optional()
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// List all field definitions
pub fn list_fields(conn: &mut SqliteConnection) -> Result<Vec<ProfileField>, InsightsError> {
    profile_fields::table
        .order(profile_fields::id.asc())
        .load(conn)
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// Set a user's value for a field slug (upsert)
pub fn set_value(
    conn: &mut SqliteConnection,
    user_id: i64,
    slug: &str,
    value: &str,
) -> Result<(), InsightsError> {
    let field = get_field_by_slug(conn, slug)?
        .ok_or_else(|| InsightsError::NotFound(format!("Profile field {} not found", slug)))?;

    let new_value = NewProfileFieldValue {
        user_id,
        field_id: field.id,
        value,
    };

    diesel::insert_into(profile_field_values::table)
        .values(&new_value)
        .on_conflict((profile_field_values::user_id, profile_field_values::field_id))
        .do_update()
        .set(profile_field_values::value.eq(value))
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Upsert failed: {}", e)))?;

    Ok(())
}

/// Get a user's value for a field slug
///
/// Unknown slug or missing value row resolves to `None`, never an error.
pub fn get_value(
    conn: &mut SqliteConnection,
    user_id: i64,
    slug: &str,
) -> Result<Option<String>, InsightsError> {
    profile_field_values::table
        .inner_join(profile_fields::table)
        .filter(profile_fields::slug.eq(slug))
        .filter(profile_field_values::user_id.eq(user_id))
        .select(profile_field_values::value)
        .first(conn)
        .optional()
        .map_err(|e| InsightsError::Internal(format!("Query failed: {}", e)))
}

/// Delete a user's value for a field slug
pub fn delete_value(
    conn: &mut SqliteConnection,
    user_id: i64,
    slug: &str,
) -> Result<bool, InsightsError> {
    let field = match get_field_by_slug(conn, slug)? {
        Some(f) => f,
        None => return Ok(false),
    };

    let deleted = diesel::delete(
        profile_field_values::table
            .filter(profile_field_values::user_id.eq(user_id))
            .filter(profile_field_values::field_id.eq(field.id)),
    )
    .execute(conn)
    .map_err(|e| InsightsError::Internal(format!("Delete failed: {}", e)))?;

    Ok(deleted > 0)
}
