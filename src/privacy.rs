//! Privacy gate over viewer-identity disclosure
//!
//! Decides whether a requesting user may see who viewed a profile. Gates
//! only viewer lists; numeric counts are safe to expose to the profile
//! owner and admin collaborators regardless of preference. Missing or
//! unknown data fails closed.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::{connections, users};
use crate::error::InsightsError;

/// Metadata key holding a user's viewer-list visibility preference
pub const VISIBILITY_META_KEY: &str = "viewers_visibility";

/// Who may see the list of viewers of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityPreference {
    Everyone,
    Friends,
    Nobody,
}

impl Default for VisibilityPreference {
    fn default() -> Self {
        Self::Friends
    }
}

impl VisibilityPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::Friends => "friends",
            Self::Nobody => "nobody",
        }
    }

    /// Parse a stored preference; missing or unrecognized values fall back
    /// to the default
    pub fn from_meta(value: Option<&str>) -> Self {
        match value {
            Some("everyone") => Self::Everyone,
            Some("nobody") => Self::Nobody,
            _ => Self::Friends,
        }
    }
}

/// Read a user's visibility preference
pub fn visibility_preference(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<VisibilityPreference, InsightsError> {
    let stored = users::get_meta(conn, user_id, VISIBILITY_META_KEY)?;
    Ok(VisibilityPreference::from_meta(stored.as_deref()))
}

/// Store a user's visibility preference
pub fn set_visibility_preference(
    conn: &mut SqliteConnection,
    user_id: i64,
    preference: VisibilityPreference,
) -> Result<(), InsightsError> {
    users::set_meta(conn, user_id, VISIBILITY_META_KEY, preference.as_str())
}

/// Whether `requesting_user_id` may see who viewed `profile_user_id`
///
/// The owner always may. Otherwise: everyone → yes, nobody → no,
/// friends → only with an accepted connection in either direction.
pub fn can_see_viewers(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    requesting_user_id: i64,
) -> Result<bool, InsightsError> {
    if profile_user_id == requesting_user_id {
        return Ok(true);
    }

    match visibility_preference(conn, profile_user_id)? {
        VisibilityPreference::Everyone => Ok(true),
        VisibilityPreference::Nobody => Ok(false),
        VisibilityPreference::Friends => {
            connections::are_connected(conn, profile_user_id, requesting_user_id)
        }
    }
}
