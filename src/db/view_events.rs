//! Append-only profile view event log
//!
//! `record_view` is the single write path: it rejects self-views and
//! enforces at most one row per viewer (or anonymous IP) per profile per
//! UTC calendar day. The check-then-insert pair is not wrapped in a
//! transaction; a concurrent duplicate from the same viewer in the same
//! instant is tolerated and the distinct-count reads stay correct.
//!
//! Rows are never mutated. Deletion happens only through
//! `purge_older_than`, driven by the retention sweeper.

use diesel::dsl::count_distinct;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::models::{current_day, current_timestamp, NewViewEvent};
use super::schema::view_events;
use crate::error::InsightsError;

// ============================================================================
// Aggregate Row Types
// ============================================================================

/// A distinct authenticated viewer with their latest view instant
#[derive(Debug, Clone, QueryableByName, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerRecency {
    #[diesel(sql_type = BigInt)]
    pub viewer_id: i64,
    #[diesel(sql_type = Text)]
    pub last_viewed_at: String,
}

/// A profile ranked by view count
#[derive(Debug, Clone, QueryableByName, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewCount {
    #[diesel(sql_type = BigInt)]
    pub profile_user_id: i64,
    #[diesel(sql_type = BigInt)]
    pub views: i64,
}

/// A viewer in a mutual-view pair, with the latest activity on either side
#[derive(Debug, Clone, QueryableByName, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualViewer {
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = Text)]
    pub last_activity: String,
}

/// A profile this user viewed, with the latest view instant
#[derive(Debug, Clone, QueryableByName, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecency {
    #[diesel(sql_type = BigInt)]
    pub profile_user_id: i64,
    #[diesel(sql_type = Text)]
    pub last_viewed_at: String,
}

// ============================================================================
// Write Path
// ============================================================================

/// Record a profile view, dedup-gated per UTC day
///
/// Returns `true` when a row was inserted, `false` when the view was a
/// self-view or a same-day repeat. `viewer_id` 0 marks an anonymous
/// viewer; anonymous repeats dedup on `ip` instead.
pub fn record_view(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    viewer_id: i64,
    ip: &str,
) -> Result<bool, InsightsError> {
    if profile_user_id == viewer_id {
        return Ok(false);
    }

    let today = current_day();

    let dedup_check = if viewer_id > 0 {
        view_events::table
            .filter(view_events::profile_user_id.eq(profile_user_id))
            .filter(view_events::viewed_on.eq(&today))
            .filter(view_events::viewer_id.eq(viewer_id))
            .count()
            .get_result::<i64>(conn)
    } else {
        view_events::table
            .filter(view_events::profile_user_id.eq(profile_user_id))
            .filter(view_events::viewed_on.eq(&today))
            .filter(view_events::viewer_id.eq(0))
            .filter(view_events::ip_address.eq(ip))
            .count()
            .get_result::<i64>(conn)
    };
    let already_seen =
        dedup_check.map_err(|e| InsightsError::Internal(format!("Dedup query failed: {}", e)))?;

    if already_seen > 0 {
        debug!(
            "View of profile {} by viewer {} already recorded on {}",
            profile_user_id, viewer_id, today
        );
        return Ok(false);
    }

    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let new_event = NewViewEvent {
        id: &id,
        profile_user_id,
        viewer_id,
        ip_address: ip,
        viewed_on: &today,
        viewed_at: &now,
    };

    diesel::insert_into(view_events::table)
        .values(&new_event)
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Insert failed: {}", e)))?;

    debug!("Recorded view of profile {} by viewer {}", profile_user_id, viewer_id);
    Ok(true)
}

// ============================================================================
// Counts
// ============================================================================

/// Total recorded views of a profile
pub fn total_views(conn: &mut SqliteConnection, profile_user_id: i64) -> Result<i64, InsightsError> {
    view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .count()
        .get_result(conn)
        .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))
}

/// Distinct viewers of a profile: distinct authenticated viewer ids plus
/// distinct anonymous IPs
pub fn unique_views(conn: &mut SqliteConnection, profile_user_id: i64) -> Result<i64, InsightsError> {
    let authenticated: i64 = view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .filter(view_events::viewer_id.gt(0))
        .select(count_distinct(view_events::viewer_id))
        .first(conn)
        .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

    let anonymous: i64 = view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .filter(view_events::viewer_id.eq(0))
        .select(count_distinct(view_events::ip_address))
        .first(conn)
        .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))?;

    Ok(authenticated + anonymous)
}

/// Views of a profile on a single UTC day
pub fn views_on_day(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    day: &str,
) -> Result<i64, InsightsError> {
    view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .filter(view_events::viewed_on.eq(day))
        .count()
        .get_result(conn)
        .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))
}

/// Views of a profile at or after an RFC 3339 instant
pub fn views_since(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    cutoff: &str,
) -> Result<i64, InsightsError> {
    view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .filter(view_events::viewed_at.ge(cutoff))
        .count()
        .get_result(conn)
        .map_err(|e| InsightsError::Internal(format!("Count query failed: {}", e)))
}

/// Per-day view counts for a profile from a start day onward, ascending,
/// days with no events absent (the caller zero-fills)
pub fn daily_counts(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    start_day: &str,
) -> Result<Vec<(String, i64)>, InsightsError> {
    view_events::table
        .filter(view_events::profile_user_id.eq(profile_user_id))
        .filter(view_events::viewed_on.ge(start_day))
        .group_by(view_events::viewed_on)
        .select((view_events::viewed_on, diesel::dsl::count_star()))
        .order(view_events::viewed_on.asc())
        .load(conn)
        .map_err(|e| InsightsError::Internal(format!("History query failed: {}", e)))
}

// ============================================================================
// Rankings & Relations
// ============================================================================

/// Distinct authenticated viewers of a profile, most recent first
pub fn recent_viewers(
    conn: &mut SqliteConnection,
    profile_user_id: i64,
    limit: i64,
) -> Result<Vec<ViewerRecency>, InsightsError> {
    diesel::sql_query(
        r#"
        SELECT viewer_id, MAX(viewed_at) AS last_viewed_at
        FROM view_events
        WHERE profile_user_id = ? AND viewer_id > 0
        GROUP BY viewer_id
        ORDER BY last_viewed_at DESC
        LIMIT ?
        "#,
    )
    .bind::<BigInt, _>(profile_user_id)
    .bind::<BigInt, _>(limit)
    .load(conn)
    .map_err(|e| InsightsError::Internal(format!("Recent viewers query failed: {}", e)))
}

/// Profiles ranked by view count at or after an RFC 3339 instant
pub fn most_viewed(
    conn: &mut SqliteConnection,
    cutoff: &str,
    limit: i64,
) -> Result<Vec<ProfileViewCount>, InsightsError> {
    diesel::sql_query(
        r#"
        SELECT profile_user_id, COUNT(*) AS views
        FROM view_events
        WHERE viewed_at >= ?
        GROUP BY profile_user_id
        ORDER BY views DESC, profile_user_id ASC
        LIMIT ?
        "#,
    )
    .bind::<Text, _>(cutoff)
    .bind::<BigInt, _>(limit)
    .load(conn)
    .map_err(|e| InsightsError::Internal(format!("Most viewed query failed: {}", e)))
}

/// Viewers who viewed this profile and were viewed back by it, ranked by
/// the most recent activity on either side
pub fn mutual_viewers(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<MutualViewer>, InsightsError> {
    diesel::sql_query(
        r#"
        SELECT a.viewer_id AS user_id,
               MAX(MAX(a.viewed_at), MAX(b.viewed_at)) AS last_activity
        FROM view_events a
        JOIN view_events b
          ON b.profile_user_id = a.viewer_id
         AND b.viewer_id = a.profile_user_id
        WHERE a.profile_user_id = ? AND a.viewer_id > 0
        GROUP BY a.viewer_id
        ORDER BY last_activity DESC
        "#,
    )
    .bind::<BigInt, _>(user_id)
    .load(conn)
    .map_err(|e| InsightsError::Internal(format!("Mutual views query failed: {}", e)))
}

/// Profiles this user viewed, most recent first
pub fn viewed_profiles(
    conn: &mut SqliteConnection,
    viewer_id: i64,
    limit: i64,
) -> Result<Vec<ProfileRecency>, InsightsError> {
    diesel::sql_query(
        r#"
        SELECT profile_user_id, MAX(viewed_at) AS last_viewed_at
        FROM view_events
        WHERE viewer_id = ?
        GROUP BY profile_user_id
        ORDER BY last_viewed_at DESC
        LIMIT ?
        "#,
    )
    .bind::<BigInt, _>(viewer_id)
    .bind::<BigInt, _>(limit)
    .load(conn)
    .map_err(|e| InsightsError::Internal(format!("Viewed profiles query failed: {}", e)))
}

// ============================================================================
// Retention
// ============================================================================

/// Delete events strictly older than an RFC 3339 cutoff
pub fn purge_older_than(conn: &mut SqliteConnection, cutoff: &str) -> Result<usize, InsightsError> {
    diesel::delete(view_events::table.filter(view_events::viewed_at.lt(cutoff)))
        .execute(conn)
        .map_err(|e| InsightsError::Internal(format!("Purge failed: {}", e)))
}
