//! Read-side view analytics
//!
//! Pure queries over the view event log. Windows are computed relative to
//! call-time now; nothing here is cached. Every function returns a defined
//! zero/empty result for a user with no data.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::view_events;
pub use crate::db::view_events::{MutualViewer, ProfileRecency, ProfileViewCount, ViewerRecency};
use crate::error::InsightsError;

/// View counters for one profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub total: i64,
    pub unique: i64,
    pub today: i64,
    pub week: i64,
    pub month: i64,
}

/// One day in a view history series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyViews {
    pub date: String,
    pub views: i64,
}

fn instant_days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Total recorded views of a profile
pub fn total_views(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, InsightsError> {
    view_events::total_views(conn, user_id)
}

/// Distinct viewers of a profile (viewer ids for authenticated views,
/// IPs for anonymous ones)
pub fn unique_views(conn: &mut SqliteConnection, user_id: i64) -> Result<i64, InsightsError> {
    view_events::unique_views(conn, user_id)
}

/// Full counter bundle: total, unique, today, trailing 7 and 30 days
pub fn stats(conn: &mut SqliteConnection, user_id: i64) -> Result<ViewStats, InsightsError> {
    let today = Utc::now().format("%Y-%m-%d").to_string();

    Ok(ViewStats {
        total: view_events::total_views(conn, user_id)?,
        unique: view_events::unique_views(conn, user_id)?,
        today: view_events::views_on_day(conn, user_id, &today)?,
        week: view_events::views_since(conn, user_id, &instant_days_ago(7))?,
        month: view_events::views_since(conn, user_id, &instant_days_ago(30))?,
    })
}

/// Dense per-day series covering exactly `days` consecutive UTC days
/// ending today, ascending, zero-filled for days with no events
pub fn history(
    conn: &mut SqliteConnection,
    user_id: i64,
    days: u32,
) -> Result<Vec<DailyViews>, InsightsError> {
    if days == 0 {
        return Ok(Vec::new());
    }

    let today = Utc::now().date_naive();
    let start = today - Duration::days(days as i64 - 1);

    let counted = view_events::daily_counts(conn, user_id, &start.format("%Y-%m-%d").to_string())?;

    let mut series = Vec::with_capacity(days as usize);
    for offset in 0..days {
        let date = (start + Duration::days(offset as i64)).format("%Y-%m-%d").to_string();
        let views = counted
            .iter()
            .find(|(day, _)| *day == date)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        series.push(DailyViews { date, views });
    }
    Ok(series)
}

/// Distinct authenticated viewers of a profile, most recent first;
/// anonymous views are excluded
pub fn recent_viewers(
    conn: &mut SqliteConnection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ViewerRecency>, InsightsError> {
    view_events::recent_viewers(conn, user_id, limit)
}

/// Profiles ranked by view count within a trailing window of `since_days`
pub fn most_viewed(
    conn: &mut SqliteConnection,
    since_days: i64,
    limit: i64,
) -> Result<Vec<ProfileViewCount>, InsightsError> {
    view_events::most_viewed(conn, &instant_days_ago(since_days), limit)
}

/// Viewers who both viewed this profile and were viewed back by it,
/// ranked by most recent mutual activity
pub fn mutual_views(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<MutualViewer>, InsightsError> {
    view_events::mutual_viewers(conn, user_id)
}

/// Profiles this user viewed, most recent first
pub fn who_i_viewed(
    conn: &mut SqliteConnection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ProfileRecency>, InsightsError> {
    view_events::viewed_profiles(conn, user_id, limit)
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
    fn test_empty_store_yields_zeroes() {
        let mut conn = setup_test_db();

        let s = stats(&mut conn, 1).unwrap();
        assert_eq!(s.total, 0);
        assert_eq!(s.unique, 0);
        assert_eq!(s.today, 0);
        assert_eq!(s.week, 0);
        assert_eq!(s.month, 0);

        assert!(recent_viewers(&mut conn, 1, 10).unwrap().is_empty());
        assert!(most_viewed(&mut conn, 30, 10).unwrap().is_empty());
        assert!(mutual_views(&mut conn, 1).unwrap().is_empty());
        assert!(who_i_viewed(&mut conn, 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_stats_count_todays_views() {
        let mut conn = setup_test_db();

        assert!(view_events::record_view(&mut conn, 1, 2, "10.0.0.2").unwrap());
        assert!(view_events::record_view(&mut conn, 1, 3, "10.0.0.3").unwrap());

        let s = stats(&mut conn, 1).unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.unique, 2);
        assert_eq!(s.today, 2);
        assert_eq!(s.week, 2);
        assert_eq!(s.month, 2);
    }

    #[test]
    fn test_history_is_dense_and_ascending() {
        let mut conn = setup_test_db();

        assert!(view_events::record_view(&mut conn, 1, 2, "10.0.0.2").unwrap());

        let series = history(&mut conn, 1, 7).unwrap();
        assert_eq!(series.len(), 7);
        // Ascending dates, today last
        for window in series.windows(2) {
            assert!(window[0].date < window[1].date);
        }
        assert_eq!(series[6].views, 1);
        assert_eq!(series.iter().map(|d| d.views).sum::<i64>(), 1);
        // Zero-filled gaps
        assert!(series[..6].iter().all(|d| d.views == 0));
    }

    #[test]
    fn test_history_zero_days() {
        let mut conn = setup_test_db();
        assert!(history(&mut conn, 1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_history_single_day() {
        let mut conn = setup_test_db();
        let series = history(&mut conn, 1, 1).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].views, 0);
        assert_eq!(series[0].date, Utc::now().format("%Y-%m-%d").to_string());
    }
}
