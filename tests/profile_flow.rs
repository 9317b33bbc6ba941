//! End-to-end flow over the public API: seed a small community, score
//! profiles through the cache, record views, and read analytics through
//! the privacy gate.

use profile_insights::db::models::connection_status;
use profile_insights::db::users::CreateUserInput;
use profile_insights::db::{connections, profile_fields, users, view_events};
use profile_insights::{
    analytics, privacy, retention, CompletenessCache, CompletenessCalculator, Db, FieldRegistry,
    VisibilityPreference,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn seed(db: &Db) {
    let mut conn = db.conn().unwrap();

    for (id, name, avatar) in [
        (1, "Ada", Some("https://cdn.example/u/1.png")),
        (2, "Grace", None),
        (3, "Edsger", None),
    ] {
        users::create_user(
            &mut conn,
            CreateUserInput {
                id,
                display_name: name.to_string(),
                website_url: None,
                avatar_url: avatar.map(|s| s.to_string()),
            },
        )
        .unwrap();
    }

    for (slug, label) in [("bio", "About me"), ("location", "Location")] {
        profile_fields::create_field(&mut conn, slug, label).unwrap();
    }
}

#[test]
fn completeness_through_cache_with_invalidation() {
    init_tracing();
    let db = Db::open_in_memory().unwrap();
    seed(&db);

    let cache = CompletenessCache::new(CompletenessCalculator::new(FieldRegistry::with_defaults()));

    let mut conn = db.conn().unwrap();
    let before = cache.get(&mut conn, 1).unwrap();
    assert!(before.percent < 100);
    assert!(before.next_step.is_some());

    // Host write path: store a field value, then invalidate
    profile_fields::set_value(&mut conn, 1, "bio", "Wrote the first program").unwrap();
    cache.invalidate(1);

    let after = cache.get(&mut conn, 1).unwrap();
    assert!(after.percent > before.percent);
    assert!(!after.missing.iter().any(|m| m.field == "bio"));
}

#[test]
fn views_analytics_and_privacy_gate() {
    init_tracing();
    let db = Db::open_in_memory().unwrap();
    seed(&db);
    let mut conn = db.conn().unwrap();

    // Grace and Edsger view Ada; Ada views Grace back
    assert!(view_events::record_view(&mut conn, 1, 2, "10.0.0.2").unwrap());
    assert!(view_events::record_view(&mut conn, 1, 3, "10.0.0.3").unwrap());
    assert!(view_events::record_view(&mut conn, 2, 1, "10.0.0.1").unwrap());
    // Same-day repeat is a no-op
    assert!(!view_events::record_view(&mut conn, 1, 2, "10.0.0.2").unwrap());

    let stats = analytics::stats(&mut conn, 1).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.unique, 2);
    assert_eq!(stats.today, 2);

    let mutual = analytics::mutual_views(&mut conn, 1).unwrap();
    assert_eq!(mutual.len(), 1);
    assert_eq!(mutual[0].user_id, 2);

    // Default preference is friends: no connection, no viewer list
    assert!(!privacy::can_see_viewers(&mut conn, 1, 2).unwrap());

    connections::create_connection(&mut conn, 1, 2, connection_status::ACCEPTED).unwrap();
    assert!(privacy::can_see_viewers(&mut conn, 1, 2).unwrap());

    // Owner bypasses the preference entirely
    privacy::set_visibility_preference(&mut conn, 1, VisibilityPreference::Nobody).unwrap();
    assert!(privacy::can_see_viewers(&mut conn, 1, 1).unwrap());
    assert!(!privacy::can_see_viewers(&mut conn, 1, 2).unwrap());

    let viewers = analytics::recent_viewers(&mut conn, 1, 10).unwrap();
    assert_eq!(viewers.len(), 2);

    // History covers the requested span exactly
    let series = analytics::history(&mut conn, 1, 14).unwrap();
    assert_eq!(series.len(), 14);
    assert_eq!(series.iter().map(|d| d.views).sum::<i64>(), 2);

    // Fresh events survive the default retention sweep
    assert_eq!(
        retention::purge_expired_views(&mut conn, retention::DEFAULT_RETENTION_DAYS).unwrap(),
        0
    );
    assert_eq!(analytics::total_views(&mut conn, 1).unwrap(), 2);
}
