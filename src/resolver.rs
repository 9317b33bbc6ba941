//! Field value resolution over the three source kinds
//!
//! `resolve` is total: unknown attributes, unknown slugs and missing rows
//! all come back as `None`, never an error. The calculator treats absent
//! as unfilled.

use diesel::prelude::*;

use crate::db::{profile_fields, users};
use crate::error::InsightsError;
use crate::registry::FieldSource;

/// Fetch the current value behind a field source for one user
pub fn resolve(
    conn: &mut SqliteConnection,
    user_id: i64,
    source: &FieldSource,
) -> Result<Option<String>, InsightsError> {
    match source {
        FieldSource::UserRecord { attribute } => users::user_attribute(conn, user_id, attribute),
        FieldSource::Metadata { meta_key } => users::get_meta(conn, user_id, meta_key),
        FieldSource::ProfileField { slug } => profile_fields::get_value(conn, user_id, slug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::CreateUserInput;
    use diesel::Connection;

    fn setup_test_db() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        crate::db::init_schema(&mut conn).expect("Failed to init schema");
        conn
    }

    #[test]
    fn test_resolve_each_source_kind() {
        let mut conn = setup_test_db();
        users::create_user(
            &mut conn,
            CreateUserInput {
                id: 1,
                display_name: "Ada".to_string(),
                website_url: None,
                avatar_url: None,
            },
        )
        .unwrap();
        users::set_meta(&mut conn, 1, "interests", "computing").unwrap();
        profile_fields::create_field(&mut conn, "bio", "About me").unwrap();
        profile_fields::set_value(&mut conn, 1, "bio", "Analyst").unwrap();

        let record = FieldSource::UserRecord {
            attribute: "display_name".into(),
        };
        let meta = FieldSource::Metadata {
            meta_key: "interests".into(),
        };
        let typed = FieldSource::ProfileField { slug: "bio".into() };

        assert_eq!(resolve(&mut conn, 1, &record).unwrap(), Some("Ada".into()));
        assert_eq!(resolve(&mut conn, 1, &meta).unwrap(), Some("computing".into()));
        assert_eq!(resolve(&mut conn, 1, &typed).unwrap(), Some("Analyst".into()));
    }

    #[test]
    fn test_missing_resolves_to_none() {
        let mut conn = setup_test_db();

        let record = FieldSource::UserRecord {
            attribute: "no_such_column".into(),
        };
        let meta = FieldSource::Metadata {
            meta_key: "unset".into(),
        };
        let typed = FieldSource::ProfileField {
            slug: "no_such_slug".into(),
        };

        assert_eq!(resolve(&mut conn, 42, &record).unwrap(), None);
        assert_eq!(resolve(&mut conn, 42, &meta).unwrap(), None);
        assert_eq!(resolve(&mut conn, 42, &typed).unwrap(), None);
    }
}
