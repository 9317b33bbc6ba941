//! Weighted profile field registry
//!
//! The registry is the single place that knows which fields count toward
//! profile completeness, how much each weighs, and where its value lives.
//! Collaborators extend it through `register`/`unregister` at construction
//! time; it is rebuilt per process, never persisted.

use serde::{Deserialize, Serialize};

use crate::error::InsightsError;

/// Field key the calculator applies avatar semantics to (placeholder URLs
/// and boolean-ish metadata values do not count as filled)
pub const AVATAR_KEY: &str = "avatar";

/// Where a field's value lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Named attribute on the core user record
    UserRecord { attribute: String },
    /// Single key in the per-user key-value metadata store
    Metadata { meta_key: String },
    /// Typed profile field, looked up by definition slug
    ProfileField { slug: String },
}

/// A registered profile field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFieldSpec {
    /// Stable key, unique within the registry
    pub key: String,
    /// Positive weight toward the completion percentage
    pub weight: u32,
    /// Human-readable label surfaced in missing-field prompts
    pub label: String,
    /// Value source
    pub source: FieldSource,
    /// Link the presentation layer offers to fill the field
    pub action_link: String,
}

impl ProfileFieldSpec {
    pub fn new(
        key: impl Into<String>,
        weight: u32,
        label: impl Into<String>,
        source: FieldSource,
        action_link: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            weight,
            label: label.into(),
            source,
            action_link: action_link.into(),
        }
    }
}

/// Ordered field registry; registration order is the nudge priority
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<ProfileFieldSpec>,
}

impl FieldRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the stock field set
    pub fn with_defaults() -> Self {
        let fields = vec![
            ProfileFieldSpec::new(
                AVATAR_KEY,
                15,
                "Profile photo",
                FieldSource::UserRecord {
                    attribute: "avatar_url".into(),
                },
                "/profile/edit/avatar",
            ),
            ProfileFieldSpec::new(
                "display_name",
                10,
                "Display name",
                FieldSource::UserRecord {
                    attribute: "display_name".into(),
                },
                "/profile/edit/name",
            ),
            ProfileFieldSpec::new(
                "bio",
                10,
                "About me",
                FieldSource::ProfileField { slug: "bio".into() },
                "/profile/edit/bio",
            ),
            ProfileFieldSpec::new(
                "location",
                5,
                "Location",
                FieldSource::ProfileField {
                    slug: "location".into(),
                },
                "/profile/edit/location",
            ),
            ProfileFieldSpec::new(
                "website",
                5,
                "Website",
                FieldSource::UserRecord {
                    attribute: "website_url".into(),
                },
                "/profile/edit/website",
            ),
            ProfileFieldSpec::new(
                "interests",
                5,
                "Interests",
                FieldSource::Metadata {
                    meta_key: "interests".into(),
                },
                "/profile/edit/interests",
            ),
        ];
        Self { fields }
    }

    /// Register a field; a duplicate key replaces the existing spec in its
    /// original position (last registration wins)
    pub fn register(&mut self, spec: ProfileFieldSpec) -> Result<(), InsightsError> {
        if spec.weight == 0 {
            return Err(InsightsError::InvalidInput(format!(
                "Field {} must have a positive weight",
                spec.key
            )));
        }
        if spec.key.is_empty() {
            return Err(InsightsError::InvalidInput("Field key must not be empty".into()));
        }

        match self.fields.iter_mut().find(|f| f.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        Ok(())
    }

    /// Remove a field by key
    pub fn unregister(&mut self, key: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.key != key);
        self.fields.len() < before
    }

    /// Registered fields in registration order
    pub fn fields(&self) -> &[ProfileFieldSpec] {
        &self.fields
    }

    /// Sum of registered weights
    pub fn total_weight(&self) -> u32 {
        self.fields.iter().map(|f| f.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(key: &str, weight: u32) -> ProfileFieldSpec {
        ProfileFieldSpec::new(
            key,
            weight,
            key,
            FieldSource::Metadata {
                meta_key: key.to_string(),
            },
            format!("/profile/edit/{}", key),
        )
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut registry = FieldRegistry::new();
        assert!(matches!(
            registry.register(spec("bio", 0)),
            Err(InsightsError::InvalidInput(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let mut registry = FieldRegistry::new();
        registry.register(spec("avatar", 15)).unwrap();
        registry.register(spec("bio", 10)).unwrap();
        registry.register(spec("avatar", 20)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.fields()[0].key, "avatar");
        assert_eq!(registry.fields()[0].weight, 20);
        assert_eq!(registry.total_weight(), 30);
    }

    #[test]
    fn test_unregister() {
        let mut registry = FieldRegistry::new();
        registry.register(spec("bio", 10)).unwrap();

        assert!(registry.unregister("bio"));
        assert!(!registry.unregister("bio"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_defaults_keep_avatar_first() {
        let registry = FieldRegistry::with_defaults();
        assert_eq!(registry.fields()[0].key, AVATAR_KEY);
        assert!(registry.total_weight() > 0);
    }
}
