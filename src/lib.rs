//! profile-insights - profile completeness scoring and view analytics
//!
//! Library-level subsystem computing derived aggregates over raw per-user
//! facts held in a SQLite row store:
//!
//! - **Completeness**: a weighted completion score per profile, with the
//!   missing fields, a next-step nudge, and a cached result invalidated by
//!   profile writes (`registry`, `resolver`, `completeness`, `cache`).
//! - **View analytics**: an append-only, daily-deduped profile view log
//!   with totals, windows, history series, rankings and mutual-view
//!   intersections (`db::view_events`, `analytics`).
//! - **Privacy**: a per-user visibility preference gating who may see
//!   viewer identities (`privacy`), and a retention sweep bounding how
//!   long view events live (`retention`).
//!
//! Host integration points:
//!
//! - call [`cache::CompletenessCache::invalidate`] whenever a registered
//!   profile field changes
//! - call [`db::view_events::record_view`] on each profile-page load
//! - call [`retention::purge_expired_views`] from a daily schedule
//! - pass viewer lists through [`privacy::can_see_viewers`] before
//!   disclosing identities to anyone but the owner or an admin

pub mod analytics;
pub mod cache;
pub mod completeness;
pub mod config;
pub mod db;
pub mod error;
pub mod privacy;
pub mod registry;
pub mod resolver;
pub mod retention;

pub use analytics::{DailyViews, ViewStats};
pub use cache::{CacheStore, CompletenessCache, MemoryCache};
pub use completeness::{
    CompletenessCalculator, CompletenessReport, CompletionDistribution, MissingField, RewardHook,
    StepStatus, UserCompletion,
};
pub use config::Config;
pub use db::Db;
pub use error::InsightsError;
pub use privacy::VisibilityPreference;
pub use registry::{FieldRegistry, FieldSource, ProfileFieldSpec};
