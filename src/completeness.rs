//! Weighted profile completeness scoring
//!
//! Walks the field registry in order, resolves each value and produces a
//! rounded percentage, the missing fields with actionable links, and the
//! next step to nudge. Each field is binary filled/unfilled; there is no
//! partial credit.

use std::collections::BTreeMap;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::users;
use crate::error::InsightsError;
use crate::registry::{FieldRegistry, ProfileFieldSpec, AVATAR_KEY};
use crate::resolver;

/// Metadata marker guarding the one-time completion reward
pub const REWARD_MARKER_KEY: &str = "completeness_rewarded";

// ============================================================================
// Result Types
// ============================================================================

/// Per-field status in a completeness report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub label: String,
    pub completed: bool,
    pub action_link: String,
}

/// A registered field the user has not filled yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingField {
    pub field: String,
    pub label: String,
    pub weight: u32,
    pub action_link: String,
}

/// Completeness of one user's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub user_id: i64,
    /// Rounded 0..=100
    pub percent: u32,
    pub filled_weight: u32,
    pub total_weight: u32,
    /// Unfilled fields in registry order
    pub missing: Vec<MissingField>,
    /// Status per field key
    pub steps: BTreeMap<String, StepStatus>,
    /// First missing field in registry order
    pub next_step: Option<MissingField>,
}

/// Completion percentage buckets for the admin distribution report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDistribution {
    pub bucket_0_25: u64,
    pub bucket_26_50: u64,
    pub bucket_51_75: u64,
    pub bucket_76_99: u64,
    pub complete: u64,
}

/// A user id with their completion percentage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCompletion {
    pub user_id: i64,
    pub percent: u32,
}

// ============================================================================
// Reward Hook
// ============================================================================

/// One-time hook fired when a profile first reaches 100%
pub trait RewardHook: Send + Sync {
    fn on_profile_complete(&self, user_id: i64);
}

// ============================================================================
// Calculator
// ============================================================================

/// Completeness calculator over an injected field registry
pub struct CompletenessCalculator {
    registry: FieldRegistry,
    reward: Option<Box<dyn RewardHook>>,
}

impl CompletenessCalculator {
    pub fn new(registry: FieldRegistry) -> Self {
        Self {
            registry,
            reward: None,
        }
    }

    /// Attach the completion reward hook
    pub fn with_reward(mut self, reward: Box<dyn RewardHook>) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Score one user's profile
    pub fn calculate(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<CompletenessReport, InsightsError> {
        let mut filled_weight = 0u32;
        let mut total_weight = 0u32;
        let mut missing = Vec::new();
        let mut steps = BTreeMap::new();

        for spec in self.registry.fields() {
            total_weight += spec.weight;

            let value = resolver::resolve(conn, user_id, &spec.source)?;
            let completed = field_filled(spec, value.as_deref());

            if completed {
                filled_weight += spec.weight;
            } else {
                missing.push(MissingField {
                    field: spec.key.clone(),
                    label: spec.label.clone(),
                    weight: spec.weight,
                    action_link: spec.action_link.clone(),
                });
            }

            steps.insert(
                spec.key.clone(),
                StepStatus {
                    label: spec.label.clone(),
                    completed,
                    action_link: spec.action_link.clone(),
                },
            );
        }

        let percent = if total_weight > 0 {
            ((filled_weight as f64 / total_weight as f64) * 100.0).round() as u32
        } else {
            0
        };

        debug!(
            "Completeness for user {}: {}% ({}/{})",
            user_id, percent, filled_weight, total_weight
        );

        if percent == 100 {
            self.maybe_award(conn, user_id)?;
        }

        let next_step = missing.first().cloned();
        Ok(CompletenessReport {
            user_id,
            percent,
            filled_weight,
            total_weight,
            missing,
            steps,
            next_step,
        })
    }

    /// Fire the reward hook once per user, guarded by a metadata marker
    fn maybe_award(&self, conn: &mut SqliteConnection, user_id: i64) -> Result<(), InsightsError> {
        let reward = match &self.reward {
            Some(r) => r,
            None => return Ok(()),
        };

        if users::get_meta(conn, user_id, REWARD_MARKER_KEY)?.is_some() {
            return Ok(());
        }

        users::set_meta(conn, user_id, REWARD_MARKER_KEY, "1")?;
        info!("Profile of user {} reached 100%, firing reward", user_id);
        reward.on_profile_complete(user_id);
        Ok(())
    }

    // ========================================================================
    // Batch Reports (admin collaborators, uncached)
    // ========================================================================

    /// Average completion across a sample of the most recently registered
    /// users; 0.0 when there are no users
    pub fn average_completion(
        &self,
        conn: &mut SqliteConnection,
        sample: i64,
    ) -> Result<f64, InsightsError> {
        let sampled = users::recent_users(conn, sample)?;
        if sampled.is_empty() {
            return Ok(0.0);
        }

        let mut sum = 0u64;
        let count = sampled.len() as u64;
        for user in sampled {
            sum += self.calculate(conn, user.id)?.percent as u64;
        }
        Ok(sum as f64 / count as f64)
    }

    /// Completion histogram over a sample of the most recently registered
    /// users
    pub fn completion_distribution(
        &self,
        conn: &mut SqliteConnection,
        sample: i64,
    ) -> Result<CompletionDistribution, InsightsError> {
        let mut distribution = CompletionDistribution::default();

        for user in users::recent_users(conn, sample)? {
            let percent = self.calculate(conn, user.id)?.percent;
            match percent {
                0..=25 => distribution.bucket_0_25 += 1,
                26..=50 => distribution.bucket_26_50 += 1,
                51..=75 => distribution.bucket_51_75 += 1,
                76..=99 => distribution.bucket_76_99 += 1,
                _ => distribution.complete += 1,
            }
        }
        Ok(distribution)
    }

    /// Users under a completion threshold, sampled from the most recently
    /// registered users up to `limit`
    pub fn users_below(
        &self,
        conn: &mut SqliteConnection,
        threshold: u32,
        limit: i64,
    ) -> Result<Vec<UserCompletion>, InsightsError> {
        let mut below = Vec::new();
        for user in users::recent_users(conn, limit)? {
            let percent = self.calculate(conn, user.id)?.percent;
            if percent < threshold {
                below.push(UserCompletion {
                    user_id: user.id,
                    percent,
                });
            }
        }
        Ok(below)
    }
}

// ============================================================================
// Fill Rules
// ============================================================================

/// Whether a resolved value counts as filled for this field
fn field_filled(spec: &ProfileFieldSpec, value: Option<&str>) -> bool {
    let value = match value {
        Some(v) => v.trim(),
        None => return false,
    };
    if value.is_empty() {
        return false;
    }
    if spec.key == AVATAR_KEY {
        return avatar_value_filled(value);
    }
    true
}

/// Avatar values need more than non-emptiness: boolean-ish metadata must be
/// true-like, and URLs must not be a stock placeholder
fn avatar_value_filled(value: &str) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => true,
        "0" | "false" | "no" => false,
        lower => !is_placeholder_avatar(lower),
    }
}

/// Generic placeholder patterns used by external avatar services
fn is_placeholder_avatar(url: &str) -> bool {
    const PLACEHOLDER_MARKERS: [&str; 5] =
        ["d=mm", "d=mystery", "d=blank", "default-avatar", "mystery-man"];
    PLACEHOLDER_MARKERS.iter().any(|marker| url.contains(marker))
}
