//! Rotation scoring — converts raw usage history into per-item freshness.
//!
//! Freshness is a recency-decayed multiplier in [0.05, 1.0]: items used
//! recently are penalized, items never seen get full credit. Derived purely
//! from timestamps; recomputed fresh on every request.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::catalog::ProductRow;
use crate::selection::history::HistorySnapshot;

/// Ingredients used in meals within this window are banned from the
/// mandatory pool of the current request.
pub const INGREDIENT_BAN_DAYS: i64 = 7;

/// The ban is lifted when enforcing it would leave fewer candidates than
/// this — availability over strict novelty.
pub const MIN_POOL_AFTER_BAN: usize = 9;

pub const FULL_FRESHNESS: f64 = 1.0;
const FRESH_UNDER_7_DAYS: f64 = 0.40;
const FRESH_7_TO_14_DAYS: f64 = 0.65;
const FRESH_14_TO_30_DAYS: f64 = 0.85;
const MIN_FRESHNESS: f64 = 0.05;
/// Extra penalty per sighting beyond the first inside the lookback window.
const REPEAT_SIGHTING_PENALTY: f64 = 0.10;

/// Freshness multiplier for an item last used `age_days` ago.
pub fn freshness_for_age(age_days: f64) -> f64 {
    if age_days < 7.0 {
        FRESH_UNDER_7_DAYS
    } else if age_days < 14.0 {
        FRESH_7_TO_14_DAYS
    } else if age_days < 30.0 {
        FRESH_14_TO_30_DAYS
    } else {
        FULL_FRESHNESS
    }
}

/// Freshness with repeat-sighting stacking, floored at [`MIN_FRESHNESS`].
pub fn decayed_freshness(age_days: f64, times_seen: i64) -> f64 {
    let repeats = (times_seen - 1).max(0) as f64;
    (freshness_for_age(age_days) - repeats * REPEAT_SIGHTING_PENALTY).max(MIN_FRESHNESS)
}

/// The rotation state for one request: item and style freshness maps plus
/// the 7-day ingredient ban set. Lookups for unknown ids return full
/// freshness — a candidate absent from history always gets maximum credit.
#[derive(Debug, Clone, Default)]
pub struct RotationScores {
    items: HashMap<Uuid, f64>,
    styles: HashMap<String, f64>,
    banned_ingredients: HashSet<String>,
}

impl RotationScores {
    pub fn from_history(history: &HistorySnapshot, now: DateTime<Utc>) -> Self {
        let items = history
            .items
            .iter()
            .map(|item| {
                let age = age_in_days(item.last_seen, now);
                (item.item_id, decayed_freshness(age, item.times_seen))
            })
            .collect();

        let styles = history
            .styles
            .iter()
            .map(|s| {
                let age = age_in_days(s.last_seen, now);
                (s.style.clone(), freshness_for_age(age))
            })
            .collect();

        let banned_ingredients = history
            .ingredients
            .iter()
            .filter(|i| age_in_days(i.last_seen, now) < INGREDIENT_BAN_DAYS as f64)
            .map(|i| i.name.clone())
            .collect();

        Self {
            items,
            styles,
            banned_ingredients,
        }
    }

    pub fn item_freshness(&self, id: Uuid) -> f64 {
        self.items.get(&id).copied().unwrap_or(FULL_FRESHNESS)
    }

    pub fn style_freshness(&self, style: &str) -> f64 {
        self.styles
            .get(&style.to_lowercase())
            .copied()
            .unwrap_or(FULL_FRESHNESS)
    }

    pub fn is_ingredient_banned(&self, name: &str) -> bool {
        self.banned_ingredients.contains(&name.to_lowercase())
    }

    pub fn banned_ingredients(&self) -> &HashSet<String> {
        &self.banned_ingredients
    }
}

/// Removes recently-used ingredients from the food candidate pool, unless
/// the ban would shrink it below [`MIN_POOL_AFTER_BAN`].
pub fn apply_ingredient_ban(foods: Vec<ProductRow>, rotation: &RotationScores) -> Vec<ProductRow> {
    let kept: Vec<ProductRow> = foods
        .iter()
        .filter(|f| !rotation.is_ingredient_banned(&f.name))
        .cloned()
        .collect();

    if kept.len() < MIN_POOL_AFTER_BAN {
        tracing::debug!(
            "ingredient ban lifted: {} of {} candidates would remain",
            kept.len(),
            foods.len()
        );
        return foods;
    }
    kept
}

fn age_in_days(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - last_seen).num_seconds() as f64 / 86_400.0
}
