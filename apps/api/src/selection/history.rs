//! History adapter — reads recent usage records for a profile.
//!
//! Preferred source is the aggregated `item_usage_summary` view; when it is
//! unavailable the adapter degrades to scanning raw `plan_item_history` rows
//! and deduplicating by item. When nothing is readable at all it returns an
//! empty snapshot: a new user gets maximum variety, never zero variety.

use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Bounded lookback for item rotation.
pub const ITEM_LOOKBACK_DAYS: i64 = 30;

/// One item's aggregated recent usage.
#[derive(Debug, Clone, FromRow)]
pub struct ItemUsage {
    pub item_id: Uuid,
    pub item_class: String,
    pub last_seen: DateTime<Utc>,
    pub times_seen: i64,
}

#[derive(Debug, Clone)]
pub struct StyleUsage {
    pub style: String,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngredientUsage {
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

/// A raw per-use row, scanned only when the summary view is unavailable
/// (and always, for styles and ingredients, which the view does not carry).
#[derive(Debug, Clone, FromRow)]
pub struct RawUsageRow {
    pub item_id: Uuid,
    pub item_class: String,
    pub seen_at: DateTime<Utc>,
    pub culinary_style: Option<String>,
    pub ingredient_names: Option<Vec<String>>,
}

/// Everything the rotation scorer needs, recomputed fresh on every request.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub items: Vec<ItemUsage>,
    pub styles: Vec<StyleUsage>,
    pub ingredients: Vec<IngredientUsage>,
}

impl HistorySnapshot {
    /// Recipe ids this profile has seen recently — fed to the cascade's
    /// database fallback tier so it prefers unseen recipes.
    pub fn recent_recipe_ids(&self) -> Vec<Uuid> {
        self.items
            .iter()
            .filter(|i| i.item_class == "recipe")
            .map(|i| i.item_id)
            .collect()
    }
}

pub struct HistoryStore<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Builds the rotation snapshot for one profile. Infallible by design:
    /// every upstream failure degrades to a smaller (possibly empty) snapshot.
    pub async fn snapshot(&self, profile_id: Uuid, now: DateTime<Utc>) -> HistorySnapshot {
        let since = now - Duration::days(ITEM_LOOKBACK_DAYS);

        let raw = match self.raw_rows(profile_id, since).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("raw usage history unavailable for {profile_id}: {e}");
                Vec::new()
            }
        };

        let items = match self.summary_rows(profile_id, since).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("usage summary view unavailable, scanning raw history: {e}");
                dedup_latest(&raw)
            }
        };

        HistorySnapshot {
            items,
            styles: styles_from_raw(&raw),
            ingredients: ingredients_from_raw(&raw),
        }
    }

    async fn summary_rows(
        &self,
        profile_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<ItemUsage>, sqlx::Error> {
        sqlx::query_as::<_, ItemUsage>(
            r#"
            SELECT item_id, item_class, last_seen, times_seen
            FROM item_usage_summary
            WHERE profile_id = $1 AND last_seen >= $2
            "#,
        )
        .bind(profile_id)
        .bind(since)
        .fetch_all(self.pool)
        .await
    }

    async fn raw_rows(
        &self,
        profile_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawUsageRow>, sqlx::Error> {
        sqlx::query_as::<_, RawUsageRow>(
            r#"
            SELECT item_id, item_class, seen_at, culinary_style, ingredient_names
            FROM plan_item_history
            WHERE profile_id = $1 AND seen_at >= $2
            ORDER BY seen_at DESC
            "#,
        )
        .bind(profile_id)
        .bind(since)
        .fetch_all(self.pool)
        .await
    }
}

/// Collapses raw per-use rows into one entry per item, keeping the most
/// recent sighting and counting the rest.
pub fn dedup_latest(raw: &[RawUsageRow]) -> Vec<ItemUsage> {
    let mut by_item: HashMap<Uuid, ItemUsage> = HashMap::new();
    for row in raw {
        by_item
            .entry(row.item_id)
            .and_modify(|entry| {
                entry.times_seen += 1;
                if row.seen_at > entry.last_seen {
                    entry.last_seen = row.seen_at;
                }
            })
            .or_insert_with(|| ItemUsage {
                item_id: row.item_id,
                item_class: row.item_class.clone(),
                last_seen: row.seen_at,
                times_seen: 1,
            });
    }
    by_item.into_values().collect()
}

fn styles_from_raw(raw: &[RawUsageRow]) -> Vec<StyleUsage> {
    let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for row in raw {
        if let Some(style) = row.culinary_style.as_deref() {
            let style = style.to_lowercase();
            let seen = latest.entry(style).or_insert(row.seen_at);
            if row.seen_at > *seen {
                *seen = row.seen_at;
            }
        }
    }
    latest
        .into_iter()
        .map(|(style, last_seen)| StyleUsage { style, last_seen })
        .collect()
}

fn ingredients_from_raw(raw: &[RawUsageRow]) -> Vec<IngredientUsage> {
    let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
    for row in raw {
        for name in row.ingredient_names.iter().flatten() {
            let name = name.to_lowercase();
            let seen = latest.entry(name).or_insert(row.seen_at);
            if row.seen_at > *seen {
                *seen = row.seen_at;
            }
        }
    }
    latest
        .into_iter()
        .map(|(name, last_seen)| IngredientUsage { name, last_seen })
        .collect()
}
