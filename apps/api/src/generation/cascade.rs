//! The content cascade — one instance per meal slot per request.
//!
//! An explicit finite state machine: `CacheLookup → LlmGenerate →
//! DbFallback → StaticDefault`. Each state has one entry/exit contract and
//! the collaborators behind each tier are injected traits, so every tier is
//! testable in isolation. The static tier cannot fail and is always
//! reachable — that is the cascade's correctness guarantee.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::generation::prompts::{
    recipe_prompt, snack_prompt, PromptContext, SlotConstraints, RECIPE_SYSTEM,
};
use crate::generation::recipe_parser::parse_recipe;
use crate::generation::snacks;
use crate::llm_client::TextGenerator;
use crate::models::catalog::RecipeRow;
use crate::models::plan::{Ingredient, MealSlot, NutritionEstimate, Recipe, RecipeSource};

/// Minimum average rating a saved recipe needs to qualify as a cache hit.
const MIN_CACHE_RATING: f64 = 3.0;

// ────────────────────────────────────────────────────────────────────────────
// Injected collaborators
// ────────────────────────────────────────────────────────────────────────────

/// A saved recipe with the ingredient list used for overlap checks.
#[derive(Debug, Clone)]
pub struct CachedRecipe {
    pub recipe: Recipe,
    pub ingredient_names: Vec<String>,
}

/// The profile-scoped recipe cache behind the `CacheLookup` tier.
#[async_trait]
pub trait RecipeCacheStore: Send + Sync {
    async fn saved_recipes(
        &self,
        profile_id: Uuid,
        slot: MealSlot,
        style: &str,
    ) -> anyhow::Result<Vec<CachedRecipe>>;
}

/// The backing recipe table behind the `DbFallback` tier.
/// `style = None` broadens the query to all styles.
#[async_trait]
pub trait FallbackRecipeStore: Send + Sync {
    async fn recipes_for_slot(
        &self,
        slot: MealSlot,
        style: Option<&str>,
    ) -> anyhow::Result<Vec<RecipeRow>>;
}

/// The three collaborators one cascade run needs.
pub struct CascadeDeps<'a> {
    pub cache: &'a dyn RecipeCacheStore,
    pub llm: &'a dyn TextGenerator,
    pub recipes: &'a dyn FallbackRecipeStore,
}

/// Everything a single slot's cascade run needs, computed before the
/// concurrent fan-out (including the sibling-slot avoid list).
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub profile_id: Uuid,
    pub slot: MealSlot,
    pub constraints: SlotConstraints,
    pub context: PromptContext,
    pub recent_recipe_ids: HashSet<Uuid>,
    pub force_regeneration: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    CacheLookup,
    LlmGenerate,
    DbFallback,
    StaticDefault,
}

impl CascadeState {
    /// Entry state. Forced regeneration skips the cache entirely — the
    /// cache store must not be queried at all in that case.
    pub fn initial(force_regeneration: bool) -> Self {
        if force_regeneration {
            Self::LlmGenerate
        } else {
            Self::CacheLookup
        }
    }

    /// The transition table. `StaticDefault` is terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::CacheLookup => Some(Self::LlmGenerate),
            Self::LlmGenerate => Some(Self::DbFallback),
            Self::DbFallback => Some(Self::StaticDefault),
            Self::StaticDefault => None,
        }
    }
}

/// Runs the cascade for one meal slot. Infallible: the static tier always
/// produces a structurally valid recipe.
pub async fn run_slot_cascade(deps: &CascadeDeps<'_>, request: &SlotRequest) -> Recipe {
    let mut state = CascadeState::initial(request.force_regeneration);

    loop {
        let outcome = match state {
            CascadeState::CacheLookup => try_cache(deps.cache, request).await,
            CascadeState::LlmGenerate => try_llm(deps.llm, request).await,
            CascadeState::DbFallback => try_db_fallback(deps.recipes, request).await,
            CascadeState::StaticDefault => {
                return static_default_recipe(
                    request.slot,
                    &request.constraints.style,
                    &request.constraints.mandatory_ingredients,
                )
            }
        };

        match outcome {
            Some(recipe) => {
                debug_assert!(recipe.is_structurally_valid());
                info!(
                    "{} recipe resolved by {:?} tier",
                    request.slot.as_str(),
                    recipe.source
                );
                return recipe;
            }
            None => state = state.next().unwrap_or(CascadeState::StaticDefault),
        }
    }
}

/// The snack slot uses a narrower two-tier cascade: LLM → static pool.
pub async fn run_snack_cascade(llm: &dyn TextGenerator, context: &PromptContext) -> Recipe {
    let prompt = snack_prompt(context);
    match llm.complete(RECIPE_SYSTEM, &prompt).await {
        Ok(text) => {
            if let Some(recipe) = parse_recipe(&text, MealSlot::Snack, "simple") {
                return recipe;
            }
            warn!("snack LLM output unparseable, drawing from static pool");
        }
        Err(e) => warn!("snack LLM call failed, drawing from static pool: {e}"),
    }
    snacks::draw_snack(&mut rand::thread_rng(), &context.primary_need)
}

// ────────────────────────────────────────────────────────────────────────────
// Tier: cache lookup
// ────────────────────────────────────────────────────────────────────────────

/// Required ingredient overlap for a cache hit: 60% of the mandatory list
/// or 3 shared ingredients, whichever is smaller.
pub fn cache_overlap_threshold(mandatory_len: usize) -> usize {
    let sixty_percent = (0.6 * mandatory_len as f64).ceil() as usize;
    sixty_percent.min(3)
}

fn ingredient_overlap(cached: &[String], mandatory: &[String]) -> usize {
    mandatory
        .iter()
        .filter(|m| cached.iter().any(|c| c.eq_ignore_ascii_case(m.as_str())))
        .count()
}

async fn try_cache(cache: &dyn RecipeCacheStore, request: &SlotRequest) -> Option<Recipe> {
    let rows = match cache
        .saved_recipes(request.profile_id, request.slot, &request.constraints.style)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("recipe cache unavailable: {e}");
            return None;
        }
    };

    let threshold = cache_overlap_threshold(request.constraints.mandatory_ingredients.len());

    rows.into_iter()
        .find(|c| {
            c.recipe.is_structurally_valid()
                && ingredient_overlap(
                    &c.ingredient_names,
                    &request.constraints.mandatory_ingredients,
                ) >= threshold
        })
        .map(|c| Recipe {
            meal_slot: request.slot,
            source: RecipeSource::Cache,
            ..c.recipe
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Tier: LLM generation
// ────────────────────────────────────────────────────────────────────────────

async fn try_llm(llm: &dyn TextGenerator, request: &SlotRequest) -> Option<Recipe> {
    let prompt = recipe_prompt(request.slot, &request.constraints, &request.context);

    match llm.complete(RECIPE_SYSTEM, &prompt).await {
        Ok(text) => parse_recipe(&text, request.slot, &request.constraints.style),
        Err(e) => {
            warn!("{} LLM generation failed: {e}", request.slot.as_str());
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tier: database fallback
// ────────────────────────────────────────────────────────────────────────────

async fn try_db_fallback(
    store: &dyn FallbackRecipeStore,
    request: &SlotRequest,
) -> Option<Recipe> {
    let style = request.constraints.style.as_str();

    let mut rows = match store.recipes_for_slot(request.slot, Some(style)).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("recipe table unavailable: {e}");
            return None;
        }
    };

    // No recipe in this style — broaden to all styles.
    if rows.is_empty() {
        rows = store
            .recipes_for_slot(request.slot, None)
            .await
            .unwrap_or_default();
    }

    rows.retain(|r| !r.ingredient_names.is_empty());
    if rows.is_empty() {
        return None;
    }

    // Prefer recipes this profile has not seen recently, unless that
    // empties the pool.
    let unseen: Vec<RecipeRow> = rows
        .iter()
        .filter(|r| !request.recent_recipe_ids.contains(&r.id))
        .cloned()
        .collect();
    let mut pool = if unseen.is_empty() { rows } else { unseen };

    // Full shuffle before taking the head — picking index 0 of a stable
    // query result always returned the same record.
    pool.shuffle(&mut rand::thread_rng());
    pool.into_iter().next().map(recipe_from_row)
}

/// Converts a backing-table row into a served recipe.
fn recipe_from_row(row: RecipeRow) -> Recipe {
    let mut instructions = split_instructions(row.instructions.as_deref().unwrap_or(""));
    if instructions.is_empty() {
        instructions = vec!["Prepare according to the ingredient list.".to_string()];
    }

    let nutrition = match (row.calories, row.protein_g, row.carbs_g, row.fat_g) {
        (Some(calories), protein, carbs, fat) => Some(NutritionEstimate {
            calories,
            protein_g: protein.unwrap_or(0.0),
            carbs_g: carbs.unwrap_or(0.0),
            fat_g: fat.unwrap_or(0.0),
        }),
        _ => None,
    };

    Recipe {
        source_id: Some(row.id),
        name: row.name,
        meal_slot: MealSlot::parse(&row.meal_slot).unwrap_or(MealSlot::Lunch),
        culinary_style: row.culinary_style.unwrap_or_else(|| "other".to_string()),
        ingredients: row
            .ingredient_names
            .into_iter()
            .map(|name| Ingredient {
                name,
                quantity: 1.0,
                unit: "portion".to_string(),
            })
            .collect(),
        instructions,
        prep_minutes: row.prep_minutes.unwrap_or(15) as u32,
        cook_minutes: row.cook_minutes.unwrap_or(20) as u32,
        servings: row.servings.unwrap_or(2) as u16,
        nutrition,
        tips: vec![],
        source: RecipeSource::Database,
    }
}

/// Splits a stored instruction blob into steps: one per line, numbered
/// prefixes ("1. ") stripped.
fn split_instructions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches('.')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tier: static default
// ────────────────────────────────────────────────────────────────────────────

const STATIC_INGREDIENT_CAP: usize = 4;

/// Deterministic hardcoded recipe for a slot, built from the mandatory list
/// truncated to four items with fixed quantity placeholders. Cannot fail.
pub fn static_default_recipe(slot: MealSlot, style: &str, mandatory: &[String]) -> Recipe {
    let (name, fallback_ingredients): (&str, &[&str]) = match slot {
        MealSlot::Breakfast => (
            "Energizing Morning Bowl",
            &["whole-grain flakes", "plant milk", "fresh fruit"],
        ),
        MealSlot::Lunch => (
            "Midday Energy Bowl",
            &["legumes", "seasonal vegetables", "whole grains"],
        ),
        MealSlot::Dinner => (
            "Light Recovery Dinner",
            &["seasonal vegetables", "legumes", "homemade broth"],
        ),
        MealSlot::Snack => ("Simple Afternoon Break", &["seasonal fruit", "mixed nuts"]),
    };

    let ingredients: Vec<Ingredient> = if mandatory.is_empty() {
        fallback_ingredients
            .iter()
            .map(|n| Ingredient {
                name: n.to_string(),
                quantity: 1.0,
                unit: "portion".to_string(),
            })
            .collect()
    } else {
        mandatory
            .iter()
            .take(STATIC_INGREDIENT_CAP)
            .map(|n| Ingredient {
                name: n.clone(),
                quantity: 1.0,
                unit: "portion".to_string(),
            })
            .collect()
    };

    Recipe {
        source_id: None,
        name: name.to_string(),
        meal_slot: slot,
        culinary_style: style.to_string(),
        ingredients,
        instructions: vec![
            "Prepare the ingredients.".to_string(),
            "Assemble and season to taste.".to_string(),
            "Savor mindfully.".to_string(),
        ],
        prep_minutes: 10,
        cook_minutes: if slot == MealSlot::Breakfast { 5 } else { 15 },
        servings: 2,
        nutrition: None,
        tips: vec!["Chewing slowly improves digestion and satiety.".to_string()],
        source: RecipeSource::StaticDefault,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Production collaborators
// ────────────────────────────────────────────────────────────────────────────

/// Cache tier backed by the `saved_recipes` table. LLM output is never
/// written back here — the cache only serves content validated elsewhere.
pub struct PgRecipeCache {
    pool: PgPool,
}

impl PgRecipeCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SavedRecipeRow {
    recipe_json: Value,
    ingredient_names: Vec<String>,
}

#[async_trait]
impl RecipeCacheStore for PgRecipeCache {
    async fn saved_recipes(
        &self,
        profile_id: Uuid,
        slot: MealSlot,
        style: &str,
    ) -> anyhow::Result<Vec<CachedRecipe>> {
        let rows = sqlx::query_as::<_, SavedRecipeRow>(
            r#"
            SELECT recipe_json, ingredient_names
            FROM saved_recipes
            WHERE profile_id = $1
              AND meal_slot = $2
              AND culinary_style = $3
              AND avg_rating >= $4
            LIMIT 10
            "#,
        )
        .bind(profile_id)
        .bind(slot.as_str())
        .bind(style)
        .bind(MIN_CACHE_RATING)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let recipe = serde_json::from_value::<Recipe>(row.recipe_json).ok()?;
                Some(CachedRecipe {
                    recipe,
                    ingredient_names: row.ingredient_names,
                })
            })
            .collect())
    }
}

/// Fallback tier backed by the safety-filtered recipe list fetched at the
/// start of the request — the cascade never sees a recipe the profile
/// cannot eat.
pub struct InMemoryRecipeStore {
    rows: Vec<RecipeRow>,
}

impl InMemoryRecipeStore {
    pub fn new(rows: Vec<RecipeRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl FallbackRecipeStore for InMemoryRecipeStore {
    async fn recipes_for_slot(
        &self,
        slot: MealSlot,
        style: Option<&str>,
    ) -> anyhow::Result<Vec<RecipeRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.meal_slot == slot.as_str())
            .filter(|r| match style {
                Some(style) => r
                    .culinary_style
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(style)),
                None => true,
            })
            .cloned()
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
