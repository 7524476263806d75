//! Plan assembly — the full generation pipeline.
//!
//! Flow: fetch profile → safety filter + history (concurrent) → rotation →
//! composite scoring → weighted sampling → pre-assign slot ingredients →
//! cascade fan-out (concurrent) → motivation/tip → persist → track.
//!
//! Persistence of the plan row and the per-item tracking rows is
//! best-effort: a write failure is logged and the in-memory plan is still
//! returned to the caller.

use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::cascade::{
    run_slot_cascade, run_snack_cascade, CascadeDeps, InMemoryRecipeStore, PgRecipeCache,
    SlotRequest,
};
use crate::generation::prompts::{
    motivation_prompt, tip_prompt, PromptContext, SlotConstraints, COACH_SYSTEM,
};
use crate::llm_client::TextGenerator;
use crate::models::catalog::{Candidate, CandidateClass, ProductRow, RoutineRow, ScoredCandidate};
use crate::models::plan::{GeneratedPlan, MealSlot, RecommendedProduct, RecommendedRoutine};
use crate::models::profile::{NeedContext, UserProfile};
use crate::safety::{self, SafeCatalog};
use crate::selection::history::HistoryStore;
use crate::selection::rotation::{apply_ingredient_ban, RotationScores};
use crate::selection::sampler::sample_weighted;
use crate::selection::scoring::score_candidates;
use crate::selection::style::draw_styles;
use crate::state::AppState;

pub const MAX_NUTRACEUTICALS: usize = 3;
pub const MAX_AROMATHERAPY: usize = 2;
pub const MAX_ROUTINES: usize = 3;
pub const PLAN_VALIDITY_DAYS: i64 = 7;

const PROTEINS_PER_PLAN: usize = 2;
const VEGETABLES_PER_PLAN: usize = 4;
const CEREALS_PER_PLAN: usize = 2;
const SPICES_PER_PLAN: usize = 2;

const DEFAULT_MEAL_MINUTES: u32 = 45;
const BREAKFAST_MINUTES: u32 = 15;

const DEFAULT_MOTIVATION: &str = "This plan was made for you. Enjoy every moment of it!";
const DEFAULT_TIP: &str = "Take the time to eat slowly and mindfully today.";

/// The orchestrator's input, already validated by the handler.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub profile_id: Uuid,
    pub needs: Vec<String>,
    pub primary_need: Option<String>,
    pub force_regeneration: bool,
    pub same_theme_for_all_meals: bool,
}

/// The assembled plan plus its persisted id, or `None` when the plan row
/// insert failed (the plan itself is still served).
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: GeneratedPlan,
    pub plan_id: Option<Uuid>,
}

/// Runs the full pipeline for one request.
pub async fn generate_daily_plan(
    state: &AppState,
    request: PlanRequest,
) -> Result<PlanOutcome, AppError> {
    let now = Utc::now();

    let profile = fetch_profile(&state.db, request.profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", request.profile_id)))?;

    let needs = NeedContext::new(request.needs.clone(), request.primary_need.clone(), None);
    info!(
        "generating plan for profile {} (needs: {:?}, primary: {})",
        profile.id, needs.needs, needs.primary
    );

    let history_store = HistoryStore::new(&state.db);
    let (catalog, history) = tokio::join!(
        safety::fetch_safe_catalog(&state.db, &profile, &needs.needs),
        history_store.snapshot(profile.id, now),
    );
    let catalog = catalog?;
    let rotation = RotationScores::from_history(&history, now);

    // All sampling happens synchronously here, before the async fan-out:
    // the sibling-slot exclusion lists are fixed from the pre-assigned
    // ingredient groups, never updated live.
    let selection = {
        let mut rng = rand::thread_rng();
        select_entities(
            &mut rng,
            &catalog,
            &needs,
            &rotation,
            &profile,
            request.same_theme_for_all_meals,
        )
    };

    let context = PromptContext {
        regimes: profile.regimes(),
        allergens: profile.allergens.clone(),
        budget: profile.budget(),
        needs: needs.needs.clone(),
        primary_need: needs.primary.clone(),
    };

    let recent_recipe_ids: HashSet<Uuid> = history.recent_recipe_ids().into_iter().collect();
    let cache = PgRecipeCache::new(state.db.clone());
    let recipe_store = InMemoryRecipeStore::new(catalog.recipes.clone());
    let deps = CascadeDeps {
        cache: &cache,
        llm: &state.llm,
        recipes: &recipe_store,
    };

    let slot_request = |slot: MealSlot, style: &str, mandatory: &[String], avoid: Vec<String>| {
        SlotRequest {
            profile_id: profile.id,
            slot,
            constraints: SlotConstraints {
                style: style.to_string(),
                mandatory_ingredients: mandatory.to_vec(),
                avoid_ingredients: avoid,
                max_total_minutes: meal_minutes(slot, &profile),
            },
            context: context.clone(),
            recent_recipe_ids: recent_recipe_ids.clone(),
            force_regeneration: request.force_regeneration,
        }
    };

    let slots = &selection.slot_ingredients;
    let breakfast_req = slot_request(
        MealSlot::Breakfast,
        &selection.styles[0],
        &slots.breakfast,
        [slots.lunch.clone(), slots.dinner.clone()].concat(),
    );
    let lunch_req = slot_request(
        MealSlot::Lunch,
        &selection.styles[1],
        &slots.lunch,
        [slots.breakfast.clone(), slots.dinner.clone()].concat(),
    );
    let dinner_req = slot_request(
        MealSlot::Dinner,
        &selection.styles[2],
        &slots.dinner,
        [slots.breakfast.clone(), slots.lunch.clone()].concat(),
    );

    // The three meal cascades and the snack cascade are independent once
    // the avoid lists are fixed — fan out concurrently.
    let (breakfast, lunch, dinner, snack) = tokio::join!(
        run_slot_cascade(&deps, &breakfast_req),
        run_slot_cascade(&deps, &lunch_req),
        run_slot_cascade(&deps, &dinner_req),
        run_snack_cascade(&state.llm, &context),
    );

    let motivation_prompt_text = motivation_prompt(profile.first_name.as_deref(), &context);
    let tip_prompt_text = tip_prompt(&context);
    let (motivational_message, tip_of_the_day) = tokio::join!(
        coach_text(
            &state.llm,
            &motivation_prompt_text,
            DEFAULT_MOTIVATION,
        ),
        coach_text(&state.llm, &tip_prompt_text, DEFAULT_TIP),
    );

    let plan = GeneratedPlan {
        profile_id: profile.id,
        needs: needs.needs.clone(),
        primary_need: needs.primary.clone(),
        nutraceuticals: selection.nutraceuticals,
        aromatherapy: selection.aromatherapy,
        routines: selection.routines,
        breakfast,
        lunch,
        dinner,
        snack,
        motivational_message,
        tip_of_the_day,
        generated_at: now,
        expires_at: now + Duration::days(PLAN_VALIDITY_DAYS),
    };

    let plan_id = persist_plan(&state.db, &plan).await;
    spawn_tracking(state.db.clone(), profile.id, plan_id, collect_tracked_items(&plan));

    Ok(PlanOutcome { plan, plan_id })
}

// ────────────────────────────────────────────────────────────────────────────
// Entity selection
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SlotIngredients {
    pub breakfast: Vec<String>,
    pub lunch: Vec<String>,
    pub dinner: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SelectedEntities {
    pub nutraceuticals: Vec<RecommendedProduct>,
    pub aromatherapy: Vec<RecommendedProduct>,
    pub routines: Vec<RecommendedRoutine>,
    pub slot_ingredients: SlotIngredients,
    /// One style per meal slot (breakfast, lunch, dinner).
    pub styles: Vec<String>,
}

/// Scores and samples everything the plan needs. Pure except for the rng.
pub fn select_entities<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &SafeCatalog,
    needs: &NeedContext,
    rotation: &RotationScores,
    profile: &UserProfile,
    same_theme: bool,
) -> SelectedEntities {
    let mut nutra_candidates = Vec::new();
    let mut aroma_candidates = Vec::new();
    let mut foods = Vec::new();
    for product in &catalog.products {
        match product.class() {
            CandidateClass::Nutraceutical => nutra_candidates.push(Candidate::from_product(product)),
            CandidateClass::Aromatherapy => aroma_candidates.push(Candidate::from_product(product)),
            CandidateClass::Food => foods.push(product.clone()),
            _ => {}
        }
    }
    let routine_candidates: Vec<Candidate> =
        catalog.routines.iter().map(Candidate::from_routine).collect();

    let pick = |rng: &mut R, candidates: Vec<Candidate>, n: usize| -> Vec<ScoredCandidate> {
        let scored = score_candidates(candidates, needs, rotation);
        sample_weighted(rng, scored, n, |c| c.total)
    };

    let nutraceuticals = pick(rng, nutra_candidates, MAX_NUTRACEUTICALS)
        .into_iter()
        .filter_map(|s| recommended_product(&s, &catalog.products))
        .collect();
    let aromatherapy = pick(rng, aroma_candidates, MAX_AROMATHERAPY)
        .into_iter()
        .filter_map(|s| recommended_product(&s, &catalog.products))
        .collect();
    let routines = pick(rng, routine_candidates, MAX_ROUTINES)
        .into_iter()
        .filter_map(|s| recommended_routine(&s, &catalog.routines))
        .collect();

    // Food ingredients: ban recently-used names (unless the pool would
    // collapse), then sample each nutritional group.
    let foods = apply_ingredient_ban(foods, rotation);
    let groups = group_foods(&foods);

    let pick_names = |rng: &mut R, group: Vec<ProductRow>, n: usize| -> Vec<String> {
        let candidates: Vec<Candidate> = group.iter().map(Candidate::from_product).collect();
        pick(rng, candidates, n)
            .into_iter()
            .map(|s| s.candidate.name)
            .collect()
    };

    let proteins = pick_names(rng, groups.proteins, PROTEINS_PER_PLAN);
    let vegetables = pick_names(rng, groups.vegetables, VEGETABLES_PER_PLAN);
    let cereals = pick_names(rng, groups.cereals, CEREALS_PER_PLAN);
    let spices = pick_names(rng, groups.spices, SPICES_PER_PLAN);

    let slot_ingredients = assign_slot_ingredients(&proteins, &vegetables, &cereals, &spices);
    let styles = draw_styles(rng, profile, rotation, 3, same_theme);

    SelectedEntities {
        nutraceuticals,
        aromatherapy,
        routines,
        slot_ingredients,
        styles,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FoodGroups {
    pub proteins: Vec<ProductRow>,
    pub vegetables: Vec<ProductRow>,
    pub cereals: Vec<ProductRow>,
    pub spices: Vec<ProductRow>,
}

/// Buckets food products by catalog category for nutritional balancing.
pub fn group_foods(foods: &[ProductRow]) -> FoodGroups {
    let mut groups = FoodGroups::default();
    for food in foods {
        let category = food
            .category
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if category.contains("protein") || category.contains("legume") {
            groups.proteins.push(food.clone());
        } else if category.contains("vegetable") || category.contains("fruit") {
            groups.vegetables.push(food.clone());
        } else if category.contains("cereal")
            || category.contains("grain")
            || category.contains("starch")
        {
            groups.cereals.push(food.clone());
        } else if category.contains("spice")
            || category.contains("condiment")
            || category.contains("herb")
        {
            groups.spices.push(food.clone());
        }
    }
    groups
}

/// Distributes the sampled ingredients across the three meal slots.
///
/// The groups were sampled without replacement, so the resulting mandatory
/// sets are disjoint by construction — the sibling-exclusion lists are
/// derived from them before the cascades run.
pub fn assign_slot_ingredients(
    proteins: &[String],
    vegetables: &[String],
    cereals: &[String],
    spices: &[String],
) -> SlotIngredients {
    let take = |list: &[String], idx: usize| list.get(idx).cloned();

    SlotIngredients {
        breakfast: [take(cereals, 0), take(spices, 1)]
            .into_iter()
            .flatten()
            .collect(),
        lunch: [
            take(proteins, 0),
            take(vegetables, 0),
            take(vegetables, 1),
            take(cereals, 1),
        ]
        .into_iter()
        .flatten()
        .collect(),
        dinner: [
            take(proteins, 1),
            take(vegetables, 2),
            take(vegetables, 3),
            take(spices, 0),
        ]
        .into_iter()
        .flatten()
        .collect(),
    }
}

fn recommended_product(
    scored: &ScoredCandidate,
    products: &[ProductRow],
) -> Option<RecommendedProduct> {
    let row = products.iter().find(|p| p.id == scored.candidate.id)?;
    Some(RecommendedProduct {
        id: row.id,
        name: row.name.clone(),
        class: row.product_class.clone(),
        dosage: row.dosage.clone(),
        timing: row.timing.clone(),
        evidence_level: row.evidence_level,
    })
}

fn recommended_routine(
    scored: &ScoredCandidate,
    routines: &[RoutineRow],
) -> Option<RecommendedRoutine> {
    let row = routines.iter().find(|r| r.id == scored.candidate.id)?;
    Some(RecommendedRoutine {
        id: row.id,
        name: row.name.clone(),
        category: row.category.clone(),
        duration: row.daily_duration.clone(),
        moment: row.optimal_moment.clone(),
        protocol: row.protocol.clone(),
    })
}

fn meal_minutes(slot: MealSlot, profile: &UserProfile) -> u32 {
    match slot {
        MealSlot::Breakfast => BREAKFAST_MINUTES,
        _ => profile
            .max_prep_minutes
            .map(|m| m as u32)
            .unwrap_or(DEFAULT_MEAL_MINUTES),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coaching texts
// ────────────────────────────────────────────────────────────────────────────

/// One short LLM call with a static default — never fatal.
async fn coach_text(llm: &dyn TextGenerator, prompt: &str, default: &str) -> String {
    match llm.complete(COACH_SYSTEM, prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => default.to_string(),
        Err(e) => {
            warn!("coach text generation failed, using default: {e}");
            default.to_string()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence (best-effort)
// ────────────────────────────────────────────────────────────────────────────

/// Inserts the plan row. Returns `None` on failure — the caller still
/// serves the in-memory plan.
async fn persist_plan(pool: &PgPool, plan: &GeneratedPlan) -> Option<Uuid> {
    let id = Uuid::new_v4();
    let plan_json = match serde_json::to_value(plan) {
        Ok(v) => v,
        Err(e) => {
            warn!("plan serialization failed, skipping persistence: {e}");
            return None;
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO generated_plans
            (id, profile_id, primary_need, needs, plan_json, generated_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(plan.profile_id)
    .bind(&plan.primary_need)
    .bind(&plan.needs)
    .bind(plan_json)
    .bind(plan.generated_at)
    .bind(plan.expires_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            info!("plan {id} persisted for profile {}", plan.profile_id);
            Some(id)
        }
        Err(e) => {
            warn!("plan insert failed (plan still served): {e}");
            None
        }
    }
}

/// One usage-tracking row to insert after the plan is served.
#[derive(Debug, Clone)]
pub struct TrackedItem {
    pub item_id: Uuid,
    pub item_class: String,
    pub item_name: String,
    pub culinary_style: Option<String>,
    pub meal_slot: Option<String>,
    pub ingredient_names: Option<Vec<String>>,
}

/// Builds the "seen" rows: every selected product, routine, meal, and the
/// snack.
pub fn collect_tracked_items(plan: &GeneratedPlan) -> Vec<TrackedItem> {
    let mut items = Vec::new();

    for product in plan.nutraceuticals.iter().chain(plan.aromatherapy.iter()) {
        items.push(TrackedItem {
            item_id: product.id,
            item_class: product.class.clone(),
            item_name: product.name.clone(),
            culinary_style: None,
            meal_slot: None,
            ingredient_names: None,
        });
    }

    for routine in &plan.routines {
        items.push(TrackedItem {
            item_id: routine.id,
            item_class: "routine".to_string(),
            item_name: routine.name.clone(),
            culinary_style: None,
            meal_slot: None,
            ingredient_names: None,
        });
    }

    for meal in plan.meals() {
        items.push(TrackedItem {
            item_id: meal.source_id.unwrap_or_else(Uuid::new_v4),
            item_class: "recipe".to_string(),
            item_name: meal.name.clone(),
            culinary_style: Some(meal.culinary_style.clone()),
            meal_slot: Some(meal.meal_slot.as_str().to_string()),
            ingredient_names: Some(meal.ingredients.iter().map(|i| i.name.clone()).collect()),
        });
    }

    items
}

/// Fire-and-forget tracking writes: failures are logged, never raised.
fn spawn_tracking(
    pool: PgPool,
    profile_id: Uuid,
    plan_id: Option<Uuid>,
    items: Vec<TrackedItem>,
) {
    tokio::spawn(async move {
        let now = Utc::now();
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO plan_item_history
                    (profile_id, plan_id, item_id, item_class, item_name,
                     culinary_style, meal_slot, ingredient_names, seen_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(profile_id)
            .bind(plan_id)
            .bind(item.item_id)
            .bind(&item.item_class)
            .bind(&item.item_name)
            .bind(&item.culinary_style)
            .bind(&item.meal_slot)
            .bind(&item.ingredient_names)
            .bind(now)
            .execute(&pool)
            .await;

            if let Err(e) = result {
                warn!("tracking insert failed for item {}: {e}", item.item_name);
            }
        }
    });
}

async fn fetch_profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, first_name, age, sex, pregnant, breastfeeding,
               chronic_conditions, current_medications, dietary_regimes,
               allergens, budget_tier, max_prep_minutes,
               favored_styles, excluded_styles
        FROM profiles
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::{Ingredient, Recipe, RecipeSource};
    use crate::selection::history::HistorySnapshot;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn make_product(name: &str, class: &str, category: Option<&str>) -> ProductRow {
        ProductRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            product_class: class.to_string(),
            category: category.map(|s| s.to_string()),
            target_needs: vec!["vitality".to_string()],
            evidence_level: 4,
            estimated_efficacy: 7.0,
            contraindications: vec![],
            medication_interactions: vec![],
            risk_populations: vec![],
            allergens: vec![],
            need_score: None,
            dosage: Some("300mg".to_string()),
            timing: Some("evening".to_string()),
        }
    }

    fn make_routine(name: &str) -> RoutineRow {
        RoutineRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: "breathing".to_string(),
            target_needs: vec!["serenity".to_string()],
            evidence_level: 3,
            daily_duration: Some("5 min".to_string()),
            optimal_moment: Some("morning".to_string()),
            protocol: None,
            contraindications: vec![],
            need_score: None,
        }
    }

    fn make_profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: None,
            age: None,
            sex: None,
            pregnant: false,
            breastfeeding: false,
            chronic_conditions: vec![],
            current_medications: vec![],
            dietary_regimes: vec![],
            allergens: vec![],
            budget_tier: None,
            max_prep_minutes: None,
            favored_styles: vec![],
            excluded_styles: vec![],
        }
    }

    fn make_catalog() -> SafeCatalog {
        let mut products = vec![
            make_product("Magnesium", "nutraceutical", None),
            make_product("Ashwagandha", "nutraceutical", None),
            make_product("Rhodiola", "nutraceutical", None),
            make_product("Omega-3", "nutraceutical", None),
            make_product("Lavender oil", "aromatherapy", None),
            make_product("Peppermint oil", "aromatherapy", None),
            make_product("Bergamot oil", "aromatherapy", None),
        ];
        for name in ["chickpeas", "black lentils", "tempeh"] {
            products.push(make_product(name, "food", Some("protein - legume")));
        }
        for name in ["spinach", "broccoli", "red pepper", "blueberries", "kale", "carrot"] {
            products.push(make_product(name, "food", Some("vegetable")));
        }
        for name in ["quinoa", "buckwheat", "brown rice"] {
            products.push(make_product(name, "food", Some("cereal")));
        }
        for name in ["turmeric", "cinnamon", "ginger"] {
            products.push(make_product(name, "food", Some("spice")));
        }

        SafeCatalog {
            products,
            routines: vec![
                make_routine("Box breathing"),
                make_routine("Evening stretch"),
                make_routine("Cold shower"),
                make_routine("Gratitude journal"),
            ],
            recipes: vec![],
        }
    }

    fn empty_rotation() -> RotationScores {
        RotationScores::from_history(&HistorySnapshot::default(), Utc::now())
    }

    #[test]
    fn test_selection_respects_per_class_caps() {
        let mut rng = StdRng::seed_from_u64(9);
        let needs = NeedContext::new(vec!["vitality".to_string()], None, None);
        let selected = select_entities(
            &mut rng,
            &make_catalog(),
            &needs,
            &empty_rotation(),
            &make_profile(),
            false,
        );

        assert!(selected.nutraceuticals.len() <= MAX_NUTRACEUTICALS);
        assert_eq!(selected.nutraceuticals.len(), 3);
        assert!(selected.aromatherapy.len() <= MAX_AROMATHERAPY);
        assert!(selected.routines.len() <= MAX_ROUTINES);
        assert_eq!(selected.styles.len(), 3);
    }

    #[test]
    fn test_selected_products_carry_dosage_from_catalog_row() {
        let mut rng = StdRng::seed_from_u64(9);
        let needs = NeedContext::new(vec!["vitality".to_string()], None, None);
        let selected = select_entities(
            &mut rng,
            &make_catalog(),
            &needs,
            &empty_rotation(),
            &make_profile(),
            false,
        );
        assert!(selected
            .nutraceuticals
            .iter()
            .all(|p| p.dosage.as_deref() == Some("300mg")));
    }

    #[test]
    fn test_slot_ingredient_sets_are_disjoint() {
        let proteins = vec!["chickpeas".to_string(), "tempeh".to_string()];
        let vegetables = vec![
            "spinach".to_string(),
            "broccoli".to_string(),
            "kale".to_string(),
            "carrot".to_string(),
        ];
        let cereals = vec!["quinoa".to_string(), "rice".to_string()];
        let spices = vec!["turmeric".to_string(), "cinnamon".to_string()];

        let slots = assign_slot_ingredients(&proteins, &vegetables, &cereals, &spices);

        let breakfast: HashSet<&String> = slots.breakfast.iter().collect();
        let lunch: HashSet<&String> = slots.lunch.iter().collect();
        let dinner: HashSet<&String> = slots.dinner.iter().collect();
        assert!(breakfast.is_disjoint(&lunch));
        assert!(breakfast.is_disjoint(&dinner));
        assert!(lunch.is_disjoint(&dinner));
        assert!(!slots.breakfast.is_empty());
        assert!(!slots.lunch.is_empty());
        assert!(!slots.dinner.is_empty());
    }

    #[test]
    fn test_assign_handles_short_groups_without_panicking() {
        let slots = assign_slot_ingredients(&[], &["spinach".to_string()], &[], &[]);
        assert!(slots.breakfast.is_empty());
        assert_eq!(slots.lunch, vec!["spinach"]);
    }

    #[test]
    fn test_group_foods_buckets_by_category_substring() {
        let foods = vec![
            make_product("chickpeas", "food", Some("Protein - Legume")),
            make_product("spinach", "food", Some("leafy vegetable")),
            make_product("quinoa", "food", Some("whole grain")),
            make_product("turmeric", "food", Some("spice")),
            make_product("mystery", "food", Some("uncategorized")),
        ];
        let groups = group_foods(&foods);
        assert_eq!(groups.proteins.len(), 1);
        assert_eq!(groups.vegetables.len(), 1);
        assert_eq!(groups.cereals.len(), 1);
        assert_eq!(groups.spices.len(), 1);
    }

    #[test]
    fn test_tracked_items_cover_every_selected_entity_and_meal() {
        let meal = |slot: MealSlot| Recipe {
            source_id: None,
            name: format!("{} meal", slot.as_str()),
            meal_slot: slot,
            culinary_style: "mediterranean".to_string(),
            ingredients: vec![Ingredient {
                name: "chickpeas".to_string(),
                quantity: 100.0,
                unit: "g".to_string(),
            }],
            instructions: vec!["Cook.".to_string()],
            prep_minutes: 10,
            cook_minutes: 10,
            servings: 2,
            nutrition: None,
            tips: vec![],
            source: RecipeSource::StaticDefault,
        };

        let plan = GeneratedPlan {
            profile_id: Uuid::new_v4(),
            needs: vec!["vitality".to_string()],
            primary_need: "vitality".to_string(),
            nutraceuticals: vec![RecommendedProduct {
                id: Uuid::new_v4(),
                name: "Magnesium".to_string(),
                class: "nutraceutical".to_string(),
                dosage: None,
                timing: None,
                evidence_level: 4,
            }],
            aromatherapy: vec![],
            routines: vec![RecommendedRoutine {
                id: Uuid::new_v4(),
                name: "Box breathing".to_string(),
                category: "breathing".to_string(),
                duration: None,
                moment: None,
                protocol: None,
            }],
            breakfast: meal(MealSlot::Breakfast),
            lunch: meal(MealSlot::Lunch),
            dinner: meal(MealSlot::Dinner),
            snack: meal(MealSlot::Snack),
            motivational_message: "Go!".to_string(),
            tip_of_the_day: "Chew.".to_string(),
            generated_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(PLAN_VALIDITY_DAYS),
        };

        let items = collect_tracked_items(&plan);
        // 1 nutraceutical + 1 routine + 4 meals.
        assert_eq!(items.len(), 6);
        let recipes = items.iter().filter(|i| i.item_class == "recipe").count();
        assert_eq!(recipes, 4);
        assert!(items
            .iter()
            .filter(|i| i.item_class == "recipe")
            .all(|i| i.ingredient_names.is_some() && i.culinary_style.is_some()));
    }

    #[test]
    fn test_plan_expiry_is_seven_days() {
        assert_eq!(PLAN_VALIDITY_DAYS, 7);
    }
}
