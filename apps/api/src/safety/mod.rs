//! Stage 1 — safety filtering of the catalog against the profile.
//!
//! Plain attribute-matching predicates: risk populations, contraindications,
//! medication interactions, allergens, regime compatibility. A candidate
//! excluded here never reaches the scorer.

use sqlx::PgPool;
use tracing::info;

use crate::models::catalog::{ProductRow, RecipeRow, RoutineRow};
use crate::models::profile::{DietaryRegime, UserProfile};

pub const PREGNANCY_TAG: &str = "pregnancy";
pub const BREASTFEEDING_TAG: &str = "breastfeeding";

/// The three catalog slices that survived safety filtering.
#[derive(Debug, Clone, Default)]
pub struct SafeCatalog {
    pub products: Vec<ProductRow>,
    pub routines: Vec<RoutineRow>,
    pub recipes: Vec<RecipeRow>,
}

/// True when nothing in the product contraindicates this profile.
pub fn product_is_safe(product: &ProductRow, profile: &UserProfile) -> bool {
    if profile.pregnant && contains_tag(&product.risk_populations, PREGNANCY_TAG) {
        return false;
    }
    if profile.breastfeeding && contains_tag(&product.risk_populations, BREASTFEEDING_TAG) {
        return false;
    }
    if any_cross_match(&profile.chronic_conditions, &product.contraindications) {
        return false;
    }
    if any_cross_match(&profile.current_medications, &product.medication_interactions) {
        return false;
    }
    if any_tag_overlap(&profile.allergens, &product.allergens) {
        return false;
    }
    true
}

/// True when the recipe is compatible with the profile's regimes and
/// carries none of its allergens.
pub fn recipe_is_safe(recipe: &RecipeRow, profile: &UserProfile) -> bool {
    let regimes = profile.regimes();
    let requires = |regime, flag: bool| !regimes.contains(&regime) || flag;

    let gluten_free_needed = regimes.contains(&DietaryRegime::GlutenFree)
        || contains_tag(&profile.allergens, "gluten");
    let lactose_free_needed = regimes.contains(&DietaryRegime::LactoseFree)
        || contains_tag(&profile.allergens, "lactose");

    requires(DietaryRegime::Vegan, recipe.vegan)
        && requires(DietaryRegime::Vegetarian, recipe.vegetarian)
        && requires(DietaryRegime::Paleo, recipe.paleo)
        && requires(DietaryRegime::Keto, recipe.keto)
        && (!gluten_free_needed || recipe.gluten_free)
        && (!lactose_free_needed || recipe.lactose_free)
        && !any_tag_overlap(&profile.allergens, &recipe.allergens)
}

/// True when none of the routine's contraindications apply to this profile.
pub fn routine_is_safe(routine: &RoutineRow, profile: &UserProfile) -> bool {
    if profile.pregnant && contains_tag(&routine.contraindications, PREGNANCY_TAG) {
        return false;
    }
    !any_cross_match(&profile.chronic_conditions, &routine.contraindications)
}

/// Case-insensitive substring match in either direction, the shape
/// contraindication lists are written in ("anticoagulants" vs "warfarin
/// anticoagulant therapy").
fn any_cross_match(profile_values: &[String], catalog_values: &[String]) -> bool {
    profile_values.iter().any(|pv| {
        let pv = pv.to_lowercase();
        catalog_values.iter().any(|cv| {
            let cv = cv.to_lowercase();
            cv.contains(&pv) || pv.contains(&cv)
        })
    })
}

fn any_tag_overlap(a: &[String], b: &[String]) -> bool {
    a.iter()
        .any(|x| b.iter().any(|y| x.eq_ignore_ascii_case(y)))
}

fn contains_tag(values: &[String], tag: &str) -> bool {
    values.iter().any(|v| v.to_lowercase().contains(tag))
}

/// Fetches the three catalog slices concurrently, then applies the safety
/// predicates. The junction `need_score` is carried along when a row was
/// matched through the need-association table.
pub async fn fetch_safe_catalog(
    pool: &PgPool,
    profile: &UserProfile,
    needs: &[String],
) -> Result<SafeCatalog, sqlx::Error> {
    let (products, routines, recipes) = tokio::try_join!(
        fetch_products(pool, needs),
        fetch_routines(pool, needs),
        fetch_recipes(pool),
    )?;

    let total = (products.len(), routines.len(), recipes.len());

    let catalog = SafeCatalog {
        products: products
            .into_iter()
            .filter(|p| product_is_safe(p, profile))
            .collect(),
        routines: routines
            .into_iter()
            .filter(|r| routine_is_safe(r, profile))
            .collect(),
        recipes: recipes
            .into_iter()
            .filter(|r| recipe_is_safe(r, profile))
            .collect(),
    };

    info!(
        "safety filter kept {}/{} products, {}/{} routines, {}/{} recipes",
        catalog.products.len(),
        total.0,
        catalog.routines.len(),
        total.1,
        catalog.recipes.len(),
        total.2
    );

    Ok(catalog)
}

async fn fetch_products(pool: &PgPool, needs: &[String]) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT DISTINCT ON (p.id)
            p.id, p.name, p.product_class, p.category, p.target_needs,
            p.evidence_level, p.estimated_efficacy, p.contraindications,
            p.medication_interactions, p.risk_populations, p.allergens,
            pn.need_score, p.dosage, p.timing
        FROM products p
        LEFT JOIN product_needs pn
            ON pn.product_id = p.id AND pn.need = ANY($1)
        WHERE p.active = TRUE
        ORDER BY p.id, pn.need_score DESC NULLS LAST
        "#,
    )
    .bind(needs)
    .fetch_all(pool)
    .await
}

async fn fetch_routines(pool: &PgPool, needs: &[String]) -> Result<Vec<RoutineRow>, sqlx::Error> {
    sqlx::query_as::<_, RoutineRow>(
        r#"
        SELECT DISTINCT ON (r.id)
            r.id, r.name, r.category, r.target_needs, r.evidence_level,
            r.daily_duration, r.optimal_moment, r.protocol,
            r.contraindications, rn.need_score
        FROM routines r
        LEFT JOIN routine_needs rn
            ON rn.routine_id = r.id AND rn.need = ANY($1)
        WHERE r.active = TRUE
        ORDER BY r.id, rn.need_score DESC NULLS LAST
        "#,
    )
    .bind(needs)
    .fetch_all(pool)
    .await
}

async fn fetch_recipes(pool: &PgPool) -> Result<Vec<RecipeRow>, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, name, meal_slot, culinary_style, ingredient_names,
               instructions, prep_minutes, cook_minutes, servings,
               calories, protein_g, carbs_g, fat_g,
               vegan, vegetarian, gluten_free, lactose_free, paleo, keto,
               allergens
        FROM recipes
        WHERE active = TRUE
        "#,
    )
    .fetch_all(pool)
    .await
}
