//! All LLM prompt construction for plan generation.
//!
//! Pure data-to-text templating: `(slot, constraints, context) -> String`.
//! No I/O here — golden-string tests pin the output shape.

use crate::models::plan::MealSlot;
use crate::models::profile::{BudgetTier, DietaryRegime};

/// System prompt for recipe generation — enforces JSON-only output.
pub const RECIPE_SYSTEM: &str = "You are a chef specialized in functional nutrition and \
    holistic wellness. You create original, flavorful, balanced recipes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// System prompt for the short coaching texts (motivation, daily tip).
pub const COACH_SYSTEM: &str = "You are a kind, encouraging wellness coach. \
    You write short, authentic messages. Never clinical, never preachy.";

/// Everything about the requester that shapes a generation prompt.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub regimes: Vec<DietaryRegime>,
    pub allergens: Vec<String>,
    pub budget: BudgetTier,
    pub needs: Vec<String>,
    pub primary_need: String,
}

/// Per-slot constraints computed before the cascade fan-out.
#[derive(Debug, Clone)]
pub struct SlotConstraints {
    pub style: String,
    pub mandatory_ingredients: Vec<String>,
    /// Ingredients assigned to sibling meal slots this request — kept out of
    /// this slot so breakfast, lunch, and dinner do not repeat each other.
    pub avoid_ingredients: Vec<String>,
    pub max_total_minutes: u32,
}

/// Nutritional objective derived from the primary declared need.
pub fn nutritional_objective(primary_need: &str) -> &'static str {
    match primary_need {
        "vitality" => "Rich in protein and complex carbohydrates to boost energy",
        "digestion" => "Easy to digest, rich in fiber and probiotics",
        "sleep" => "Rich in tryptophan and magnesium to support sleep",
        "immunity" => "Rich in vitamins C and D and zinc to strengthen immunity",
        "serenity" => "Rich in magnesium and omega-3 to calm the nervous system",
        _ => "Balanced and nutritious",
    }
}

/// Builds the recipe-generation prompt for one meal slot.
pub fn recipe_prompt(slot: MealSlot, constraints: &SlotConstraints, ctx: &PromptContext) -> String {
    let regimes = if ctx.regimes.is_empty() {
        "No restriction".to_string()
    } else {
        ctx.regimes
            .iter()
            .map(|r| r.prompt_label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let allergens = if ctx.allergens.is_empty() {
        "None".to_string()
    } else {
        ctx.allergens.join(", ")
    };

    let mandatory = constraints
        .mandatory_ingredients
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    let avoid = if constraints.avoid_ingredients.is_empty() {
        "None".to_string()
    } else {
        constraints.avoid_ingredients.join(", ")
    };

    let slot_rules = match slot {
        MealSlot::Breakfast => {
            "\n## BREAKFAST RULES\n\
             - Sweet flavor profile ONLY, no vegetables\n\
             - At most 5 ingredients and 5 steps\n\
             - 15 minutes total at most, no long cooking\n"
        }
        _ => "",
    };

    format!(
        "Create an ORIGINAL recipe.\n\
         \n\
         ## STRICT CONSTRAINTS (NON-NEGOTIABLE)\n\
         \n\
         Meal slot: {slot}\n\
         Culinary style: {style}\n\
         Dietary regime: {regimes}\n\
         Allergens to avoid ABSOLUTELY: {allergens}\n\
         \n\
         MANDATORY ingredients to include:\n\
         {mandatory}\n\
         \n\
         Ingredients already used in other meals today, do NOT use them: {avoid}\n\
         \n\
         Time budget: {minutes} minutes total (preparation + cooking)\n\
         Budget: {budget}\n\
         Nutritional objective: {objective}\n\
         Servings: 2\n\
         {slot_rules}\n\
         ## OUTPUT FORMAT (STRICT JSON, nothing else)\n\
         \n\
         {{\n\
         \x20 \"name\": \"Creative, appealing recipe name\",\n\
         \x20 \"ingredients\": [{{\"name\": \"ingredient\", \"quantity\": 150, \"unit\": \"g\"}}],\n\
         \x20 \"instructions\": [\"Short actionable step.\", \"Short actionable step.\"],\n\
         \x20 \"prep_minutes\": 10,\n\
         \x20 \"cook_minutes\": 15,\n\
         \x20 \"servings\": 2,\n\
         \x20 \"nutrition\": {{\"calories\": 450, \"protein_g\": 18, \"carbs_g\": 55, \"fat_g\": 12}},\n\
         \x20 \"tips\": [\"One interesting nutritional fact about a key ingredient.\"]\n\
         }}",
        slot = slot.as_str(),
        style = constraints.style,
        regimes = regimes,
        allergens = allergens,
        mandatory = mandatory,
        avoid = avoid,
        minutes = constraints.max_total_minutes,
        budget = ctx.budget.price_band(),
        objective = nutritional_objective(&ctx.primary_need),
        slot_rules = slot_rules,
    )
}

/// Builds the mid-afternoon snack prompt.
///
/// The supplement prohibition is a deliberate content-safety policy,
/// enforced here at the prompt level: the snack must be real food.
pub fn snack_prompt(ctx: &PromptContext) -> String {
    let regimes = if ctx.regimes.is_empty() {
        "No restriction".to_string()
    } else {
        ctx.regimes
            .iter()
            .map(|r| r.prompt_label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let allergens = if ctx.allergens.is_empty() {
        "None".to_string()
    } else {
        ctx.allergens.join(", ")
    };

    format!(
        "Create a simple mid-afternoon snack (around 4pm).\n\
         \n\
         ## STRICT CONSTRAINTS\n\
         \n\
         REAL FOOD ONLY. Absolutely NO supplement-like ingredients: no powders, \
         no capsules, no superfoods sold as supplements.\n\
         Dietary regime: {regimes}\n\
         Allergens to avoid ABSOLUTELY: {allergens}\n\
         Primary wellness goal: {primary}\n\
         At most 4 ingredients, at most 3 steps, no cooking or very quick cooking.\n\
         \n\
         ## OUTPUT FORMAT (STRICT JSON, nothing else)\n\
         \n\
         {{\n\
         \x20 \"name\": \"Snack name\",\n\
         \x20 \"ingredients\": [{{\"name\": \"ingredient\", \"quantity\": 30, \"unit\": \"g\"}}],\n\
         \x20 \"instructions\": [\"Short step.\"],\n\
         \x20 \"prep_minutes\": 5,\n\
         \x20 \"cook_minutes\": 0,\n\
         \x20 \"servings\": 1,\n\
         \x20 \"tips\": [\"One short tip.\"]\n\
         }}",
        regimes = regimes,
        allergens = allergens,
        primary = ctx.primary_need,
    )
}

/// Prompt for the short motivational message opening the plan.
pub fn motivation_prompt(first_name: Option<&str>, ctx: &PromptContext) -> String {
    let name = first_name.unwrap_or("the user");
    format!(
        "Write ONE short motivational message (max 150 characters, 1-2 sentences) \
         for {name}, whose wellness goals today are: {needs}. \
         Encouraging but not excessive, authentic and human. \
         Avoid cliches like \"you are on the right track\". \
         Reply with the message text only.",
        name = name,
        needs = ctx.needs.join(", "),
    )
}

/// Prompt for the tip of the day.
pub fn tip_prompt(ctx: &PromptContext) -> String {
    format!(
        "Write ONE actionable wellness tip of the day (2 sentences max) for someone \
         focused on {primary}. Concrete and practical, no generic advice. \
         Reply with the tip text only.",
        primary = ctx.primary_need,
    )
}
