//! Defensive parsing of LLM recipe output.
//!
//! Models wrap JSON in code fences, prepend prose, or truncate the tail.
//! The extraction ladder: strip fences → slice to the outermost braces →
//! direct parse → brace-balancing repair → give up (the cascade falls
//! through to its next tier).

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::plan::{Ingredient, MealSlot, NutritionEstimate, Recipe, RecipeSource};

const DEFAULT_PREP_MINUTES: u32 = 15;
const DEFAULT_COOK_MINUTES: u32 = 20;
const DEFAULT_SERVINGS: u16 = 2;

#[derive(Debug, Deserialize)]
struct LlmRecipe {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ingredients: Vec<LlmIngredient>,
    #[serde(default)]
    instructions: Vec<String>,
    prep_minutes: Option<u32>,
    cook_minutes: Option<u32>,
    servings: Option<u16>,
    nutrition: Option<NutritionEstimate>,
    #[serde(default)]
    tips: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LlmIngredient {
    name: String,
    quantity: Option<f64>,
    unit: Option<String>,
}

/// Parses raw LLM output into a recipe for the given slot.
///
/// Requires at minimum a name, one ingredient, and one instruction step;
/// everything else is backfilled with defaults. Returns `None` when even
/// the repair ladder cannot produce that minimum.
pub fn parse_recipe(raw: &str, slot: MealSlot, style: &str) -> Option<Recipe> {
    let value = extract_json(raw)?;
    let parsed: LlmRecipe = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            warn!("LLM recipe JSON had unexpected shape: {e}");
            return None;
        }
    };

    if parsed.name.trim().is_empty()
        || parsed.ingredients.is_empty()
        || parsed.instructions.iter().all(|s| s.trim().is_empty())
    {
        warn!("LLM recipe missing name, ingredients, or instructions");
        return None;
    }

    Some(Recipe {
        source_id: None,
        name: parsed.name,
        meal_slot: slot,
        culinary_style: style.to_string(),
        ingredients: parsed
            .ingredients
            .into_iter()
            .map(|i| Ingredient {
                name: i.name,
                quantity: i.quantity.unwrap_or(1.0),
                unit: i.unit.unwrap_or_else(|| "portion".to_string()),
            })
            .collect(),
        instructions: parsed
            .instructions
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect(),
        prep_minutes: parsed.prep_minutes.unwrap_or(DEFAULT_PREP_MINUTES),
        cook_minutes: parsed.cook_minutes.unwrap_or(DEFAULT_COOK_MINUTES),
        servings: parsed.servings.unwrap_or(DEFAULT_SERVINGS),
        nutrition: parsed.nutrition,
        tips: parsed.tips,
        source: RecipeSource::Llm,
    })
}

/// Extracts the first JSON object from raw LLM text.
pub fn extract_json(raw: &str) -> Option<Value> {
    let text = strip_code_fences(raw.trim());

    // Slice to the outermost braces, dropping prose before and after.
    let start = text.find('{')?;
    let end = text.rfind('}').map(|i| i + 1).unwrap_or(text.len());
    let sliced = &text[start..end.max(start)];

    if let Ok(value) = serde_json::from_str(sliced) {
        return Some(value);
    }

    // Repair: append the closing braces a truncated response is missing.
    let opens = sliced.matches('{').count();
    let closes = sliced.matches('}').count();
    if opens > closes {
        let repaired = format!("{}{}", sliced, "}".repeat(opens - closes));
        if let Ok(value) = serde_json::from_str(&repaired) {
            warn!("LLM JSON repaired by appending {} closing brace(s)", opens - closes);
            return Some(value);
        }
    }

    warn!("unable to parse LLM output as JSON");
    None
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "name": "Golden Chickpea Bowl",
        "ingredients": [{"name": "chickpeas", "quantity": 150, "unit": "g"}],
        "instructions": ["Rinse the chickpeas.", "Assemble the bowl."],
        "prep_minutes": 10,
        "cook_minutes": 15,
        "servings": 2,
        "nutrition": {"calories": 420, "protein_g": 16, "carbs_g": 50, "fat_g": 14},
        "tips": ["Chickpeas are rich in plant protein."]
    }"#;

    #[test]
    fn test_parses_clean_json() {
        let recipe = parse_recipe(VALID, MealSlot::Lunch, "mediterranean").unwrap();
        assert_eq!(recipe.name, "Golden Chickpea Bowl");
        assert_eq!(recipe.source, RecipeSource::Llm);
        assert_eq!(recipe.meal_slot, MealSlot::Lunch);
        assert_eq!(recipe.culinary_style, "mediterranean");
        assert!(recipe.is_structurally_valid());
    }

    #[test]
    fn test_strips_code_fences() {
        let fenced = format!("```json\n{VALID}\n```");
        assert!(parse_recipe(&fenced, MealSlot::Lunch, "asian").is_some());

        let bare_fence = format!("```\n{VALID}\n```");
        assert!(parse_recipe(&bare_fence, MealSlot::Lunch, "asian").is_some());
    }

    #[test]
    fn test_ignores_prose_around_json() {
        let chatty = format!("Here is your recipe!\n{VALID}\nEnjoy your meal!");
        assert!(parse_recipe(&chatty, MealSlot::Dinner, "indian").is_some());
    }

    #[test]
    fn test_repairs_missing_closing_braces() {
        let truncated = r#"{
            "name": "Abrupt Ending Oats",
            "ingredients": [{"name": "oats", "quantity": 40, "unit": "g"}],
            "instructions": ["Soak the oats."],
            "nutrition": {"calories": 300, "protein_g": 10, "carbs_g": 45, "fat_g": 6"#;
        // Two closing braces missing; repair appends them.
        let repaired = format!("{truncated}}}");
        let recipe = parse_recipe(&repaired, MealSlot::Breakfast, "simple");
        assert!(recipe.is_some(), "brace repair should recover the recipe");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let no_name = r#"{
            "ingredients": [{"name": "oats", "quantity": 40, "unit": "g"}],
            "instructions": ["Soak the oats."]
        }"#;
        assert!(parse_recipe(no_name, MealSlot::Breakfast, "simple").is_none());
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        let empty = r#"{"name": "Air Soup", "ingredients": [], "instructions": ["Stir."]}"#;
        assert!(parse_recipe(empty, MealSlot::Lunch, "simple").is_none());
    }

    #[test]
    fn test_defaults_backfilled() {
        let minimal = r#"{
            "name": "Minimal Bowl",
            "ingredients": [{"name": "rice"}],
            "instructions": ["Cook the rice."]
        }"#;
        let recipe = parse_recipe(minimal, MealSlot::Dinner, "asian").unwrap();
        assert_eq!(recipe.prep_minutes, DEFAULT_PREP_MINUTES);
        assert_eq!(recipe.cook_minutes, DEFAULT_COOK_MINUTES);
        assert_eq!(recipe.servings, DEFAULT_SERVINGS);
        assert_eq!(recipe.ingredients[0].quantity, 1.0);
        assert_eq!(recipe.ingredients[0].unit, "portion");
        assert!(recipe.nutrition.is_none());
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(extract_json("the model refused to answer").is_none());
        assert!(parse_recipe("{{{{", MealSlot::Lunch, "simple").is_none());
    }
}
