use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The four moments of the day a plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

/// Which cascade tier produced a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSource {
    Cache,
    Llm,
    Database,
    StaticDefault,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// A finished recipe for one meal slot.
/// Invariant: at least one ingredient and one instruction step — the
/// cascade's static tier guarantees this for every slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Backing-table id when the recipe came from the cache or database
    /// tiers; `None` for LLM and static output. Recorded in usage history
    /// so the fallback tier can rotate away from recently-served rows.
    #[serde(default)]
    pub source_id: Option<Uuid>,
    pub name: String,
    pub meal_slot: MealSlot,
    pub culinary_style: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_minutes: u32,
    pub cook_minutes: u32,
    pub servings: u16,
    pub nutrition: Option<NutritionEstimate>,
    pub tips: Vec<String>,
    pub source: RecipeSource,
}

impl Recipe {
    /// Structural validity: what the cascade promises its caller.
    pub fn is_structurally_valid(&self) -> bool {
        !self.name.is_empty() && !self.ingredients.is_empty() && !self.instructions.is_empty()
    }
}

/// A recommended supplement or aromatherapy item in the assembled plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub id: Uuid,
    pub name: String,
    pub class: String,
    pub dosage: Option<String>,
    pub timing: Option<String>,
    pub evidence_level: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedRoutine {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub duration: Option<String>,
    pub moment: Option<String>,
    pub protocol: Option<String>,
}

/// The per-request aggregate. Created once, persisted as an immutable
/// record; regeneration creates a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub profile_id: Uuid,
    pub needs: Vec<String>,
    pub primary_need: String,
    pub nutraceuticals: Vec<RecommendedProduct>,
    pub aromatherapy: Vec<RecommendedProduct>,
    pub routines: Vec<RecommendedRoutine>,
    pub breakfast: Recipe,
    pub lunch: Recipe,
    pub dinner: Recipe,
    pub snack: Recipe,
    pub motivational_message: String,
    pub tip_of_the_day: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GeneratedPlan {
    pub fn meals(&self) -> [&Recipe; 4] {
        [&self.breakfast, &self.lunch, &self.dinner, &self.snack]
    }
}

/// A persisted plan record as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub primary_need: String,
    pub needs: Vec<String>,
    pub plan_json: serde_json::Value,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
