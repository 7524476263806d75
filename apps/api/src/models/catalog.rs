#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Entity classes that flow through the scorer and sampler.
/// Every candidate is an explicit tagged variant — never a duck-typed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateClass {
    Nutraceutical,
    Aromatherapy,
    Food,
    Routine,
    Recipe,
    CulinaryStyle,
}

impl CandidateClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nutraceutical => "nutraceutical",
            Self::Aromatherapy => "aromatherapy",
            Self::Food => "food",
            Self::Routine => "routine",
            Self::Recipe => "recipe",
            Self::CulinaryStyle => "culinary_style",
        }
    }
}

/// A catalog product row: nutraceutical, aromatherapy item, or food
/// ingredient. The `need_score` column is populated only when the row was
/// fetched through the need-association junction (1-5 scale).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub product_class: String,
    pub category: Option<String>,
    pub target_needs: Vec<String>,
    pub evidence_level: i16,
    pub estimated_efficacy: f64,
    pub contraindications: Vec<String>,
    pub medication_interactions: Vec<String>,
    pub risk_populations: Vec<String>,
    pub allergens: Vec<String>,
    pub need_score: Option<i16>,
    pub dosage: Option<String>,
    pub timing: Option<String>,
}

impl ProductRow {
    pub fn class(&self) -> CandidateClass {
        match self.product_class.as_str() {
            "aromatherapy" => CandidateClass::Aromatherapy,
            "food" => CandidateClass::Food,
            _ => CandidateClass::Nutraceutical,
        }
    }
}

/// A wellness routine row (breathing practice, stretching protocol, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutineRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub target_needs: Vec<String>,
    pub evidence_level: i16,
    pub daily_duration: Option<String>,
    pub optimal_moment: Option<String>,
    pub protocol: Option<String>,
    pub contraindications: Vec<String>,
    pub need_score: Option<i16>,
}

/// A recipe row from the backing recipe table, used by the cascade's
/// database fallback tier. Regime compatibility is stored as flags so the
/// safety filter stays a plain predicate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    pub meal_slot: String,
    pub culinary_style: Option<String>,
    pub ingredient_names: Vec<String>,
    pub instructions: Option<String>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    pub servings: Option<i16>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub lactose_free: bool,
    pub paleo: bool,
    pub keto: bool,
    pub allergens: Vec<String>,
}

/// The unified shape the scorer and sampler operate on.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub class: CandidateClass,
    pub target_needs: Vec<String>,
    pub need_score: Option<i16>,
    pub evidence_level: Option<i16>,
    pub estimated_efficacy: Option<f64>,
}

impl Candidate {
    pub fn from_product(row: &ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            class: row.class(),
            target_needs: row.target_needs.clone(),
            need_score: row.need_score,
            evidence_level: Some(row.evidence_level),
            estimated_efficacy: Some(row.estimated_efficacy),
        }
    }

    pub fn from_routine(row: &RoutineRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            class: CandidateClass::Routine,
            target_needs: row.target_needs.clone(),
            need_score: row.need_score,
            evidence_level: Some(row.evidence_level),
            estimated_efficacy: None,
        }
    }
}

/// A candidate annotated with its score components. The list is sorted
/// descending by `total` as a default ordering only — actual selection goes
/// through the weighted sampler.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// Points earned from need/symptom match, out of the class's relevance weight.
    pub relevance: f64,
    /// Points earned from rotation freshness, out of the class's rotation weight.
    pub rotation: f64,
    /// Weighted composite on a 100-point scale. Always non-negative.
    pub total: f64,
}
