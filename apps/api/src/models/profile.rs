use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dietary regime tags a profile can declare. Stored as plain text in the
/// profile row; parsed through [`DietaryRegime::parse`] so unknown tags are
/// ignored rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryRegime {
    Vegan,
    Vegetarian,
    GlutenFree,
    LactoseFree,
    Paleo,
    Keto,
    Halal,
    Kosher,
}

impl DietaryRegime {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "vegan" => Some(Self::Vegan),
            "vegetarian" => Some(Self::Vegetarian),
            "gluten_free" | "gluten-free" => Some(Self::GlutenFree),
            "lactose_free" | "lactose-free" => Some(Self::LactoseFree),
            "paleo" => Some(Self::Paleo),
            "keto" => Some(Self::Keto),
            "halal" => Some(Self::Halal),
            "kosher" => Some(Self::Kosher),
            _ => None,
        }
    }

    /// Constraint phrasing used in LLM prompts.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Vegan => "100% VEGAN (no animal products at all)",
            Self::Vegetarian => "VEGETARIAN (no meat or fish)",
            Self::GlutenFree => "GLUTEN-FREE",
            Self::LactoseFree => "LACTOSE-FREE",
            Self::Paleo => "PALEO",
            Self::Keto => "KETO (low carbohydrate)",
            Self::Halal => "HALAL",
            Self::Kosher => "KOSHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Per-portion price band communicated to the LLM.
    pub fn price_band(&self) -> &'static str {
        match self {
            Self::Low => "5-8 EUR per portion",
            Self::Medium => "8-12 EUR per portion",
            Self::High => "12-20 EUR per portion",
        }
    }
}

/// A user health profile. Owned by the external profile store; immutable for
/// the duration of one plan-generation request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub age: Option<i16>,
    pub sex: Option<String>,
    pub pregnant: bool,
    pub breastfeeding: bool,
    pub chronic_conditions: Vec<String>,
    pub current_medications: Vec<String>,
    pub dietary_regimes: Vec<String>,
    pub allergens: Vec<String>,
    pub budget_tier: Option<String>,
    pub max_prep_minutes: Option<i32>,
    pub favored_styles: Vec<String>,
    pub excluded_styles: Vec<String>,
}

impl UserProfile {
    /// Parsed regime tags, unknown tags dropped.
    pub fn regimes(&self) -> Vec<DietaryRegime> {
        self.dietary_regimes
            .iter()
            .filter_map(|t| DietaryRegime::parse(t))
            .collect()
    }

    pub fn budget(&self) -> BudgetTier {
        self.budget_tier
            .as_deref()
            .and_then(BudgetTier::parse)
            .unwrap_or(BudgetTier::Medium)
    }
}

/// Default needs assumed when a request declares none: the profile wants a
/// general-wellness plan, not an empty one.
const GENERAL_WELLNESS_NEEDS: &[&str] = &["vitality", "serenity"];

/// The declared needs/symptoms driving candidate relevance for one request.
/// Constructed per request, normalized to lowercase; not persisted by the
/// core except as an attribute of the resulting plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedContext {
    pub needs: Vec<String>,
    pub primary: String,
    pub duration: Option<String>,
}

impl NeedContext {
    pub fn new(
        declared: Vec<String>,
        primary: Option<String>,
        duration: Option<String>,
    ) -> Self {
        let mut needs: Vec<String> = declared
            .into_iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        needs.dedup();

        if needs.is_empty() {
            needs = GENERAL_WELLNESS_NEEDS.iter().map(|s| s.to_string()).collect();
        }

        let primary = primary
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| needs[0].clone());

        Self {
            needs,
            primary,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: Some("Ana".to_string()),
            age: Some(34),
            sex: Some("F".to_string()),
            pregnant: false,
            breastfeeding: false,
            chronic_conditions: vec![],
            current_medications: vec![],
            dietary_regimes: vec!["vegan".to_string(), "gluten-free".to_string()],
            allergens: vec![],
            budget_tier: Some("low".to_string()),
            max_prep_minutes: Some(30),
            favored_styles: vec![],
            excluded_styles: vec![],
        }
    }

    #[test]
    fn test_regimes_parse_known_tags_and_drop_unknown() {
        let mut profile = make_profile();
        profile.dietary_regimes.push("fruitarian".to_string());
        let regimes = profile.regimes();
        assert_eq!(
            regimes,
            vec![DietaryRegime::Vegan, DietaryRegime::GlutenFree],
            "unknown tag must be dropped, not rejected"
        );
    }

    #[test]
    fn test_gluten_free_accepts_both_spellings() {
        assert_eq!(DietaryRegime::parse("gluten_free"), Some(DietaryRegime::GlutenFree));
        assert_eq!(DietaryRegime::parse("gluten-free"), Some(DietaryRegime::GlutenFree));
    }

    #[test]
    fn test_budget_defaults_to_medium() {
        let mut profile = make_profile();
        profile.budget_tier = None;
        assert_eq!(profile.budget(), BudgetTier::Medium);
        profile.budget_tier = Some("lavish".to_string());
        assert_eq!(profile.budget(), BudgetTier::Medium);
    }

    #[test]
    fn test_need_context_normalizes_and_defaults_primary() {
        let ctx = NeedContext::new(
            vec!["  Sleep ".to_string(), "Digestion".to_string()],
            None,
            None,
        );
        assert_eq!(ctx.needs, vec!["sleep", "digestion"]);
        assert_eq!(ctx.primary, "sleep");
    }

    #[test]
    fn test_empty_needs_fall_back_to_general_wellness() {
        let ctx = NeedContext::new(vec![], None, None);
        assert!(!ctx.needs.is_empty(), "day-one users get a plan, not nothing");
        assert_eq!(ctx.primary, ctx.needs[0]);
    }
}
