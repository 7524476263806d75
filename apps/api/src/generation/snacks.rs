//! Static snack pool — the terminal tier of the snack cascade.
//!
//! Pre-authored real-food snacks grouped by primary need; one is drawn
//! uniformly at random per call. This tier cannot fail.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::plan::{Ingredient, MealSlot, Recipe, RecipeSource};

pub struct StaticSnack {
    pub name: &'static str,
    pub ingredients: &'static [(&'static str, f64, &'static str)],
    pub steps: &'static [&'static str],
    pub tip: &'static str,
}

static VITALITY_SNACKS: &[StaticSnack] = &[
    StaticSnack {
        name: "Banana Almond Boost",
        ingredients: &[("banana", 1.0, "piece"), ("almonds", 20.0, "g"), ("dark chocolate 70%", 10.0, "g")],
        steps: &["Slice the banana.", "Top with almonds and chocolate shavings."],
        tip: "Almonds deliver magnesium and slow-release energy.",
    },
    StaticSnack {
        name: "Date & Walnut Bites",
        ingredients: &[("dates", 3.0, "piece"), ("walnuts", 15.0, "g")],
        steps: &["Split the dates.", "Stuff each with a walnut half."],
        tip: "Dates give quick glucose, walnuts smooth the curve with good fats.",
    },
];

static SERENITY_SNACKS: &[StaticSnack] = &[
    StaticSnack {
        name: "Calm Afternoon Plate",
        ingredients: &[("dark chocolate 70%", 20.0, "g"), ("herbal infusion", 250.0, "ml")],
        steps: &["Brew the infusion.", "Savor the chocolate slowly alongside."],
        tip: "Cocoa flavanols support a steady mood through the afternoon dip.",
    },
    StaticSnack {
        name: "Apple Tahini Slices",
        ingredients: &[("apple", 1.0, "piece"), ("tahini", 15.0, "g"), ("cinnamon", 1.0, "pinch")],
        steps: &["Slice the apple.", "Drizzle with tahini and dust with cinnamon."],
        tip: "Sesame is one of the richest food sources of calming calcium.",
    },
];

static SLEEP_SNACKS: &[StaticSnack] = &[
    StaticSnack {
        name: "Evening Kiwi Duo",
        ingredients: &[("kiwi", 2.0, "piece"), ("pumpkin seeds", 10.0, "g")],
        steps: &["Peel and slice the kiwis.", "Sprinkle with pumpkin seeds."],
        tip: "Kiwi eaten in the afternoon has been linked to better sleep onset.",
    },
    StaticSnack {
        name: "Warm Oat Cup",
        ingredients: &[("oat flakes", 30.0, "g"), ("plant milk", 150.0, "ml"), ("honey", 5.0, "g")],
        steps: &["Warm the milk.", "Stir in the oats.", "Finish with honey."],
        tip: "Oats carry tryptophan, the precursor your body turns into melatonin.",
    },
];

static DIGESTION_SNACKS: &[StaticSnack] = &[
    StaticSnack {
        name: "Fennel & Pear Plate",
        ingredients: &[("pear", 1.0, "piece"), ("fennel", 50.0, "g")],
        steps: &["Slice the pear and fennel thin.", "Arrange and eat slowly."],
        tip: "Fennel's fibers and essential oils ease post-lunch digestion.",
    },
    StaticSnack {
        name: "Plain Yogurt & Berries",
        ingredients: &[("plain yogurt", 125.0, "g"), ("blueberries", 60.0, "g")],
        steps: &["Spoon the yogurt into a bowl.", "Top with the berries."],
        tip: "Fermented dairy brings live cultures that feed the gut flora.",
    },
];

static DEFAULT_SNACKS: &[StaticSnack] = &[
    StaticSnack {
        name: "Classic Fruit & Nuts",
        ingredients: &[("seasonal fruit", 1.0, "piece"), ("mixed nuts", 20.0, "g")],
        steps: &["Wash the fruit.", "Serve with a small handful of nuts."],
        tip: "Pairing fruit with nuts slows the sugar release and keeps you full.",
    },
    StaticSnack {
        name: "Crunchy Veggie Sticks",
        ingredients: &[("carrot", 1.0, "piece"), ("cucumber", 0.5, "piece"), ("hummus", 40.0, "g")],
        steps: &["Cut the vegetables into sticks.", "Dip into the hummus."],
        tip: "Chickpeas add plant protein that carries you to dinner.",
    },
];

/// The pre-authored snack group for a primary need.
pub fn snack_pool(primary_need: &str) -> &'static [StaticSnack] {
    match primary_need {
        "vitality" => VITALITY_SNACKS,
        "serenity" => SERENITY_SNACKS,
        "sleep" => SLEEP_SNACKS,
        "digestion" => DIGESTION_SNACKS,
        _ => DEFAULT_SNACKS,
    }
}

/// Draws one snack from the need's pool, uniformly at random.
pub fn draw_snack<R: Rng + ?Sized>(rng: &mut R, primary_need: &str) -> Recipe {
    let pool = snack_pool(primary_need);
    let snack = pool.choose(rng).unwrap_or(&pool[0]);

    Recipe {
        source_id: None,
        name: snack.name.to_string(),
        meal_slot: MealSlot::Snack,
        culinary_style: "simple".to_string(),
        ingredients: snack
            .ingredients
            .iter()
            .map(|(name, quantity, unit)| Ingredient {
                name: name.to_string(),
                quantity: *quantity,
                unit: unit.to_string(),
            })
            .collect(),
        instructions: snack.steps.iter().map(|s| s.to_string()).collect(),
        prep_minutes: 5,
        cook_minutes: 0,
        servings: 1,
        nutrition: None,
        tips: vec![snack.tip.to_string()],
        source: RecipeSource::StaticDefault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_pool_snack_is_structurally_valid() {
        let mut rng = StdRng::seed_from_u64(5);
        for need in ["vitality", "serenity", "sleep", "digestion", "hormones"] {
            let snack = draw_snack(&mut rng, need);
            assert!(snack.is_structurally_valid(), "invalid snack for {need}");
            assert_eq!(snack.meal_slot, MealSlot::Snack);
            assert_eq!(snack.source, RecipeSource::StaticDefault);
        }
    }

    #[test]
    fn test_unknown_need_uses_default_pool() {
        let pool = snack_pool("hormones");
        assert_eq!(pool.as_ptr(), DEFAULT_SNACKS.as_ptr());
    }

    #[test]
    fn test_no_pool_snack_contains_supplement_ingredients() {
        for need in ["vitality", "serenity", "sleep", "digestion", "other"] {
            for snack in snack_pool(need) {
                for (name, _, _) in snack.ingredients {
                    let lower = name.to_lowercase();
                    assert!(
                        !lower.contains("powder") && !lower.contains("capsule"),
                        "{name} looks like a supplement"
                    );
                }
            }
        }
    }
}
