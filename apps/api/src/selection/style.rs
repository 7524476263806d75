//! Culinary style selection — rotation-weighted draws from the profile's
//! style pool, one style per meal slot by default, or a single shared style
//! when the request asks for the same theme across all meals.

use rand::Rng;

use crate::models::profile::UserProfile;
use crate::selection::rotation::RotationScores;
use crate::selection::sampler::sample_weighted;

/// Fallback pool when the profile declares no favored styles.
pub const DEFAULT_STYLE_POOL: &[&str] = &[
    "mediterranean",
    "asian",
    "french",
    "italian",
    "mexican",
    "indian",
    "lebanese",
];

const LAST_RESORT_STYLE: &str = "mediterranean";

/// The profile's eligible styles: favored styles when declared, otherwise
/// the default pool, minus explicit exclusions.
pub fn style_pool(profile: &UserProfile) -> Vec<String> {
    let base: Vec<String> = if profile.favored_styles.is_empty() {
        DEFAULT_STYLE_POOL.iter().map(|s| s.to_string()).collect()
    } else {
        profile.favored_styles.iter().map(|s| s.to_lowercase()).collect()
    };

    let excluded: Vec<String> = profile
        .excluded_styles
        .iter()
        .map(|s| s.to_lowercase())
        .collect();

    base.into_iter().filter(|s| !excluded.contains(s)).collect()
}

/// Draws `slots` styles weighted by rotation freshness.
///
/// `same_theme` collapses the draw to a single style repeated for every
/// slot. When the pool is smaller than the slot count, drawn styles cycle.
pub fn draw_styles<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &UserProfile,
    rotation: &RotationScores,
    slots: usize,
    same_theme: bool,
) -> Vec<String> {
    let pool = style_pool(profile);
    if pool.is_empty() {
        return vec![LAST_RESORT_STYLE.to_string(); slots];
    }

    let wanted = if same_theme { 1 } else { slots.min(pool.len()) };
    let drawn = sample_weighted(rng, pool, wanted, |style| {
        rotation.style_freshness(style) * 100.0
    });

    (0..slots).map(|i| drawn[i % drawn.len()].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::history::HistorySnapshot;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn make_profile(favored: &[&str], excluded: &[&str]) -> UserProfile {
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
            favored_styles: favored.iter().map(|s| s.to_string()).collect(),
            excluded_styles: excluded.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn empty_rotation() -> RotationScores {
        RotationScores::from_history(&HistorySnapshot::default(), Utc::now())
    }

    #[test]
    fn test_default_pool_used_when_no_favorites() {
        let pool = style_pool(&make_profile(&[], &[]));
        assert_eq!(pool.len(), DEFAULT_STYLE_POOL.len());
    }

    #[test]
    fn test_excluded_styles_removed() {
        let pool = style_pool(&make_profile(&[], &["asian", "FRENCH"]));
        assert!(!pool.contains(&"asian".to_string()));
        assert!(!pool.contains(&"french".to_string()));
    }

    #[test]
    fn test_three_distinct_styles_by_default() {
        let mut rng = StdRng::seed_from_u64(11);
        let styles = draw_styles(&mut rng, &make_profile(&[], &[]), &empty_rotation(), 3, false);
        assert_eq!(styles.len(), 3);
        let distinct: HashSet<&String> = styles.iter().collect();
        assert_eq!(distinct.len(), 3, "drawn without replacement");
    }

    #[test]
    fn test_same_theme_repeats_one_style() {
        let mut rng = StdRng::seed_from_u64(11);
        let styles = draw_styles(&mut rng, &make_profile(&[], &[]), &empty_rotation(), 3, true);
        assert_eq!(styles.len(), 3);
        assert!(styles.iter().all(|s| s == &styles[0]));
    }

    #[test]
    fn test_small_pool_cycles_instead_of_panicking() {
        let mut rng = StdRng::seed_from_u64(11);
        let profile = make_profile(&["italian"], &[]);
        let styles = draw_styles(&mut rng, &profile, &empty_rotation(), 3, false);
        assert_eq!(styles, vec!["italian", "italian", "italian"]);
    }

    #[test]
    fn test_everything_excluded_falls_back() {
        let mut rng = StdRng::seed_from_u64(11);
        let profile = make_profile(&["asian"], &["asian"]);
        let styles = draw_styles(&mut rng, &profile, &empty_rotation(), 3, false);
        assert_eq!(styles.len(), 3);
        assert!(styles.iter().all(|s| s == LAST_RESORT_STYLE));
    }
}
