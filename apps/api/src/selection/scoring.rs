//! Composite scoring — merges need relevance, evidence strength, estimated
//! efficacy, and rotation freshness into one weighted total per candidate.
//!
//! Scoring is a pure function of (candidates, need context, rotation
//! snapshot): the same inputs always produce identical components. The only
//! permitted non-determinism in selection lives in the sampler.

use crate::models::catalog::{Candidate, CandidateClass, ScoredCandidate};
use crate::models::profile::NeedContext;
use crate::selection::rotation::RotationScores;

/// Fraction of the relevance weight granted when a candidate matches none
/// of the declared needs: safe but low-relevance items stay selectable
/// under exploration instead of dropping to zero.
pub const NO_MATCH_RELEVANCE_FLOOR: f64 = 0.30;

const NEED_SCORE_SCALE: f64 = 5.0;
const EVIDENCE_SCALE: f64 = 5.0;
const EFFICACY_SCALE: f64 = 10.0;

/// Fixed 100-point weight allocation for one entity class.
///
/// Routines weight rotation above relevance — they carry fewer medical
/// criteria than nutraceuticals, so variety dominates. Where a component
/// does not apply to a class, its share folds into rotation.
#[derive(Debug, Clone, Copy)]
pub struct ClassWeights {
    pub relevance: f64,
    pub evidence: f64,
    pub efficacy: f64,
    pub rotation: f64,
}

impl ClassWeights {
    pub fn for_class(class: CandidateClass) -> Self {
        match class {
            CandidateClass::Nutraceutical => Self {
                relevance: 40.0,
                evidence: 20.0,
                efficacy: 20.0,
                rotation: 20.0,
            },
            CandidateClass::Aromatherapy | CandidateClass::Food => Self {
                relevance: 35.0,
                evidence: 15.0,
                efficacy: 20.0,
                rotation: 30.0,
            },
            CandidateClass::Routine => Self {
                relevance: 35.0,
                evidence: 20.0,
                efficacy: 0.0,
                rotation: 45.0,
            },
            CandidateClass::Recipe => Self {
                relevance: 30.0,
                evidence: 0.0,
                efficacy: 0.0,
                rotation: 70.0,
            },
            CandidateClass::CulinaryStyle => Self {
                relevance: 0.0,
                evidence: 0.0,
                efficacy: 0.0,
                rotation: 100.0,
            },
        }
    }

    pub fn total(&self) -> f64 {
        self.relevance + self.evidence + self.efficacy + self.rotation
    }
}

/// Need-match strength in [0, 1].
///
/// A needs-association score (1-5 junction scale) is used directly when
/// present. Otherwise: case-insensitive substring match between declared
/// needs and the candidate's target-needs list, `matches / declared`,
/// floored at [`NO_MATCH_RELEVANCE_FLOOR`].
pub fn relevance_fraction(candidate: &Candidate, needs: &NeedContext) -> f64 {
    if let Some(score) = candidate.need_score {
        return (score as f64 / NEED_SCORE_SCALE).clamp(0.0, 1.0);
    }

    let targets: Vec<String> = candidate
        .target_needs
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let matches = needs
        .needs
        .iter()
        .filter(|need| targets.iter().any(|t| t.contains(need.as_str())))
        .count();

    if matches == 0 {
        NO_MATCH_RELEVANCE_FLOOR
    } else {
        (matches as f64 / needs.needs.len().max(1) as f64).clamp(0.0, 1.0)
    }
}

/// Scores every candidate and returns the list sorted descending by total.
/// The ordering is a display default only — selection goes through the
/// weighted sampler.
pub fn score_candidates(
    candidates: Vec<Candidate>,
    needs: &NeedContext,
    rotation: &RotationScores,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let weights = ClassWeights::for_class(candidate.class);

            let relevance = relevance_fraction(&candidate, needs) * weights.relevance;
            let evidence = candidate.evidence_level.unwrap_or(0) as f64 / EVIDENCE_SCALE
                * weights.evidence;
            let efficacy = candidate.estimated_efficacy.unwrap_or(0.0) / EFFICACY_SCALE
                * weights.efficacy;
            let rotation_points = rotation.item_freshness(candidate.id) * weights.rotation;

            let total = relevance + evidence + efficacy + rotation_points;

            ScoredCandidate {
                candidate,
                relevance,
                rotation: rotation_points,
                total,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::history::{HistorySnapshot, ItemUsage};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn make_candidate(class: CandidateClass, targets: &[&str]) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: "test item".to_string(),
            class,
            target_needs: targets.iter().map(|s| s.to_string()).collect(),
            need_score: None,
            evidence_level: Some(4),
            estimated_efficacy: Some(7.0),
        }
    }

    fn make_needs(needs: &[&str]) -> NeedContext {
        NeedContext::new(needs.iter().map(|s| s.to_string()).collect(), None, None)
    }

    fn empty_rotation() -> RotationScores {
        RotationScores::from_history(&HistorySnapshot::default(), Utc::now())
    }

    #[test]
    fn test_every_class_allocation_sums_to_100() {
        for class in [
            CandidateClass::Nutraceutical,
            CandidateClass::Aromatherapy,
            CandidateClass::Food,
            CandidateClass::Routine,
            CandidateClass::Recipe,
            CandidateClass::CulinaryStyle,
        ] {
            let w = ClassWeights::for_class(class);
            assert!(
                (w.total() - 100.0).abs() < f64::EPSILON,
                "{class:?} weights sum to {}",
                w.total()
            );
        }
    }

    #[test]
    fn test_routines_weight_rotation_above_relevance() {
        let w = ClassWeights::for_class(CandidateClass::Routine);
        assert!(w.rotation > w.relevance);
    }

    #[test]
    fn test_junction_score_used_directly_when_present() {
        let mut candidate = make_candidate(CandidateClass::Nutraceutical, &[]);
        candidate.need_score = Some(5);
        assert_eq!(relevance_fraction(&candidate, &make_needs(&["sleep"])), 1.0);

        candidate.need_score = Some(2);
        assert!((relevance_fraction(&candidate, &make_needs(&["sleep"])) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let candidate = make_candidate(CandidateClass::Nutraceutical, &["Sleep quality", "Stress"]);
        let needs = make_needs(&["sleep"]);
        assert_eq!(relevance_fraction(&candidate, &needs), 1.0);
    }

    #[test]
    fn test_zero_match_gets_nonzero_floor() {
        let candidate = make_candidate(CandidateClass::Nutraceutical, &["digestion"]);
        let needs = make_needs(&["sleep", "vitality"]);
        assert_eq!(relevance_fraction(&candidate, &needs), NO_MATCH_RELEVANCE_FLOOR);
    }

    #[test]
    fn test_partial_match_fraction() {
        let candidate = make_candidate(CandidateClass::Nutraceutical, &["sleep"]);
        let needs = make_needs(&["sleep", "vitality"]);
        assert!((relevance_fraction(&candidate, &needs) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_never_seen_candidate_gets_full_rotation_points() {
        let candidate = make_candidate(CandidateClass::Nutraceutical, &["sleep"]);
        let scored = score_candidates(vec![candidate], &make_needs(&["sleep"]), &empty_rotation());
        let w = ClassWeights::for_class(CandidateClass::Nutraceutical);
        assert!((scored[0].rotation - w.rotation).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recently_seen_candidate_scores_lower_than_fresh_twin() {
        let seen = make_candidate(CandidateClass::Nutraceutical, &["sleep"]);
        let fresh = make_candidate(CandidateClass::Nutraceutical, &["sleep"]);

        let history = HistorySnapshot {
            items: vec![ItemUsage {
                item_id: seen.id,
                item_class: "nutraceutical".to_string(),
                last_seen: Utc::now() - Duration::days(2),
                times_seen: 1,
            }],
            styles: vec![],
            ingredients: vec![],
        };
        let rotation = RotationScores::from_history(&history, Utc::now());

        let scored = score_candidates(
            vec![seen.clone(), fresh.clone()],
            &make_needs(&["sleep"]),
            &rotation,
        );
        assert_eq!(scored[0].candidate.id, fresh.id, "fresh twin ranks first");
        assert!(scored[0].total > scored[1].total);
    }

    #[test]
    fn test_scoring_is_pure() {
        let candidates = vec![
            make_candidate(CandidateClass::Nutraceutical, &["sleep"]),
            make_candidate(CandidateClass::Routine, &["vitality"]),
        ];
        let needs = make_needs(&["sleep", "vitality"]);
        let rotation = empty_rotation();

        let first = score_candidates(candidates.clone(), &needs, &rotation);
        let second = score_candidates(candidates, &needs, &rotation);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.candidate.id, b.candidate.id);
            assert_eq!(a.relevance, b.relevance);
            assert_eq!(a.rotation, b.rotation);
            assert_eq!(a.total, b.total);
        }
    }

    #[test]
    fn test_totals_are_non_negative_and_sorted_descending() {
        let candidates = vec![
            make_candidate(CandidateClass::Nutraceutical, &["sleep"]),
            make_candidate(CandidateClass::Aromatherapy, &[]),
            make_candidate(CandidateClass::Routine, &["sleep"]),
        ];
        let scored = score_candidates(candidates, &make_needs(&["sleep"]), &empty_rotation());
        assert!(scored.iter().all(|s| s.total >= 0.0));
        assert!(scored.windows(2).all(|w| w[0].total >= w[1].total));
    }
}
