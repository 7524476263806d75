//! Weighted sampling without replacement.
//!
//! A strict top-N cut produces staleness: with thin history the same
//! highest-scoring items recur every request. Proportional sampling keeps
//! the quality bias while guaranteeing eventual exposure of lower-ranked
//! but valid candidates.

use rand::Rng;

/// Weights are floored here so a zero-score candidate keeps a nonzero
/// selection probability instead of being excluded outright.
pub const MIN_SAMPLING_WEIGHT: f64 = 1.0;

/// Draws `min(n, pool.len())` distinct items from `pool`, without
/// replacement, each draw proportional to `max(weight(item), 1.0)`.
///
/// Per draw: sum the weights of the remaining pool, draw uniform in
/// [0, sum), walk the pool subtracting weights, and take the item that
/// crosses zero.
pub fn sample_weighted<T, R, F>(rng: &mut R, mut pool: Vec<T>, n: usize, weight: F) -> Vec<T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    let mut picked = Vec::with_capacity(n.min(pool.len()));

    while picked.len() < n && !pool.is_empty() {
        let weights: Vec<f64> = pool
            .iter()
            .map(|item| weight(item).max(MIN_SAMPLING_WEIGHT))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut draw = rng.gen_range(0.0..total);
        let mut chosen = pool.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            draw -= w;
            if draw < 0.0 {
                chosen = i;
                break;
            }
        }

        picked.push(pool.swap_remove(chosen));
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: usize,
        score: f64,
    }

    fn make_pool(scores: &[f64]) -> Vec<Item> {
        scores
            .iter()
            .enumerate()
            .map(|(id, &score)| Item { id, score })
            .collect()
    }

    #[test]
    fn test_returns_exactly_min_n_len_distinct_items() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = make_pool(&[80.0, 60.0, 40.0, 20.0, 10.0]);

        let three = sample_weighted(&mut rng, pool.clone(), 3, |i| i.score);
        assert_eq!(three.len(), 3);
        let ids: HashSet<usize> = three.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 3, "no duplicates");

        let all = sample_weighted(&mut rng, pool, 10, |i| i.score);
        assert_eq!(all.len(), 5, "capped at pool size");
    }

    #[test]
    fn test_empty_pool_yields_empty_selection() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_weighted(&mut rng, Vec::<Item>::new(), 3, |i| i.score);
        assert!(picked.is_empty());
    }

    #[test]
    fn test_zero_score_item_remains_selectable() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = make_pool(&[90.0, 0.0]);
        // n >= pool size: the zero-score item must always be included.
        let picked = sample_weighted(&mut rng, pool, 2, |i| i.score);
        assert!(picked.iter().any(|i| i.score == 0.0));
    }

    #[test]
    fn test_zero_score_item_wins_occasionally() {
        // With the floor at 1.0, a zero-score item competing against 9.0
        // should win roughly 10% of single draws.
        let mut rng = StdRng::seed_from_u64(42);
        let mut zero_wins = 0;
        for _ in 0..2000 {
            let pool = make_pool(&[9.0, 0.0]);
            let picked = sample_weighted(&mut rng, pool, 1, |i| i.score);
            if picked[0].score == 0.0 {
                zero_wins += 1;
            }
        }
        assert!(
            zero_wins > 50,
            "zero-score item never sampled ({zero_wins}/2000) — floor not applied"
        );
    }

    #[test]
    fn test_higher_scores_win_proportionally_more() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut high_wins = 0;
        for _ in 0..2000 {
            let pool = make_pool(&[90.0, 10.0]);
            let picked = sample_weighted(&mut rng, pool, 1, |i| i.score);
            if picked[0].id == 0 {
                high_wins += 1;
            }
        }
        // Expected ~90%; allow slack for randomness.
        assert!(
            high_wins > 1600,
            "high-score item won only {high_wins}/2000 draws"
        );
        assert!(
            high_wins < 2000,
            "low-score item must still win sometimes"
        );
    }
}
