// src/services/rating.rs
// DOCUMENTATION: Rating ledger recomputation
// PURPOSE: Pure upsert-and-average over the per-place rating ledger

use crate::models::RatingLedger;
use uuid::Uuid;

/// RatingAggregator: derives the next ledger state from a vote.
/// DOCUMENTATION: Pure function over the ledger - the store decides whether the
/// result may be committed (version check), so this can safely be re-run after
/// a commit conflict.
pub struct RatingAggregator;

impl RatingAggregator {
    /// Apply one vote and recompute the average.
    /// A rater already present has their paired entry replaced in place; a new
    /// rater is appended to both sequences. The input ledger is not touched.
    pub fn apply(ledger: &RatingLedger, rater_id: Uuid, value: i32) -> RatingLedger {
        let mut next = ledger.clone();

        match next.rater_ids.iter().position(|id| *id == rater_id) {
            Some(i) => next.rater_ratings[i] = value,
            None => {
                next.rater_ids.push(rater_id);
                next.rater_ratings.push(value);
            }
        }

        let count = next.rater_ratings.len();
        next.average = if count == 0 {
            0.0
        } else {
            next.rater_ratings.iter().map(|v| *v as f64).sum::<f64>() / count as f64
        };

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn first_vote_appends_and_sets_average() {
        let rater = Uuid::new_v4();
        let ledger = RatingAggregator::apply(&RatingLedger::default(), rater, 4);

        assert_eq!(ledger.rater_ids, vec![rater]);
        assert_eq!(ledger.rater_ratings, vec![4]);
        assert!((ledger.average - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn repeat_vote_replaces_in_place() {
        let r1 = Uuid::new_v4();
        let r2 = Uuid::new_v4();

        let ledger = RatingAggregator::apply(&RatingLedger::default(), r1, 4);
        let ledger = RatingAggregator::apply(&ledger, r2, 2);
        let ledger = RatingAggregator::apply(&ledger, r1, 5);

        assert_eq!(ledger.rater_ids, vec![r1, r2]);
        assert_eq!(ledger.rater_ratings, vec![5, 2]);
        assert_eq!(ledger.rater_ids.len(), ledger.rater_ratings.len());
        assert!((ledger.average - 3.5).abs() < TOLERANCE);
    }

    #[test]
    fn average_is_the_exact_mean() {
        let mut ledger = RatingLedger::default();
        let votes = [1, 2, 3, 4, 5, 5, 4, 1];
        for v in votes {
            ledger = RatingAggregator::apply(&ledger, Uuid::new_v4(), v);
        }

        let expected = votes.iter().map(|v| *v as f64).sum::<f64>() / votes.len() as f64;
        assert!((ledger.average - expected).abs() < TOLERANCE);
        assert_eq!(ledger.summary().count, votes.len());
    }

    #[test]
    fn input_ledger_is_left_untouched() {
        let rater = Uuid::new_v4();
        let before = RatingAggregator::apply(&RatingLedger::default(), rater, 3);
        let snapshot = before.clone();

        let after = RatingAggregator::apply(&before, Uuid::new_v4(), 5);

        assert_eq!(before, snapshot);
        assert_ne!(after, before);
    }
}
