//! Extremal pick over a score table, plus winner refit.
//!
//! Tie-breaking: the table iterates in ascending state-count order and the
//! scan only replaces the incumbent on a strict improvement, so equal
//! scores deterministically keep the smaller state count.

use crate::domain::{Direction, ScoreTable};
use crate::hmm::GaussianHmm;
use crate::select::fitter::ModelFitter;

/// The winning candidate of a score table, if any.
pub fn best_candidate(scores: &ScoreTable, direction: Direction) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (n, score) in scores.iter() {
        let improves = match best {
            None => true,
            Some((_, incumbent)) => match direction {
                Direction::Minimize => score < incumbent,
                Direction::Maximize => score > incumbent,
            },
        };
        if improves {
            best = Some((n, score));
        }
    }
    best.map(|(n, _)| n)
}

/// Pick the winner and re-fit it for return.
///
/// The model scored during the search is not kept; the winner is fitted
/// afresh, and a refit failure means no selection.
pub fn select_model(
    scores: &ScoreTable,
    direction: Direction,
    fitter: &ModelFitter<'_>,
) -> Option<(usize, GaussianHmm)> {
    let n = best_candidate(scores, direction)?;
    fitter.fit(n).map(|model| (n, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(usize, f64)]) -> ScoreTable {
        entries.iter().copied().collect()
    }

    #[test]
    fn empty_table_selects_nothing() {
        assert_eq!(best_candidate(&table(&[]), Direction::Minimize), None);
        assert_eq!(best_candidate(&table(&[]), Direction::Maximize), None);
    }

    #[test]
    fn minimize_picks_lowest_score() {
        let t = table(&[(2, 5.0), (3, 1.0), (4, 9.0)]);
        assert_eq!(best_candidate(&t, Direction::Minimize), Some(3));
    }

    #[test]
    fn maximize_picks_highest_score() {
        let t = table(&[(2, 5.0), (3, 1.0), (4, 9.0)]);
        assert_eq!(best_candidate(&t, Direction::Maximize), Some(4));
    }

    #[test]
    fn ties_keep_the_smaller_state_count() {
        let t = table(&[(2, 7.0), (5, 7.0), (9, 7.0)]);
        assert_eq!(best_candidate(&t, Direction::Minimize), Some(2));
        assert_eq!(best_candidate(&t, Direction::Maximize), Some(2));
    }

    #[test]
    fn tie_break_is_stable_across_runs() {
        let t = table(&[(4, -3.5), (6, -3.5)]);
        for _ in 0..10 {
            assert_eq!(best_candidate(&t, Direction::Maximize), Some(4));
        }
    }
}
