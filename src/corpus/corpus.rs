//! Normalized word corpus.
//!
//! A corpus maps each word label to its recorded observation sequences
//! (each a frames × dims matrix). Fitting wants the pooled form (one
//! stacked matrix per label plus the ordered sequence lengths), so the
//! corpus derives it once at construction. Deriving rather than accepting
//! both forms makes the invariant (lengths sum to the stacked row count,
//! same sequence order in both forms) hold by construction.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::error::AppError;

/// Stacked representation of a label's sequences.
#[derive(Debug, Clone)]
pub struct Pooled {
    /// All frames of all sequences, in sequence order.
    pub frames: DMatrix<f64>,
    /// Per-sequence frame counts; sums to `frames.nrows()`.
    pub lengths: Vec<usize>,
}

/// Label → sequences, with the pooled form derived per label.
///
/// Labels iterate in sorted order (`BTreeMap`), which keeps every
/// corpus-wide sweep deterministic.
#[derive(Debug, Clone)]
pub struct Corpus {
    sequences: BTreeMap<String, Vec<DMatrix<f64>>>,
    pooled: BTreeMap<String, Pooled>,
    dim: usize,
}

impl Corpus {
    /// Validate and normalize raw per-label sequence lists.
    ///
    /// Rejected: empty corpora, empty label names, labels without
    /// sequences, empty sequences, and ragged feature dimensions.
    pub fn from_sequences(
        sequences: BTreeMap<String, Vec<DMatrix<f64>>>,
    ) -> Result<Self, AppError> {
        if sequences.is_empty() {
            return Err(AppError::data("Corpus contains no labels."));
        }

        let mut dim = 0usize;
        for (label, seqs) in &sequences {
            if label.is_empty() {
                return Err(AppError::config("Corpus contains an empty label name."));
            }
            if seqs.is_empty() {
                return Err(AppError::data(format!(
                    "Label '{label}' has no sequences."
                )));
            }
            for (i, seq) in seqs.iter().enumerate() {
                if seq.nrows() == 0 || seq.ncols() == 0 {
                    return Err(AppError::data(format!(
                        "Label '{label}' sequence {i} is empty."
                    )));
                }
                if dim == 0 {
                    dim = seq.ncols();
                } else if seq.ncols() != dim {
                    return Err(AppError::config(format!(
                        "Label '{label}' sequence {i} has {} feature dims, expected {dim}.",
                        seq.ncols()
                    )));
                }
            }
        }

        let pooled = sequences
            .iter()
            .map(|(label, seqs)| (label.clone(), pool(seqs)))
            .collect();

        Ok(Self {
            sequences,
            pooled,
            dim,
        })
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    pub fn n_labels(&self) -> usize {
        self.sequences.len()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.sequences.contains_key(label)
    }

    /// Feature dimensionality shared by every sequence.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn sequences(&self, label: &str) -> Option<&[DMatrix<f64>]> {
        self.sequences.get(label).map(Vec::as_slice)
    }

    pub fn pooled(&self, label: &str) -> Option<&Pooled> {
        self.pooled.get(label)
    }

    /// (label, pooled) pairs in sorted label order.
    pub fn iter_pooled(&self) -> impl Iterator<Item = (&str, &Pooled)> {
        self.pooled.iter().map(|(label, pooled)| (label.as_str(), pooled))
    }

    /// Total frame count for a label.
    pub fn frame_count(&self, label: &str) -> Option<usize> {
        self.pooled.get(label).map(|p| p.frames.nrows())
    }
}

/// Stack a full sequence list.
fn pool(seqs: &[DMatrix<f64>]) -> Pooled {
    let indices: Vec<usize> = (0..seqs.len()).collect();
    combine(seqs, &indices)
}

/// Stack an index-subset of sequences into the pooled form.
///
/// Order follows `indices`, so fold construction stays stable.
///
/// # Panics
/// Panics on an out-of-range index; callers pass indices produced from the
/// same sequence list.
pub fn combine(seqs: &[DMatrix<f64>], indices: &[usize]) -> Pooled {
    let dim = seqs.first().map_or(0, |s| s.ncols());
    let total: usize = indices.iter().map(|&i| seqs[i].nrows()).sum();

    let mut frames = DMatrix::zeros(total, dim);
    let mut lengths = Vec::with_capacity(indices.len());
    let mut offset = 0;
    for &i in indices {
        let seq = &seqs[i];
        frames.rows_mut(offset, seq.nrows()).copy_from(seq);
        offset += seq.nrows();
        lengths.push(seq.nrows());
    }

    Pooled { frames, lengths }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(rows: &[[f64; 2]]) -> DMatrix<f64> {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        DMatrix::from_row_slice(rows.len(), 2, &flat)
    }

    fn tiny_corpus() -> Corpus {
        let mut map = BTreeMap::new();
        map.insert(
            "left".to_string(),
            vec![seq(&[[0.0, 1.0], [0.1, 1.1]]), seq(&[[0.2, 1.2]])],
        );
        map.insert("right".to_string(), vec![seq(&[[5.0, 6.0], [5.1, 6.1]])]);
        Corpus::from_sequences(map).unwrap()
    }

    #[test]
    fn pooled_lengths_sum_to_row_count() {
        let corpus = tiny_corpus();
        for label in ["left", "right"] {
            let pooled = corpus.pooled(label).unwrap();
            let total: usize = pooled.lengths.iter().sum();
            assert_eq!(total, pooled.frames.nrows(), "label {label}");
        }
    }

    #[test]
    fn pooled_preserves_sequence_order() {
        let corpus = tiny_corpus();
        let pooled = corpus.pooled("left").unwrap();
        assert_eq!(pooled.lengths, vec![2, 1]);
        // Third pooled frame is the single-frame second sequence.
        assert!((pooled.frames[(2, 0)] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn labels_iterate_sorted() {
        let corpus = tiny_corpus();
        let labels: Vec<&str> = corpus.labels().collect();
        assert_eq!(labels, vec!["left", "right"]);
    }

    #[test]
    fn ragged_dimensions_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(
            "bad".to_string(),
            vec![
                DMatrix::from_row_slice(1, 2, &[0.0, 1.0]),
                DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 2.0]),
            ],
        );
        let err = Corpus::from_sequences(map).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = Corpus::from_sequences(BTreeMap::new()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn combine_stacks_selected_sequences() {
        let seqs = vec![seq(&[[0.0, 0.0]]), seq(&[[1.0, 1.0], [2.0, 2.0]]), seq(&[[3.0, 3.0]])];
        let pooled = combine(&seqs, &[2, 0]);
        assert_eq!(pooled.lengths, vec![1, 1]);
        assert!((pooled.frames[(0, 0)] - 3.0).abs() < 1e-12);
        assert!((pooled.frames[(1, 0)] - 0.0).abs() < 1e-12);
    }
}
