//! Deterministic contiguous k-fold index splitting.
//!
//! No shuffling: fold boundaries depend only on the item count, so repeated
//! runs produce identical folds. Fold sizes follow the usual convention:
//! the first `n mod k` folds get one extra item.

/// The splitter cannot produce folds for this item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitError {
    pub needed: usize,
    pub got: usize,
}

impl std::fmt::Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot split {} item(s) into {} folds",
            self.got, self.needed
        )
    }
}

impl std::error::Error for SplitError {}

/// Contiguous k-fold splitter over item indices `0..n`.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    /// # Panics
    /// Panics for `n_splits < 2`; a 1-fold split has no held-out set.
    pub fn new(n_splits: usize) -> Self {
        assert!(n_splits >= 2, "k-fold needs at least 2 splits");
        Self { n_splits }
    }

    /// (train, test) index pairs, one per fold, in fold order.
    pub fn split(&self, n_items: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, SplitError> {
        if n_items < self.n_splits {
            return Err(SplitError {
                needed: self.n_splits,
                got: n_items,
            });
        }

        let base = n_items / self.n_splits;
        let extra = n_items % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for f in 0..self.n_splits {
            let size = base + usize::from(f < extra);
            let test: Vec<usize> = (start..start + size).collect();
            let train: Vec<usize> = (0..n_items).filter(|i| !test.contains(i)).collect();
            folds.push((train, test));
            start += size;
        }
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_folds_partition_evenly() {
        let folds = KFold::new(2).split(4).unwrap();
        assert_eq!(folds.len(), 2);
        assert_eq!(folds[0].1, vec![0, 1]);
        assert_eq!(folds[0].0, vec![2, 3]);
        assert_eq!(folds[1].1, vec![2, 3]);
        assert_eq!(folds[1].0, vec![0, 1]);
    }

    #[test]
    fn uneven_counts_front_load_the_extra_item() {
        let folds = KFold::new(2).split(5).unwrap();
        assert_eq!(folds[0].1, vec![0, 1, 2]);
        assert_eq!(folds[1].1, vec![3, 4]);
    }

    #[test]
    fn every_item_is_held_out_exactly_once() {
        let folds = KFold::new(3).split(10).unwrap();
        let mut held_out: Vec<usize> = folds.iter().flat_map(|(_, t)| t.clone()).collect();
        held_out.sort_unstable();
        assert_eq!(held_out, (0..10).collect::<Vec<usize>>());
    }

    #[test]
    fn too_few_items_is_an_error() {
        let err = KFold::new(2).split(1).unwrap_err();
        assert_eq!(err, SplitError { needed: 2, got: 1 });
    }

    #[test]
    fn splits_are_deterministic() {
        let a = KFold::new(2).split(7).unwrap();
        let b = KFold::new(2).split(7).unwrap();
        assert_eq!(a, b);
    }
}
