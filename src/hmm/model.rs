//! Seeded Gaussian HMM fitting and scoring over multiple sequences.
//!
//! The model contract used by the selection layer:
//!
//! - `fit(frames, lengths, settings)` trains a diagonal-covariance Gaussian
//!   HMM with Baum–Welch (EM) and returns an enumerated `FitError` on any
//!   numerical or convergence failure;
//! - `GaussianHmm::score(frames, lengths)` returns the total log-likelihood
//!   of held-out sequences, with its own enumerated `ScoreError`.
//!
//! Determinism: initialization draws from a `StdRng` seeded by the caller,
//! and the per-sequence E-step runs under rayon with an ordered collect and
//! a sequential reduction, so repeated fits with the same seed and data
//! produce identical parameters.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::hmm::forward::{forward_backward, log_likelihood};
use crate::hmm::gaussian::{DiagGaussian, MIN_VAR};

/// Baum–Welch iteration cap.
pub const MAX_ITERS: usize = 1000;

/// Convergence tolerance on the total log-likelihood delta.
pub const TOL: f64 = 1e-2;

/// Why a fit attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// Fewer frames than hidden states.
    TooFewFrames { needed: usize, got: usize },
    /// `lengths` does not partition the frame matrix.
    LengthMismatch { expected: usize, got: usize },
    /// A zero-length sequence in `lengths`.
    EmptySequence { index: usize },
    /// A state's posterior mass collapsed; its emission cannot be re-estimated.
    DegenerateState { state: usize },
    /// The likelihood became non-finite (vanished forward mass, NaN inputs).
    NonFiniteLikelihood,
    /// The iteration cap was reached before the tolerance was met.
    NotConverged { iters: usize },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::TooFewFrames { needed, got } => {
                write!(f, "too few frames: {got} < {needed} states")
            }
            FitError::LengthMismatch { expected, got } => {
                write!(f, "sequence lengths sum to {got}, expected {expected} frames")
            }
            FitError::EmptySequence { index } => {
                write!(f, "zero-length sequence at index {index}")
            }
            FitError::DegenerateState { state } => {
                write!(f, "state {state} received no posterior mass")
            }
            FitError::NonFiniteLikelihood => write!(f, "log-likelihood became non-finite"),
            FitError::NotConverged { iters } => {
                write!(f, "no convergence after {iters} iterations")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Why scoring a sequence set under a fitted model failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    EmptyObservations,
    DimensionMismatch { expected: usize, got: usize },
    LengthMismatch { expected: usize, got: usize },
    NonFinite,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::EmptyObservations => write!(f, "no observations to score"),
            ScoreError::DimensionMismatch { expected, got } => {
                write!(f, "feature dimension {got} does not match model dimension {expected}")
            }
            ScoreError::LengthMismatch { expected, got } => {
                write!(f, "sequence lengths sum to {got}, expected {expected} frames")
            }
            ScoreError::NonFinite => write!(f, "log-likelihood is not finite"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Fit configuration for one training attempt.
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub n_states: usize,
    pub max_iters: usize,
    pub tol: f64,
    pub seed: u64,
}

impl FitSettings {
    pub fn new(n_states: usize, seed: u64) -> Self {
        Self {
            n_states,
            max_iters: MAX_ITERS,
            tol: TOL,
            seed,
        }
    }
}

/// A fitted diagonal-covariance Gaussian HMM.
#[derive(Debug, Clone)]
pub struct GaussianHmm {
    start: DVector<f64>,
    trans: DMatrix<f64>,
    states: Vec<DiagGaussian>,
}

impl GaussianHmm {
    /// Assemble a model from explicit parameters (ground-truth models for
    /// sampling, hand-built fixtures in tests).
    ///
    /// # Panics
    /// Panics on inconsistent dimensions; parameters are built together, so a
    /// mismatch is a programming error.
    pub fn from_parts(start: DVector<f64>, trans: DMatrix<f64>, states: Vec<DiagGaussian>) -> Self {
        let n = states.len();
        assert!(n > 0, "model needs at least one state");
        assert_eq!(start.len(), n, "start distribution size mismatch");
        assert_eq!(trans.nrows(), n, "transition matrix row mismatch");
        assert_eq!(trans.ncols(), n, "transition matrix column mismatch");
        let dim = states[0].dim();
        assert!(
            states.iter().all(|s| s.dim() == dim),
            "states disagree on feature dimension"
        );
        Self {
            start,
            trans,
            states,
        }
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Feature dimensionality the model was trained on.
    pub fn dim(&self) -> usize {
        self.states[0].dim()
    }

    /// Total log-likelihood of a sequence set under this model.
    pub fn score(&self, frames: &DMatrix<f64>, lengths: &[usize]) -> Result<f64, ScoreError> {
        if frames.nrows() == 0 || lengths.is_empty() {
            return Err(ScoreError::EmptyObservations);
        }
        if frames.ncols() != self.dim() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.dim(),
                got: frames.ncols(),
            });
        }
        let total: usize = lengths.iter().sum();
        if total != frames.nrows() {
            return Err(ScoreError::LengthMismatch {
                expected: frames.nrows(),
                got: total,
            });
        }

        let mut ll = 0.0;
        let mut offset = 0;
        for &len in lengths {
            if len == 0 {
                return Err(ScoreError::EmptyObservations);
            }
            let seq = frames.rows(offset, len).into_owned();
            ll += log_likelihood(&seq, &self.start, &self.trans, &self.states);
            offset += len;
        }
        if !ll.is_finite() {
            return Err(ScoreError::NonFinite);
        }
        Ok(ll)
    }

    /// Sample one observation sequence of the given length.
    pub fn sample_sequence(&self, len: usize, rng: &mut StdRng) -> DMatrix<f64> {
        let d = self.dim();
        let mut frames = DMatrix::zeros(len, d);
        if len == 0 {
            return frames;
        }

        let mut state = sample_discrete(self.start.iter().copied(), rng);
        for t in 0..len {
            if t > 0 {
                state = sample_discrete(self.trans.row(state).iter().copied(), rng);
            }
            let g = &self.states[state];
            for j in 0..d {
                // Unit-normal draw shaped by the state's mean/variance.
                let z: f64 = rng.sample(StandardNormal);
                frames[(t, j)] = g.mean()[j] + g.var()[j].sqrt() * z;
            }
        }
        frames
    }
}

/// Draw an index from a discrete distribution.
fn sample_discrete(probs: impl Iterator<Item = f64>, rng: &mut StdRng) -> usize {
    let u: f64 = rng.r#gen();
    let mut cumsum = 0.0;
    let mut last = 0;
    for (i, p) in probs.enumerate() {
        cumsum += p;
        last = i;
        if u < cumsum {
            return i;
        }
    }
    last
}

/// Fit a diagonal-covariance Gaussian HMM to a pooled sequence set.
pub fn fit(
    frames: &DMatrix<f64>,
    lengths: &[usize],
    settings: &FitSettings,
) -> Result<GaussianHmm, FitError> {
    let n = settings.n_states;
    let total_frames = frames.nrows();

    if total_frames < n || frames.ncols() == 0 {
        return Err(FitError::TooFewFrames {
            needed: n.max(1),
            got: total_frames,
        });
    }
    for (i, &len) in lengths.iter().enumerate() {
        if len == 0 {
            return Err(FitError::EmptySequence { index: i });
        }
    }
    let summed: usize = lengths.iter().sum();
    if lengths.is_empty() || summed != total_frames {
        return Err(FitError::LengthMismatch {
            expected: total_frames,
            got: summed,
        });
    }

    let seqs: Vec<DMatrix<f64>> = {
        let mut out = Vec::with_capacity(lengths.len());
        let mut offset = 0;
        for &len in lengths {
            out.push(frames.rows(offset, len).into_owned());
            offset += len;
        }
        out
    };

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut model = init_model(frames, n, &mut rng);

    let mut prev_ll = f64::NEG_INFINITY;
    for _ in 0..settings.max_iters {
        // E-step: independent per-sequence passes; ordered collect keeps the
        // reduction deterministic.
        let stats: Vec<Option<crate::hmm::forward::SeqStats>> = seqs
            .par_iter()
            .map(|seq| forward_backward(seq, &model.start, &model.trans, &model.states))
            .collect();

        let mut total_ll = 0.0;
        let mut collected = Vec::with_capacity(stats.len());
        for s in stats {
            match s {
                Some(s) => {
                    total_ll += s.log_likelihood;
                    collected.push(s);
                }
                None => return Err(FitError::NonFiniteLikelihood),
            }
        }
        if !total_ll.is_finite() {
            return Err(FitError::NonFiniteLikelihood);
        }
        let stats = collected;

        // M-step.
        model = reestimate(frames, &seqs, &stats, n)?;

        if (total_ll - prev_ll).abs() < settings.tol {
            return Ok(model);
        }
        prev_ll = total_ll;
    }

    Err(FitError::NotConverged {
        iters: settings.max_iters,
    })
}

/// Seeded initialization: k-means emission means, global per-dimension
/// variances, uniform start and transition probabilities.
fn init_model(frames: &DMatrix<f64>, n: usize, rng: &mut StdRng) -> GaussianHmm {
    let d = frames.ncols();
    let total = frames.nrows();

    let centers = kmeans_centers(frames, n, rng);

    let mut var = DVector::zeros(d);
    for j in 0..d {
        let col = frames.column(j);
        let mean = col.sum() / total as f64;
        let mut acc = 0.0;
        for &v in col.iter() {
            let diff = v - mean;
            acc += diff * diff;
        }
        var[j] = (acc / total as f64).max(MIN_VAR);
    }

    let states: Vec<DiagGaussian> = centers
        .into_iter()
        .map(|c| DiagGaussian::new(c, var.clone()))
        .collect();

    let start = DVector::from_element(n, 1.0 / n as f64);
    let trans = DMatrix::from_element(n, n, 1.0 / n as f64);

    GaussianHmm::from_parts(start, trans, states)
}

/// A few rounds of seeded k-means over the frames; empty clusters keep their
/// previous center.
fn kmeans_centers(frames: &DMatrix<f64>, k: usize, rng: &mut StdRng) -> Vec<DVector<f64>> {
    let total = frames.nrows();
    let d = frames.ncols();

    let picks = rand::seq::index::sample(rng, total, k);
    let mut centers: Vec<DVector<f64>> = picks
        .iter()
        .map(|idx| frames.row(idx).transpose())
        .collect();

    let mut assignments = vec![0usize; total];
    for _ in 0..10 {
        for t in 0..total {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let mut dist = 0.0;
                for j in 0..d {
                    let diff = frames[(t, j)] - center[j];
                    dist += diff * diff;
                }
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            assignments[t] = best;
        }

        for (c, center) in centers.iter_mut().enumerate() {
            let mut acc = DVector::zeros(d);
            let mut count = 0usize;
            for t in 0..total {
                if assignments[t] == c {
                    for j in 0..d {
                        acc[j] += frames[(t, j)];
                    }
                    count += 1;
                }
            }
            if count > 0 {
                *center = acc / count as f64;
            }
        }
    }

    centers
}

/// M-step: fold the per-sequence statistics back into new parameters.
fn reestimate(
    frames: &DMatrix<f64>,
    seqs: &[DMatrix<f64>],
    stats: &[crate::hmm::forward::SeqStats],
    n: usize,
) -> Result<GaussianHmm, FitError> {
    let total_frames = frames.nrows();

    // Initial distribution: average of first-frame posteriors.
    let mut start = DVector::zeros(n);
    for s in stats {
        for j in 0..n {
            start[j] += s.gamma[(0, j)];
        }
    }
    start /= stats.len() as f64;

    // Transitions: expected counts over pooled sequences, uniform fallback
    // for rows with no mass (single-frame sequences contribute none).
    let mut xi_total = DMatrix::zeros(n, n);
    let mut gamma_denom = DVector::<f64>::zeros(n);
    for (seq, s) in seqs.iter().zip(stats) {
        xi_total += &s.xi_sum;
        let t_len = seq.nrows();
        for t in 0..t_len.saturating_sub(1) {
            for i in 0..n {
                gamma_denom[i] += s.gamma[(t, i)];
            }
        }
    }
    let mut trans = DMatrix::zeros(n, n);
    for i in 0..n {
        if gamma_denom[i] > 1e-300 {
            for j in 0..n {
                trans[(i, j)] = xi_total[(i, j)] / gamma_denom[i];
            }
        } else {
            for j in 0..n {
                trans[(i, j)] = 1.0 / n as f64;
            }
        }
        let row_sum: f64 = trans.row(i).sum();
        if row_sum > 1e-300 {
            for j in 0..n {
                trans[(i, j)] /= row_sum;
            }
        }
    }

    // Emissions: posterior-weighted moments over the pooled frame order.
    let mut states = Vec::with_capacity(n);
    for j in 0..n {
        let mut weights = DVector::zeros(total_frames);
        let mut offset = 0;
        for s in stats {
            let t_len = s.gamma.nrows();
            for t in 0..t_len {
                weights[offset + t] = s.gamma[(t, j)];
            }
            offset += t_len;
        }
        let state = DiagGaussian::from_weighted(frames, &weights)
            .ok_or(FitError::DegenerateState { state: j })?;
        states.push(state);
    }

    Ok(GaussianHmm::from_parts(start, trans, states))
}
