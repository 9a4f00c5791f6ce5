//! Scaled forward/backward passes over a single observation sequence.
//!
//! Probabilities are propagated in linear space with per-frame scaling, the
//! classic remedy for underflow on long sequences. Emission densities are
//! first computed in log space and shifted by the per-frame maximum before
//! exponentiation, so very unlikely frames cannot zero out a whole column.
//! The log-likelihood is recovered from the scale factors plus the shifts.

use nalgebra::{DMatrix, DVector};

use crate::hmm::gaussian::DiagGaussian;

/// Sufficient statistics of one sequence under the current parameters.
#[derive(Debug, Clone)]
pub struct SeqStats {
    /// Posterior state probabilities, frames × states.
    pub gamma: DMatrix<f64>,
    /// Expected transition counts summed over the sequence, states × states.
    pub xi_sum: DMatrix<f64>,
    /// `log P(sequence | parameters)`.
    pub log_likelihood: f64,
}

/// Emission probabilities shifted into a scale-safe linear form.
///
/// Returns the frames × states matrix `exp(logb - rowmax)` together with the
/// sum of the row maxima (to be added back into the log-likelihood).
fn scaled_emissions(seq: &DMatrix<f64>, states: &[DiagGaussian]) -> (DMatrix<f64>, f64) {
    let t_len = seq.nrows();
    let n = states.len();

    let mut emis = DMatrix::zeros(t_len, n);
    let mut shift_total = 0.0;
    for t in 0..t_len {
        let mut row_max = f64::NEG_INFINITY;
        for j in 0..n {
            let lp = states[j].log_pdf_frame(seq, t);
            emis[(t, j)] = lp;
            if lp > row_max {
                row_max = lp;
            }
        }
        // A row of -inf means every state assigns zero density; keep the
        // zeros and let the caller detect the non-finite likelihood.
        if row_max.is_finite() {
            shift_total += row_max;
            for j in 0..n {
                emis[(t, j)] = (emis[(t, j)] - row_max).exp();
            }
        } else {
            for j in 0..n {
                emis[(t, j)] = 0.0;
            }
        }
    }
    (emis, shift_total)
}

/// Forward pass only: `log P(seq | start, trans, states)`.
///
/// Returns `f64::NEG_INFINITY` / NaN propagation untouched; callers check
/// finiteness.
pub fn log_likelihood(
    seq: &DMatrix<f64>,
    start: &DVector<f64>,
    trans: &DMatrix<f64>,
    states: &[DiagGaussian],
) -> f64 {
    let t_len = seq.nrows();
    let n = states.len();
    if t_len == 0 {
        return 0.0;
    }

    let (emis, shift_total) = scaled_emissions(seq, states);

    let mut alpha = DVector::zeros(n);
    let mut log_scale_total = 0.0;

    for j in 0..n {
        alpha[j] = start[j] * emis[(0, j)];
    }
    let c0: f64 = alpha.iter().sum();
    if c0 <= 0.0 {
        return f64::NEG_INFINITY;
    }
    alpha /= c0;
    log_scale_total += c0.ln();

    let mut next = DVector::zeros(n);
    for t in 1..t_len {
        for j in 0..n {
            let mut sum = 0.0;
            for i in 0..n {
                sum += alpha[i] * trans[(i, j)];
            }
            next[j] = sum * emis[(t, j)];
        }
        let c: f64 = next.iter().sum();
        if c <= 0.0 {
            return f64::NEG_INFINITY;
        }
        next /= c;
        log_scale_total += c.ln();
        std::mem::swap(&mut alpha, &mut next);
    }

    log_scale_total + shift_total
}

/// Full forward/backward pass producing the E-step statistics.
///
/// Returns `None` when the sequence has zero probability under the current
/// parameters (all-zero emission row or a vanished forward mass); the fit
/// loop treats that as a non-finite-likelihood failure.
pub fn forward_backward(
    seq: &DMatrix<f64>,
    start: &DVector<f64>,
    trans: &DMatrix<f64>,
    states: &[DiagGaussian],
) -> Option<SeqStats> {
    let t_len = seq.nrows();
    let n = states.len();
    if t_len == 0 {
        return None;
    }

    let (emis, shift_total) = scaled_emissions(seq, states);

    // Forward with scaling.
    let mut alpha = DMatrix::zeros(t_len, n);
    let mut scale = DVector::zeros(t_len);

    for j in 0..n {
        alpha[(0, j)] = start[j] * emis[(0, j)];
    }
    scale[0] = alpha.row(0).sum();
    if scale[0] <= 0.0 {
        return None;
    }
    for j in 0..n {
        alpha[(0, j)] /= scale[0];
    }

    for t in 1..t_len {
        for j in 0..n {
            let mut sum = 0.0;
            for i in 0..n {
                sum += alpha[(t - 1, i)] * trans[(i, j)];
            }
            alpha[(t, j)] = sum * emis[(t, j)];
        }
        scale[t] = alpha.row(t).sum();
        if scale[t] <= 0.0 {
            return None;
        }
        for j in 0..n {
            alpha[(t, j)] /= scale[t];
        }
    }

    let log_likelihood: f64 = scale.iter().map(|c| c.ln()).sum::<f64>() + shift_total;

    // Backward, scaled by the forward scale factors.
    let mut beta = DMatrix::zeros(t_len, n);
    for j in 0..n {
        beta[(t_len - 1, j)] = 1.0;
    }
    for t in (0..t_len - 1).rev() {
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += trans[(i, j)] * emis[(t + 1, j)] * beta[(t + 1, j)];
            }
            beta[(t, i)] = sum / scale[t + 1];
        }
    }

    // Posteriors.
    let mut gamma = DMatrix::zeros(t_len, n);
    for t in 0..t_len {
        let mut sum = 0.0;
        for j in 0..n {
            gamma[(t, j)] = alpha[(t, j)] * beta[(t, j)];
            sum += gamma[(t, j)];
        }
        if sum <= 0.0 {
            return None;
        }
        for j in 0..n {
            gamma[(t, j)] /= sum;
        }
    }

    // Expected transition counts.
    let mut xi_sum = DMatrix::zeros(n, n);
    for t in 0..t_len.saturating_sub(1) {
        for i in 0..n {
            for j in 0..n {
                xi_sum[(i, j)] += alpha[(t, i)]
                    * trans[(i, j)]
                    * emis[(t + 1, j)]
                    * beta[(t + 1, j)]
                    / scale[t + 1];
            }
        }
    }

    Some(SeqStats {
        gamma,
        xi_sum,
        log_likelihood,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn two_state() -> (DVector<f64>, DMatrix<f64>, Vec<DiagGaussian>) {
        let start = dvector![0.6, 0.4];
        let trans = DMatrix::from_row_slice(2, 2, &[0.7, 0.3, 0.4, 0.6]);
        let states = vec![
            DiagGaussian::new(dvector![0.0], dvector![1.0]),
            DiagGaussian::new(dvector![3.0], dvector![1.0]),
        ];
        (start, trans, states)
    }

    #[test]
    fn posteriors_sum_to_one_per_frame() {
        let (start, trans, states) = two_state();
        let seq = DMatrix::from_row_slice(4, 1, &[0.1, 0.2, 2.8, 3.1]);

        let stats = forward_backward(&seq, &start, &trans, &states).unwrap();
        assert_eq!(stats.gamma.nrows(), 4);
        for t in 0..4 {
            let sum: f64 = stats.gamma.row(t).sum();
            assert!((sum - 1.0).abs() < 1e-9, "frame {t}: gamma sums to {sum}");
        }
        assert!(stats.log_likelihood.is_finite());
    }

    #[test]
    fn forward_only_matches_full_pass() {
        let (start, trans, states) = two_state();
        let seq = DMatrix::from_row_slice(5, 1, &[0.1, -0.2, 3.0, 2.9, 0.4]);

        let full = forward_backward(&seq, &start, &trans, &states).unwrap();
        let fwd = log_likelihood(&seq, &start, &trans, &states);
        assert!((full.log_likelihood - fwd).abs() < 1e-9);
    }

    #[test]
    fn posterior_tracks_the_emitting_state() {
        let (start, trans, states) = two_state();
        let seq = DMatrix::from_row_slice(4, 1, &[0.1, 0.2, 2.8, 3.1]);

        let stats = forward_backward(&seq, &start, &trans, &states).unwrap();
        assert!(stats.gamma[(0, 0)] > 0.5, "early frames favor state 0");
        assert!(stats.gamma[(3, 1)] > 0.5, "late frames favor state 1");
    }

    #[test]
    fn long_sequence_stays_finite() {
        let (start, trans, states) = two_state();
        let values: Vec<f64> = (0..500).map(|i| if i % 2 == 0 { 0.1 } else { 2.9 }).collect();
        let seq = DMatrix::from_column_slice(500, 1, &values);

        let ll = log_likelihood(&seq, &start, &trans, &states);
        assert!(ll.is_finite());
        assert!(ll < 0.0);
    }
}
