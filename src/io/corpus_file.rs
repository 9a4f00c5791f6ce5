//! Read/write corpus JSON files.
//!
//! Schema: label → list of sequences, each sequence a list of frames, each
//! frame a list of floats. Validation happens row by row so a malformed
//! file reports the label and sequence index, not a generic parse error.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::AppError;

/// On-disk schema of a corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFile {
    pub tool: String,
    pub labels: BTreeMap<String, Vec<Vec<Vec<f64>>>>,
}

/// Read and normalize a corpus JSON file.
pub fn read_corpus_json(path: &Path) -> Result<Corpus, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open corpus '{}': {e}", path.display()))
    })?;
    let raw: CorpusFile = serde_json::from_reader(file).map_err(|e| {
        AppError::config(format!("Invalid corpus JSON '{}': {e}", path.display()))
    })?;

    let mut sequences = BTreeMap::new();
    for (label, raw_seqs) in raw.labels {
        let mut seqs = Vec::with_capacity(raw_seqs.len());
        for (i, frames) in raw_seqs.iter().enumerate() {
            seqs.push(to_matrix(&label, i, frames)?);
        }
        sequences.insert(label, seqs);
    }
    Corpus::from_sequences(sequences)
}

/// Write a corpus as JSON.
pub fn write_corpus_json(path: &Path, corpus: &Corpus) -> Result<(), AppError> {
    let mut labels = BTreeMap::new();
    for label in corpus.labels() {
        let seqs = corpus
            .sequences(label)
            .ok_or_else(|| AppError::internal(format!("Label '{label}' vanished from corpus.")))?;
        let raw: Vec<Vec<Vec<f64>>> = seqs.iter().map(matrix_to_rows).collect();
        labels.insert(label.to_string(), raw);
    }

    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create corpus '{}': {e}", path.display()))
    })?;
    serde_json::to_writer(
        file,
        &CorpusFile {
            tool: "topo".to_string(),
            labels,
        },
    )
    .map_err(|e| AppError::internal(format!("Failed to write corpus JSON: {e}")))?;
    Ok(())
}

fn to_matrix(label: &str, seq_index: usize, frames: &[Vec<f64>]) -> Result<DMatrix<f64>, AppError> {
    let Some(first) = frames.first() else {
        return Err(AppError::config(format!(
            "Label '{label}' sequence {seq_index} has no frames."
        )));
    };
    let dim = first.len();
    if dim == 0 {
        return Err(AppError::config(format!(
            "Label '{label}' sequence {seq_index} has zero-width frames."
        )));
    }

    let mut flat = Vec::with_capacity(frames.len() * dim);
    for (t, frame) in frames.iter().enumerate() {
        if frame.len() != dim {
            return Err(AppError::config(format!(
                "Label '{label}' sequence {seq_index} frame {t} has {} values, expected {dim}.",
                frame.len()
            )));
        }
        flat.extend_from_slice(frame);
    }
    Ok(DMatrix::from_row_slice(frames.len(), dim, &flat))
}

fn matrix_to_rows(seq: &DMatrix<f64>) -> Vec<Vec<f64>> {
    (0..seq.nrows())
        .map(|t| seq.row(t).iter().copied().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::generate_corpus;
    use crate::domain::SyntheticSpec;

    #[test]
    fn corpus_round_trips_through_json() {
        let spec = SyntheticSpec {
            n_labels: 2,
            sequences_per_label: 3,
            min_len: 5,
            max_len: 8,
            ..SyntheticSpec::default()
        };
        let corpus = generate_corpus(&spec).unwrap();

        let dir = std::env::temp_dir().join("word_topo_corpus_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corpus_roundtrip.json");

        write_corpus_json(&path, &corpus).unwrap();
        let read = read_corpus_json(&path).unwrap();

        assert_eq!(read.n_labels(), corpus.n_labels());
        for label in corpus.labels() {
            let a = corpus.pooled(label).unwrap();
            let b = read.pooled(label).unwrap();
            assert_eq!(a.lengths, b.lengths);
            assert_eq!(a.frames, b.frames);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn ragged_frames_report_label_and_indices() {
        let err = to_matrix("word", 2, &[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("word"), "message: {message}");
        assert!(message.contains("sequence 2"), "message: {message}");
    }
}
