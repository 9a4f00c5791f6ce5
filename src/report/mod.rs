//! Reporting utilities: formatted terminal output for selection runs.
//!
//! We keep formatting code in one place so:
//! - the selection/model code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{Policy, SelectorOptions};
use crate::select::LabelOutcome;

/// Format the per-word outcome table for a selection run.
pub fn format_run_summary(
    outcomes: &[LabelOutcome],
    policy: Policy,
    options: &SelectorOptions,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Topology selection ({}): candidates [{}, {}], seed {}\n",
        policy.display_name(),
        options.range.min(),
        options.range.max(),
        options.seed
    ));
    out.push_str(&format!(
        "{:<16} {:>7} {:>14} {:>7} {:>8}\n",
        "word", "states", "score", "scored", "skipped"
    ));

    let mut modeled = 0usize;
    for outcome in outcomes {
        match &outcome.selection {
            Some(sel) => {
                modeled += 1;
                let score = sel
                    .scores
                    .get(sel.n_states)
                    .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
                out.push_str(&format!(
                    "{:<16} {:>7} {:>14} {:>7} {:>8}\n",
                    outcome.label,
                    sel.n_states,
                    score,
                    sel.scores.len(),
                    sel.skipped.len()
                ));
            }
            None => {
                out.push_str(&format!(
                    "{:<16} {:>7} {:>14} {:>7} {:>8}\n",
                    outcome.label, "-", "unmodelable", 0, "-"
                ));
            }
        }
    }

    out.push_str(&format!(
        "{modeled} of {} word(s) modeled\n",
        outcomes.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::generate_corpus;
    use crate::domain::{CandidateRange, SyntheticSpec};
    use crate::select::{BicSelector, Selector, SelectorContext};

    #[test]
    fn summary_lists_every_word_once() {
        let spec = SyntheticSpec {
            n_labels: 2,
            ..SyntheticSpec::default()
        };
        let corpus = generate_corpus(&spec).unwrap();
        let options = SelectorOptions {
            range: CandidateRange::new(2, 3).unwrap(),
            ..SelectorOptions::default()
        };

        let mut outcomes = Vec::new();
        for label in corpus.labels() {
            let ctx = SelectorContext::new(&corpus, label, &options).unwrap();
            outcomes.push(LabelOutcome {
                label: label.to_string(),
                selection: BicSelector::new(ctx).select(),
            });
        }

        let summary = format_run_summary(&outcomes, Policy::Bic, &options);
        for label in corpus.labels() {
            assert!(summary.contains(label), "missing {label} in:\n{summary}");
        }
        assert!(summary.contains("of 2 word(s) modeled"));
    }

    #[test]
    fn unmodelable_words_are_marked() {
        let outcomes = vec![LabelOutcome {
            label: "ghost".to_string(),
            selection: None,
        }];
        let summary = format_run_summary(&outcomes, Policy::Cv, &SelectorOptions::default());
        assert!(summary.contains("unmodelable"));
        assert!(summary.contains("0 of 1 word(s) modeled"));
    }
}
