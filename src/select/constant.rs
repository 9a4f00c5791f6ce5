//! Fixed-state-count policy.
//!
//! Ignores the data entirely and fits the configured constant, the
//! baseline the searching policies are measured against.

use crate::domain::{Direction, ScoreTable};
use crate::select::{Evaluation, Selection, Selector, SelectorContext};

pub struct ConstantSelector<'a> {
    ctx: SelectorContext<'a>,
}

impl<'a> ConstantSelector<'a> {
    pub fn new(ctx: SelectorContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Selector for ConstantSelector<'_> {
    fn context(&self) -> &SelectorContext<'_> {
        &self.ctx
    }

    /// No search, no score table.
    fn evaluate(&self) -> Evaluation {
        Evaluation {
            direction: Direction::Maximize,
            scores: ScoreTable::new(),
            skipped: Vec::new(),
        }
    }

    fn select(&self) -> Option<Selection> {
        let n_states = self.ctx.options.n_constant;
        let model = self.ctx.fitter().fit(n_states)?;
        Some(Selection {
            n_states,
            model,
            scores: ScoreTable::new(),
            skipped: Vec::new(),
        })
    }
}
