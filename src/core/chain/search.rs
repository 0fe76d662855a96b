use super::builder::{ChainContext, ChainScore, ChainState};
use crate::core::links::LinkId;
use std::cmp::Ordering;

/// Bounded backtracking over apply/skip decisions for contested links.
///
/// A link is contested when one of its breakends carries another templated insertion;
/// uncontested links are always applied. Once `budget` nodes have been visited the
/// remaining links are applied greedily.
pub(super) struct ChainSearch<'a, 'c> {
    context: &'a ChainContext<'c>,
    order: Vec<LinkId>,
    contested: Vec<bool>,
    budget: usize,
    visited: usize,
    best: Option<(ChainScore, ChainState)>,
}

impl<'a, 'c> ChainSearch<'a, 'c> {
    pub(super) fn new(context: &'a ChainContext<'c>, order: Vec<LinkId>, budget: usize) -> Self {
        let contested = order
            .iter()
            .map(|id| {
                context
                    .links
                    .get(*id)
                    .breakends()
                    .into_iter()
                    .any(|be| context.links.templated_insertions(be).count() > 1)
            })
            .collect();
        Self {
            context,
            order,
            contested,
            budget,
            visited: 0,
            best: None,
        }
    }

    pub(super) fn run(mut self) -> ChainState {
        self.explore(0, ChainState::default());
        log::trace!(
            "Chain search visited {} nodes over {} links",
            self.visited,
            self.order.len()
        );
        self.best.map(|(_, state)| state).unwrap_or_default()
    }

    fn explore(&mut self, position: usize, mut state: ChainState) {
        self.visited += 1;
        if self.visited > self.budget {
            for &link in &self.order[position.min(self.order.len())..] {
                self.context.apply_all(&mut state, link);
            }
            self.offer(state);
            return;
        }
        let Some(&link) = self.order.get(position) else {
            self.offer(state);
            return;
        };

        if !self.contested[position] {
            self.context.apply_all(&mut state, link);
            self.explore(position + 1, state);
            return;
        }

        let mut applied = state.clone();
        if self.context.apply_all(&mut applied, link) > 0 {
            self.explore(position + 1, applied);
        }
        self.explore(position + 1, state);
    }

    fn offer(&mut self, state: ChainState) {
        let score = self.context.score(&state);
        let better = match &self.best {
            None => true,
            Some((best, _)) => score.cmp_quality(best) == Ordering::Greater,
        };
        if better {
            self.best = Some((score, state));
        }
    }
}
