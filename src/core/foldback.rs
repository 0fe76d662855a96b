use crate::{
    cli::AnalysisArgs,
    constants::MAX_CHAINED_FOLDBACK_LINKS,
    core::{
        breakend::BreakendId,
        breakend_index::{BreakendIndex, Direction},
        links::ClusterLinks,
        variant::{BreakendLookup, Variant},
    },
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldbackKind {
    /// Both breakends belong to one inversion.
    Direct,
    /// The breakends belong to variants joined by short templated insertions.
    Chained,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Foldback {
    pub breakend: BreakendId,
    pub partner: BreakendId,
    pub length: i64,
    pub kind: FoldbackKind,
}

/// Foldback calls keyed by breakend; a partner may lack the reverse entry.
#[derive(Debug, Clone, Default)]
pub struct Foldbacks {
    by_breakend: BTreeMap<BreakendId, Foldback>,
}

impl Foldbacks {
    pub fn get(&self, be: BreakendId) -> Option<&Foldback> {
        self.by_breakend.get(&be)
    }

    pub fn contains(&self, be: BreakendId) -> bool {
        self.by_breakend.contains_key(&be)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Foldback> {
        self.by_breakend.values()
    }

    pub fn len(&self) -> usize {
        self.by_breakend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_breakend.is_empty()
    }

    /// Distinct unordered foldback pairs.
    pub fn pairs(&self) -> BTreeSet<(BreakendId, BreakendId)> {
        self.iter()
            .map(|fb| {
                if fb.breakend <= fb.partner {
                    (fb.breakend, fb.partner)
                } else {
                    (fb.partner, fb.breakend)
                }
            })
            .collect()
    }

    pub fn insert(&mut self, foldback: Foldback) {
        self.by_breakend.insert(foldback.breakend, foldback);
    }
}

pub struct FoldbackFinder<'a> {
    variants: &'a [Variant],
    index: &'a BreakendIndex,
    links: &'a ClusterLinks,
    args: &'a AnalysisArgs,
}

impl<'a> FoldbackFinder<'a> {
    pub fn new(
        variants: &'a [Variant],
        index: &'a BreakendIndex,
        links: &'a ClusterLinks,
        args: &'a AnalysisArgs,
    ) -> Self {
        Self {
            variants,
            index,
            links,
            args,
        }
    }

    pub fn find(&self) -> Foldbacks {
        let mut foldbacks = Foldbacks::default();
        for (_, ordered) in self.index.chromosomes() {
            for &be in ordered {
                if let Some(foldback) = self.foldback_at(be) {
                    log::trace!(
                        "Foldback {} <-> {} length {} ({:?})",
                        foldback.breakend,
                        foldback.partner,
                        foldback.length,
                        foldback.kind
                    );
                    foldbacks.insert(foldback);
                }
            }
        }
        foldbacks
    }

    fn foldback_at(&self, be: BreakendId) -> Option<Foldback> {
        let position = self.variants.breakend(be).position;
        let (partner, direction) = [Direction::Up, Direction::Down]
            .into_iter()
            .filter_map(|dir| self.facing_candidate(be, dir).map(|c| (c, dir)))
            .min_by_key(|(c, _)| (self.variants.breakend(*c).position - position).abs())?;

        let length = (self.variants.breakend(partner).position - position).abs();
        let kind = if partner.variant == be.variant {
            FoldbackKind::Direct
        } else {
            self.chained_span(be, partner)?;
            FoldbackKind::Chained
        };

        if self.bounded_away(be, direction) || self.bounded_away(partner, direction.reverse()) {
            log::trace!("Foldback at {be} invalidated by a bounding deletion bridge");
            return None;
        }
        Some(Foldback {
            breakend: be,
            partner,
            length,
            kind,
        })
    }

    /// Nearest breakend facing the same way, stepping over deletion-bridged breakends.
    fn facing_candidate(&self, be: BreakendId, direction: Direction) -> Option<BreakendId> {
        let orientation = self.variants.breakend(be).orientation;
        for other in self.index.walk(self.variants, be, direction) {
            if self.variants.breakend(other).orientation == orientation {
                return Some(other);
            }
            if self.links.deletion_bridge(other).is_none() {
                return None;
            }
        }
        None
    }

    /// True if `be` has a deletion bridge on the side facing away from a fold in `toward`.
    fn bounded_away(&self, be: BreakendId, toward: Direction) -> bool {
        let Some(db) = self.links.deletion_bridge(be) else {
            return false;
        };
        let Some(other) = db.other(be) else {
            return false;
        };
        let (Some(rank), Some(other_rank)) = (self.index.rank(be), self.index.rank(other)) else {
            return false;
        };
        let db_direction = if other_rank > rank {
            Direction::Up
        } else {
            Direction::Down
        };
        db_direction == toward.reverse()
    }

    /// Total templated-insertion length joining the far ends of two variants, if short enough.
    fn chained_span(&self, be: BreakendId, partner: BreakendId) -> Option<i64> {
        let target = partner.other();
        if self.variants[be.variant].is_single_breakend()
            || self.variants[partner.variant].is_single_breakend()
        {
            return None;
        }
        let max_length = self.args.chained_foldback_max_length;
        let mut frontier = vec![(be.other(), 0i64)];
        for _ in 0..MAX_CHAINED_FOLDBACK_LINKS {
            let mut next = Vec::new();
            for (at, total) in frontier {
                for ti in self.links.templated_insertions(at) {
                    if ti.is_self_link() {
                        continue;
                    }
                    let Some(reached) = ti.other(at) else {
                        continue;
                    };
                    let total = total + ti.length;
                    if total > max_length {
                        continue;
                    }
                    if reached == target {
                        return Some(total);
                    }
                    let via = &self.variants[reached.variant];
                    if reached.variant != be.variant
                        && reached.variant != partner.variant
                        && !via.is_single_breakend()
                    {
                        next.push((reached.other(), total));
                    }
                }
            }
            frontier = next;
        }
        None
    }
}
