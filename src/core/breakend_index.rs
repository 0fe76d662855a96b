use crate::core::{
    breakend::{BreakendId, VariantId},
    variant::{BreakendLookup, Variant},
};
use itertools::Either;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Position-ordered breakends per chromosome.
///
/// Ties on position put `+1` breakends before `-1` breakends, so a pair meeting at one
/// base reads as a zero-length deletion bridge.
#[derive(Debug, Default, Clone)]
pub struct BreakendIndex {
    by_chromosome: BTreeMap<String, Vec<BreakendId>>,
    rank: HashMap<BreakendId, usize>,
}

impl BreakendIndex {
    /// Indexes every breakend of every variant.
    pub fn build(variants: &[Variant]) -> Self {
        Self::from_ids(variants, variants.iter().map(|v| v.index))
    }

    /// Indexes the breakends of a subset of variants, e.g. one cluster.
    pub fn for_variants(variants: &[Variant], members: &[VariantId]) -> Self {
        Self::from_ids(variants, members.iter().copied())
    }

    fn from_ids(variants: &[Variant], members: impl Iterator<Item = VariantId>) -> Self {
        let mut by_chromosome: BTreeMap<String, Vec<BreakendId>> = BTreeMap::new();
        for vid in members {
            for be in variants[vid].breakends() {
                by_chromosome
                    .entry(be.chromosome.clone())
                    .or_default()
                    .push(be.id);
            }
        }

        let mut rank = HashMap::new();
        for ids in by_chromosome.values_mut() {
            ids.sort_by_key(|id| {
                let be = variants.breakend(*id);
                (be.position, be.orientation, id.variant, id.side)
            });
            rank.extend(ids.iter().enumerate().map(|(i, id)| (*id, i)));
        }
        log::trace!(
            "Indexed {} breakends on {} chromosomes",
            rank.len(),
            by_chromosome.len()
        );

        Self {
            by_chromosome,
            rank,
        }
    }

    pub fn len(&self) -> usize {
        self.rank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rank.is_empty()
    }

    pub fn contains(&self, id: BreakendId) -> bool {
        self.rank.contains_key(&id)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = (&str, &[BreakendId])> {
        self.by_chromosome
            .iter()
            .map(|(chromosome, ids)| (chromosome.as_str(), ids.as_slice()))
    }

    pub fn on_chromosome(&self, chromosome: &str) -> &[BreakendId] {
        self.by_chromosome
            .get(chromosome)
            .map_or(&[], |ids| ids.as_slice())
    }

    pub fn rank(&self, id: BreakendId) -> Option<usize> {
        self.rank.get(&id).copied()
    }

    fn ordered_for(&self, variants: &[Variant], id: BreakendId) -> Option<(&[BreakendId], usize)> {
        let rank = self.rank(id)?;
        Some((self.on_chromosome(&variants.breakend(id).chromosome), rank))
    }

    /// Breakends after `id` in `direction`, nearest first.
    pub fn walk<'a>(
        &'a self,
        variants: &[Variant],
        id: BreakendId,
        direction: Direction,
    ) -> impl Iterator<Item = BreakendId> + 'a {
        let (ordered, rank) = self.ordered_for(variants, id).unwrap_or((&[], 0));
        match direction {
            Direction::Up => Either::Left(ordered.iter().skip(rank + 1).copied()),
            Direction::Down => Either::Right(ordered[..rank.min(ordered.len())].iter().rev().copied()),
        }
    }

    pub fn neighbour(
        &self,
        variants: &[Variant],
        id: BreakendId,
        direction: Direction,
    ) -> Option<BreakendId> {
        self.walk(variants, id, direction).next()
    }

    /// True when `a` and `b` sit next to each other with nothing in between.
    pub fn are_adjacent(&self, variants: &[Variant], a: BreakendId, b: BreakendId) -> bool {
        let same_chromosome = variants.breakend(a).chromosome == variants.breakend(b).chromosome;
        match (self.rank(a), self.rank(b)) {
            (Some(ra), Some(rb)) => same_chromosome && ra.abs_diff(rb) == 1,
            _ => false,
        }
    }

    /// Breakends strictly between `a` and `b` on their shared chromosome.
    pub fn between(&self, variants: &[Variant], a: BreakendId, b: BreakendId) -> &[BreakendId] {
        match (self.ordered_for(variants, a), self.rank(b)) {
            (Some((ordered, ra)), Some(rb))
                if variants.breakend(a).chromosome == variants.breakend(b).chromosome =>
            {
                let (lo, hi) = (ra.min(rb), ra.max(rb));
                if lo + 1 >= hi {
                    return &[];
                }
                &ordered[lo + 1..hi]
            }
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variant::test_utils::{bnd, del, inv, variants};

    #[test]
    fn test_index_orders_by_position_then_orientation() {
        let vs = variants(&[
            del("d1", "1", 500, 900),
            inv("i1", "1", 100, 500, -1),
            bnd("b1", ("2", 50, 1), ("1", 300, 1)),
        ]);
        let index = BreakendIndex::build(&vs);
        assert_eq!(index.len(), 6);
        assert_eq!(
            index.on_chromosome("1"),
            &[
                BreakendId::start(1),
                BreakendId::end(2),
                BreakendId::start(0),
                BreakendId::end(1),
                BreakendId::end(0),
            ]
        );
        assert_eq!(index.on_chromosome("2"), &[BreakendId::start(2)]);
        assert!(index.on_chromosome("3").is_empty());
    }

    #[test]
    fn test_walk_and_neighbours() {
        let vs = variants(&[del("d1", "1", 100, 200), del("d2", "1", 300, 400)]);
        let index = BreakendIndex::build(&vs);
        let up: Vec<_> = index.walk(&vs, BreakendId::end(0), Direction::Up).collect();
        assert_eq!(up, vec![BreakendId::start(1), BreakendId::end(1)]);
        let down: Vec<_> = index.walk(&vs, BreakendId::end(0), Direction::Down).collect();
        assert_eq!(down, vec![BreakendId::start(0)]);
        assert_eq!(index.neighbour(&vs, BreakendId::start(0), Direction::Down), None);
        assert!(index.are_adjacent(&vs, BreakendId::end(0), BreakendId::start(1)));
        assert!(!index.are_adjacent(&vs, BreakendId::start(0), BreakendId::start(1)));
        assert_eq!(
            index.between(&vs, BreakendId::end(1), BreakendId::start(0)),
            &[BreakendId::end(0), BreakendId::start(1)]
        );
        assert!(index.between(&vs, BreakendId::end(0), BreakendId::end(0)).is_empty());
        assert!(index.between(&vs, BreakendId::end(0), BreakendId::start(1)).is_empty());
    }

    #[test]
    fn test_cluster_scoped_index() {
        let vs = variants(&[
            del("d1", "1", 100, 200),
            del("d2", "1", 150, 160),
            del("d3", "1", 300, 400),
        ]);
        let index = BreakendIndex::for_variants(&vs, &[0, 2]);
        assert_eq!(index.len(), 4);
        assert!(!index.contains(BreakendId::start(1)));
        assert!(index.are_adjacent(&vs, BreakendId::end(0), BreakendId::start(2)));
    }
}
