use super::{Chain, ChainedVariant, search::ChainSearch};
use crate::{
    cli::AnalysisArgs,
    core::{
        breakend::{BreakendId, BreakendSide, VariantId},
        jcn::Replication,
        links::{ClusterLinks, LinkId},
        variant::{BreakendLookup, Variant},
    },
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

type Instance = (VariantId, usize);
type Slot = (VariantId, usize, BreakendSide);

/// Joined slots and per-link application counts of one candidate chaining.
#[derive(Debug, Clone, Default)]
pub(super) struct ChainState {
    joins: BTreeMap<Slot, (LinkId, Slot)>,
    usage: BTreeMap<LinkId, usize>,
}

impl ChainState {
    fn is_joined(&self, slot: Slot) -> bool {
        self.joins.contains_key(&slot)
    }

    fn join(&mut self, link: LinkId, a: Slot, b: Slot) {
        self.joins.insert(a, (link, b));
        self.joins.insert(b, (link, a));
        *self.usage.entry(link).or_default() += 1;
    }

    fn usage(&self, link: LinkId) -> usize {
        self.usage.get(&link).copied().unwrap_or(0)
    }
}

/// Completion score; see [`ChainScore::cmp_quality`] for the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChainScore {
    pub assembled_links: usize,
    pub open_breakends: usize,
    pub replications: usize,
    pub jcn_inconsistency: f64,
}

impl ChainScore {
    /// `Greater` means `self` is the better completion: more assembled links, then fewer
    /// open breakends, then fewer replications, then more consistent JCN.
    pub fn cmp_quality(&self, other: &ChainScore) -> Ordering {
        self.assembled_links
            .cmp(&other.assembled_links)
            .then_with(|| other.open_breakends.cmp(&self.open_breakends))
            .then_with(|| other.replications.cmp(&self.replications))
            .then_with(|| other.jcn_inconsistency.total_cmp(&self.jcn_inconsistency))
    }
}

#[derive(Debug, Clone)]
pub struct ChainResult {
    pub chains: Vec<Chain>,
    pub score: ChainScore,
    pub replicated: bool,
}

/// Read-only inputs shared by every candidate chaining of one cluster.
pub(super) struct ChainContext<'a> {
    pub(super) variants: &'a [Variant],
    pub(super) members: &'a [VariantId],
    pub(super) links: &'a ClusterLinks,
    pub(super) replication: &'a Replication,
}

impl ChainContext<'_> {
    fn sides(&self, variant: VariantId) -> &'static [BreakendSide] {
        if self.variants[variant].is_single_breakend() {
            &[BreakendSide::Start]
        } else {
            &[BreakendSide::Start, BreakendSide::End]
        }
    }

    fn other_slot(&self, (variant, copy, side): Slot) -> Option<Slot> {
        (!self.variants[variant].is_single_breakend()).then_some((variant, copy, side.other()))
    }

    fn is_untouched(&self, state: &ChainState, (variant, copy): Instance) -> bool {
        self.sides(variant)
            .iter()
            .all(|side| !state.is_joined((variant, copy, *side)))
    }

    fn capacity(&self, link: LinkId) -> usize {
        let link = self.links.get(link);
        if link.is_self_link() {
            1
        } else {
            self.replication
                .count(link.lower.variant)
                .min(self.replication.count(link.upper.variant))
        }
    }

    /// Copies whose slot for `be` is free: chain ends first, then the first unused copy.
    fn candidate_copies(&self, state: &ChainState, be: BreakendId) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut fresh = None;
        for copy in 0..self.replication.count(be.variant) {
            let slot = (be.variant, copy, be.side);
            if state.is_joined(slot) {
                continue;
            }
            match self.other_slot(slot) {
                Some(other) if state.is_joined(other) => ends.push(copy),
                _ => {
                    if fresh.is_none() {
                        fresh = Some(copy);
                    }
                }
            }
        }
        ends.extend(fresh);
        ends
    }

    /// Instances on the path that leaves `start` through the slot opposite `free_side`.
    fn path_from(&self, state: &ChainState, start: Instance, free_side: BreakendSide) -> Vec<Instance> {
        let mut path = vec![start];
        let mut current = (start.0, start.1, free_side);
        while let Some(out) = self.other_slot(current) {
            match state.joins.get(&out) {
                Some((_, next)) if (next.0, next.1) != start => {
                    path.push((next.0, next.1));
                    current = *next;
                }
                _ => break,
            }
        }
        path
    }

    /// Closing a loop is refused while a higher-JCN variant linked to it still has free
    /// slots, since the loop would strand that material.
    fn strands_higher_jcn(&self, state: &ChainState, loop_instances: &[Instance]) -> bool {
        let in_loop: BTreeSet<VariantId> = loop_instances.iter().map(|i| i.0).collect();
        let loop_jcn = in_loop
            .iter()
            .map(|v| self.variants[*v].jcn.estimate)
            .fold(0.0, f64::max);
        self.links.all_templated_insertions().any(|link| {
            let (a, b) = (link.lower.variant, link.upper.variant);
            let outside = match (in_loop.contains(&a), in_loop.contains(&b)) {
                (true, false) => b,
                (false, true) => a,
                _ => return false,
            };
            self.variants[outside].jcn.estimate > loop_jcn && self.has_free_slot(state, outside)
        })
    }

    fn has_free_slot(&self, state: &ChainState, variant: VariantId) -> bool {
        (0..self.replication.count(variant)).any(|copy| {
            self.sides(variant)
                .iter()
                .any(|side| !state.is_joined((variant, copy, *side)))
        })
    }

    /// Applies `link` once if a valid placement exists.
    ///
    /// Repeat applications must extend an existing chain end.
    pub(super) fn try_apply(&self, state: &mut ChainState, link_id: LinkId) -> bool {
        let used = state.usage(link_id);
        if used >= self.capacity(link_id) {
            return false;
        }
        let link = self.links.get(link_id);
        let (a, b) = (link.lower, link.upper);

        if link.is_self_link() {
            let variant = a.variant;
            let Some(copy) = (0..self.replication.count(variant))
                .find(|c| self.is_untouched(state, (variant, *c)))
            else {
                return false;
            };
            if self.strands_higher_jcn(state, &[(variant, copy)]) {
                log::trace!("Self link {link} would strand higher-JCN material");
                return false;
            }
            state.join(link_id, (variant, copy, a.side), (variant, copy, b.side));
            return true;
        }

        for copy_a in self.candidate_copies(state, a) {
            for copy_b in self.candidate_copies(state, b) {
                let slot_a = (a.variant, copy_a, a.side);
                let slot_b = (b.variant, copy_b, b.side);
                let extends = [slot_a, slot_b]
                    .into_iter()
                    .any(|s| self.other_slot(s).is_some_and(|o| state.is_joined(o)));
                if used > 0 && !extends {
                    continue;
                }
                let path = self.path_from(state, (a.variant, copy_a), a.side);
                let closes = path.last() == Some(&(b.variant, copy_b));
                if closes && self.strands_higher_jcn(state, &path) {
                    log::trace!("Rejected loop closure by {link}: strands higher-JCN variant");
                    continue;
                }
                state.join(link_id, slot_a, slot_b);
                return true;
            }
        }
        false
    }

    pub(super) fn apply_all(&self, state: &mut ChainState, link: LinkId) -> usize {
        let mut applied = 0;
        while self.try_apply(state, link) {
            applied += 1;
        }
        applied
    }

    pub(super) fn score(&self, state: &ChainState) -> ChainScore {
        let mut score = ChainScore::default();
        for (&link_id, &times) in &state.usage {
            let link = self.links.get(link_id);
            if link.is_assembled() {
                score.assembled_links += times;
            }
            let (ja, jb) = (
                self.variants.breakend(link.lower).jcn(),
                self.variants.breakend(link.upper).jcn(),
            );
            let gap = (ja.min - jb.max).max(jb.min - ja.max).max(0.0);
            score.jcn_inconsistency += gap * times as f64;
        }
        for &variant in self.members {
            let mut used_copies = 0usize;
            for copy in 0..self.replication.count(variant) {
                if self.is_untouched(state, (variant, copy)) {
                    continue;
                }
                used_copies += 1;
                score.open_breakends += self
                    .sides(variant)
                    .iter()
                    .filter(|side| !state.is_joined((variant, copy, **side)))
                    .count();
            }
            if used_copies == 0 {
                score.open_breakends += self.sides(variant).len();
            }
            score.replications += used_copies.saturating_sub(1);
        }
        score
    }

    /// Walks the slot graph into chains: open paths, then loops, then unlinked variants.
    pub(super) fn assemble(&self, state: &ChainState) -> Vec<Chain> {
        let mut chains = Vec::new();
        let mut visited: BTreeSet<Instance> = BTreeSet::new();

        for &variant in self.members {
            for copy in 0..self.replication.count(variant) {
                let instance = (variant, copy);
                if visited.contains(&instance) || self.is_untouched(state, instance) {
                    continue;
                }
                let free_side = if self.variants[variant].is_single_breakend() {
                    Some(BreakendSide::Start)
                } else {
                    self.sides(variant)
                        .iter()
                        .copied()
                        .find(|side| !state.is_joined((variant, copy, *side)))
                };
                if let Some(entry) = free_side {
                    chains.push(self.walk(state, instance, entry, false, &mut visited));
                }
            }
        }

        for &variant in self.members {
            for copy in 0..self.replication.count(variant) {
                let instance = (variant, copy);
                if !visited.contains(&instance) && !self.is_untouched(state, instance) {
                    chains.push(self.walk(state, instance, BreakendSide::Start, true, &mut visited));
                }
            }
        }

        for &variant in self.members {
            if !visited.iter().any(|(v, _)| *v == variant) {
                chains.push(Chain::singleton(0, &self.variants[variant]));
            }
        }

        for (id, chain) in chains.iter_mut().enumerate() {
            chain.renumber(id);
        }
        chains
    }

    fn walk(
        &self,
        state: &ChainState,
        start: Instance,
        entry: BreakendSide,
        closed: bool,
        visited: &mut BTreeSet<Instance>,
    ) -> Chain {
        let mut elements = Vec::new();
        let mut links = Vec::new();
        let (mut current, mut entry) = (start, entry);
        loop {
            let single = self.variants[current.0].is_single_breakend();
            let exit = if single { entry } else { entry.other() };
            elements.push(ChainedVariant {
                variant: current.0,
                copy: current.1,
                entry,
                exit,
            });
            visited.insert(current);

            // a single breakend only continues when it starts the walk
            if single && elements.len() > 1 {
                break;
            }
            let Some(&(link, next)) = state.joins.get(&(current.0, current.1, exit)) else {
                break;
            };
            links.push(link);
            let next_instance = (next.0, next.1);
            if next_instance == start || visited.contains(&next_instance) {
                break;
            }
            current = next_instance;
            entry = next.2;
        }
        Chain::new(0, elements, links, closed)
    }
}

/// Assembles a cluster's templated insertions into chains.
///
/// Clusters up to `max_chaining_cluster_size` variants get a bounded backtracking search
/// over which contested links to apply; larger clusters take one greedy pass in
/// chaining order.
pub fn build_chains(
    variants: &[Variant],
    members: &[VariantId],
    links: &ClusterLinks,
    replication: &Replication,
    args: &AnalysisArgs,
) -> ChainResult {
    let context = ChainContext {
        variants,
        members,
        links,
        replication,
    };
    let order = links.chaining_order();

    let state = if members.len() <= args.max_chaining_cluster_size {
        ChainSearch::new(&context, order, args.chain_search_budget).run()
    } else {
        log::debug!(
            "Cluster of {} variants exceeds search ceiling, chaining greedily",
            members.len()
        );
        let mut state = ChainState::default();
        for link in order {
            context.apply_all(&mut state, link);
        }
        state
    };

    let score = context.score(&state);
    let chains = context.assemble(&state);
    let replicated = chains.iter().any(|c| c.replicated_elements() > 0);
    for chain in &chains {
        log::trace!("{chain}");
    }
    ChainResult {
        chains,
        score,
        replicated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        breakend_index::BreakendIndex,
        jcn::refine_breakend_jcn,
        variant::test_utils::{
            bnd, del, dup, inv, sgl_record, variants, with_assembly, with_jcn,
        },
        variant::VariantRecord,
    };

    fn chain(records: &[VariantRecord], args: &AnalysisArgs) -> (Vec<Variant>, ClusterLinks, ChainResult) {
        let mut vs = variants(records);
        let members: Vec<_> = (0..vs.len()).collect();
        refine_breakend_jcn(&mut vs, &members).unwrap();
        let index = BreakendIndex::for_variants(&vs, &members);
        let links = ClusterLinks::find(&vs, &index);
        let replication = Replication::compute(&vs, &members);
        let result = build_chains(&vs, &members, &links, &replication, args);
        (vs, links, result)
    }

    fn stranding_records() -> Vec<VariantRecord> {
        vec![
            with_assembly(bnd("v1", ("1", 1_000, -1), ("2", 5_100, 1)), &["a1", "a3"], &["a2"]),
            with_assembly(bnd("v2", ("2", 5_000, -1), ("1", 1_100, 1)), &["a2"], &["a1"]),
            with_assembly(
                with_jcn(bnd("w", ("1", 1_200, 1), ("3", 100, -1)), 3.0, 0.25),
                &["a3"],
                &[],
            ),
        ]
    }

    #[test]
    fn test_reciprocal_translocation_closes() {
        let (_, links, result) = chain(
            &[
                with_assembly(bnd("v1", ("1", 1_000, -1), ("2", 5_100, 1)), &["x"], &["y"]),
                with_assembly(bnd("v2", ("2", 5_000, -1), ("1", 1_100, 1)), &["y"], &["x"]),
            ],
            &AnalysisArgs::default(),
        );
        assert_eq!(links.len(), 2);
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert!(chain.is_closed());
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.links.len(), 2);
        assert!(chain.open_breakends().is_empty());
        assert_eq!(result.score.assembled_links, 2);
        assert_eq!(result.score.open_breakends, 0);
    }

    #[test]
    fn test_duplication_self_loop() {
        let (_, _, result) = chain(
            &[with_jcn(dup("d", "1", 50_000, 55_000), 10.0, 2.0), del("x", "1", 500, 600)],
            &AnalysisArgs::default(),
        );
        assert_eq!(result.chains.len(), 2);
        let closed: Vec<_> = result.chains.iter().filter(|c| c.is_closed()).collect();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].elements.len(), 1);
        assert_eq!(closed[0].elements[0].variant, 0);
        assert!(closed[0].closing_link().is_some());
        assert!(!result.replicated);
    }

    #[test]
    fn test_open_chain_through_templated_insertion() {
        let (_, _, result) = chain(
            &[inv("a", "1", 100, 300, 1), inv("b", "1", 200, 400, -1)],
            &AnalysisArgs::default(),
        );
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert!(!chain.is_closed());
        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain.open_breakends(),
            vec![BreakendId::start(0), BreakendId::end(1)]
        );
    }

    #[test]
    fn test_unlinked_variants_are_singletons() {
        let (vs, _, result) = chain(
            &[
                inv("a", "1", 100, 200, 1),
                inv("b", "1", 300, 400, -1),
                sgl_record("s", ("1", 5_000, -1), 1.0),
            ],
            &AnalysisArgs::default(),
        );
        assert_eq!(result.chains.len(), 3);
        for variant in &vs {
            assert!(result.chains.iter().any(|c| c.contains_variant(variant.index)));
        }
        let sgl = result.chains.iter().find(|c| c.contains_variant(2)).unwrap();
        assert_eq!(sgl.open_breakends(), vec![BreakendId::start(2)]);
    }

    #[test]
    fn test_greedy_rejects_stranding_closure() {
        let args = AnalysisArgs::default().with(|a| a.max_chaining_cluster_size = 2);
        let (_, links, result) = chain(&stranding_records(), &args);
        assert_eq!(links.len(), 3);
        assert!(result.chains.iter().all(|c| !c.is_closed()));
        assert_eq!(result.chains.len(), 2);
        assert_eq!(result.score.assembled_links, 1);
    }

    #[test]
    fn test_search_prefers_fewer_open_breakends() {
        let (_, _, result) = chain(&stranding_records(), &AnalysisArgs::default());
        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.open_breakends(),
            vec![BreakendId::end(1), BreakendId::end(2)]
        );
        assert_eq!(result.score.assembled_links, 2);
        assert_eq!(result.score.open_breakends, 2);
    }

    #[test]
    fn test_score_ordering() {
        let base = ChainScore {
            assembled_links: 1,
            open_breakends: 2,
            replications: 0,
            jcn_inconsistency: 0.0,
        };
        let more_assembled = ChainScore {
            assembled_links: 2,
            open_breakends: 4,
            ..base
        };
        let fewer_open = ChainScore {
            open_breakends: 0,
            replications: 3,
            ..base
        };
        assert_eq!(more_assembled.cmp_quality(&base), Ordering::Greater);
        assert_eq!(fewer_open.cmp_quality(&base), Ordering::Greater);
        assert_eq!(
            ChainScore {
                jcn_inconsistency: 1.0,
                ..base
            }
            .cmp_quality(&base),
            Ordering::Less
        );
    }

    #[test]
    fn test_shared_breakend_is_replicated() {
        // two assembled insertions leave the same breakend of a JCN 2 variant
        let (_, links, result) = chain(
            &[
                with_assembly(
                    with_jcn(bnd("a", ("1", 1_000, -1), ("4", 100, 1)), 2.0, 0.25),
                    &["x", "y"],
                    &[],
                ),
                with_assembly(bnd("b", ("1", 1_100, 1), ("5", 100, -1)), &["x"], &[]),
                with_assembly(bnd("c", ("1", 1_300, 1), ("6", 100, -1)), &["y"], &[]),
            ],
            &AnalysisArgs::default(),
        );
        assert_eq!(links.len(), 2);
        assert_eq!(result.score.assembled_links, 2);
        assert_eq!(result.score.replications, 1);
        assert!(result.replicated);
        assert_eq!(result.chains.len(), 2);
        assert!(result.chains.iter().all(|c| c.len() == 2 && c.elements[0].variant == 0));
        assert_eq!(result.chains[1].elements[0].copy, 1);
    }
}
