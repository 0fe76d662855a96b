use crate::{
    cli::AnalysisArgs,
    core::{
        breakend::{BreakendId, VariantId},
        breakend_index::BreakendIndex,
        containers::forest::Forest,
        loh::{LohEdge, LohSegments},
        variant::{BreakendLookup, Variant},
    },
};
use std::collections::HashMap;

/// The fixed set of reasons two variants end up in one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Same-arm breakends within the proximity distance.
    Proximity,
    /// Breakends sharing an assembly id.
    Assembly,
    /// Breakends bounding the same LOH segment.
    LohBoundary,
}

const MERGE_RULES: [MergeRule; 3] = [
    MergeRule::Proximity,
    MergeRule::Assembly,
    MergeRule::LohBoundary,
];

/// Partitions a sample's variants into clusters.
pub struct ProximityClusterer<'a> {
    variants: &'a [Variant],
    index: &'a BreakendIndex,
    loh: &'a LohSegments,
    args: &'a AnalysisArgs,
    forest: Forest,
}

impl<'a> ProximityClusterer<'a> {
    pub fn new(
        variants: &'a [Variant],
        index: &'a BreakendIndex,
        loh: &'a LohSegments,
        args: &'a AnalysisArgs,
    ) -> Self {
        // Equivalent (alignment-ambiguous) calls never merge with anything
        let locked = variants.iter().map(|v| v.is_equivalent).collect();
        Self {
            variants,
            index,
            loh,
            args,
            forest: Forest::with_locked(locked),
        }
    }

    /// Applies every merge rule until a full pass merges nothing.
    pub fn run(mut self) -> Vec<Vec<VariantId>> {
        let mut passes = 0;
        loop {
            passes += 1;
            let merged: usize = MERGE_RULES.iter().map(|rule| self.apply(*rule)).sum();
            log::trace!("Clustering pass {passes}: {merged} merges");
            if merged == 0 {
                break;
            }
        }
        let groups = self.forest.groups();
        log::debug!(
            "Clustered {} variants into {} clusters in {} passes",
            self.variants.len(),
            groups.len(),
            passes
        );
        groups
    }

    fn apply(&mut self, rule: MergeRule) -> usize {
        match rule {
            MergeRule::Proximity => self.merge_proximate(),
            MergeRule::Assembly => self.merge_assembled(),
            MergeRule::LohBoundary => self.merge_loh_bounded(),
        }
    }

    fn union(&mut self, a: VariantId, b: VariantId, rule: MergeRule) -> bool {
        let merged = self.forest.try_union(a, b);
        if merged {
            log::trace!(
                "Merged {} and {} by {:?}",
                self.variants[a].id,
                self.variants[b].id,
                rule
            );
        }
        merged
    }

    fn merge_proximate(&mut self) -> usize {
        let mut merged = 0;
        let (variants, index) = (self.variants, self.index);
        for (_, ordered) in index.chromosomes() {
            for (i, &a) in ordered.iter().enumerate() {
                let be_a = variants.breakend(a);
                for &b in &ordered[i + 1..] {
                    let be_b = variants.breakend(b);
                    if be_b.position - be_a.position > self.args.proximity_distance {
                        break;
                    }
                    if self.proximity_eligible(a, b) && self.union(a.variant, b.variant, MergeRule::Proximity) {
                        merged += 1;
                    }
                }
            }
        }
        merged
    }

    fn proximity_eligible(&self, a: BreakendId, b: BreakendId) -> bool {
        if a.variant == b.variant {
            return false;
        }
        if self.variants.breakend(a).arm != self.variants.breakend(b).arm {
            return false;
        }
        let (va, vb) = (&self.variants[a.variant], &self.variants[b.variant]);
        !(va.is_deletion() && vb.is_deletion() && spans_overlap(va, vb))
    }

    fn merge_assembled(&mut self) -> usize {
        let mut by_assembly: HashMap<&str, Vec<VariantId>> = HashMap::new();
        let variants = self.variants;
        for variant in variants {
            for be in variant.breakends() {
                for asm in &be.assembly_ids {
                    by_assembly.entry(asm.as_str()).or_default().push(variant.index);
                }
            }
        }
        let mut groups: Vec<Vec<VariantId>> = by_assembly.into_values().collect();
        groups.sort_unstable();

        let mut merged = 0;
        for group in groups {
            for pair in group.windows(2) {
                if self.union(pair[0], pair[1], MergeRule::Assembly) {
                    merged += 1;
                }
            }
        }
        merged
    }

    fn merge_loh_bounded(&mut self) -> usize {
        if self.loh.is_empty() {
            return 0;
        }
        let tolerance = self.args.loh_boundary_tolerance;
        let mut at_start: HashMap<usize, Vec<VariantId>> = HashMap::new();
        let mut at_end: HashMap<usize, Vec<VariantId>> = HashMap::new();
        let variants = self.variants;
        for variant in variants {
            for be in variant.breakends() {
                for edge in self.loh.edges_near(&be.chromosome, be.position, tolerance) {
                    let bucket = match edge {
                        LohEdge::Start(seg) => at_start.entry(seg),
                        LohEdge::End(seg) => at_end.entry(seg),
                    };
                    bucket.or_default().push(variant.index);
                }
            }
        }

        let mut segments: Vec<_> = at_start.keys().copied().collect();
        segments.sort_unstable();
        let mut merged = 0;
        for segment in segments {
            let (Some(starts), Some(ends)) = (at_start.get(&segment), at_end.get(&segment)) else {
                continue;
            };
            for &a in starts {
                for &b in ends {
                    if a != b && self.union(a, b, MergeRule::LohBoundary) {
                        merged += 1;
                    }
                }
            }
        }
        merged
    }
}

fn spans_overlap(a: &Variant, b: &Variant) -> bool {
    match (a.span(), b.span()) {
        (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => {
            a.start().chromosome == b.start().chromosome && a_lo <= b_hi && b_lo <= a_hi
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        loh::LohSegment,
        variant::test_utils::{bnd, del, dup, inv, variants, with_assembly},
    };
    use crate::utils::util::init_logger;

    fn cluster(records: &[crate::core::variant::VariantRecord], args: &AnalysisArgs, loh: &LohSegments) -> Vec<Vec<VariantId>> {
        init_logger();
        let vs = variants(records);
        let index = BreakendIndex::build(&vs);
        ProximityClusterer::new(&vs, &index, loh, args).run()
    }

    #[test]
    fn test_nearby_variants_merge() {
        let groups = cluster(
            &[inv("a", "1", 100, 200, 1), inv("b", "1", 300, 400, -1), dup("c", "1", 50_000, 51_000)],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_merge_is_transitive_through_chains() {
        let args = AnalysisArgs::default().with(|a| a.proximity_distance = 1_000);
        let groups = cluster(
            &[dup("a", "1", 1_000, 1_500), dup("b", "1", 2_400, 3_000), dup("c", "1", 3_900, 4_500)],
            &args,
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_overlapping_deletions_do_not_merge() {
        let groups = cluster(
            &[del("a", "1", 1_000, 5_000), del("b", "1", 2_000, 3_000)],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_adjacent_deletions_merge() {
        let groups = cluster(
            &[del("a", "1", 1_000, 2_000), del("b", "1", 2_500, 3_000)],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0, 1]]);
    }

    #[test]
    fn test_equivalent_breakends_stay_single() {
        let mut dup_call = del("b", "1", 1_000, 2_000);
        dup_call.is_equivalent = true;
        let groups = cluster(
            &[del("a", "1", 1_000, 2_000), dup_call, dup("c", "1", 1_500, 2_500)],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_arms_separate_proximity() {
        // chromosome 1 centromere at 121,535,434
        let groups = cluster(
            &[dup("a", "1", 121_533_000, 121_534_000), dup("b", "1", 121_536_000, 121_537_000)],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_assembly_merges_distant_breakends() {
        let groups = cluster(
            &[
                with_assembly(bnd("a", ("1", 1_000, -1), ("2", 5_100, 1)), &["asm1"], &["asm2"]),
                with_assembly(bnd("b", ("2", 90_000, -1), ("1", 901_100, 1)), &["asm3"], &["asm1"]),
                del("c", "3", 100, 200),
            ],
            &AnalysisArgs::default(),
            &LohSegments::default(),
        );
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_loh_boundary_merges() {
        let loh = LohSegments::new(vec![LohSegment {
            chromosome: "4".to_string(),
            start: 1_000_000,
            end: 9_000_000,
        }]);
        let groups = cluster(
            &[
                bnd("a", ("4", 1_000_004, -1), ("7", 100, 1)),
                bnd("b", ("4", 8_999_998, 1), ("9", 100, 1)),
            ],
            &AnalysisArgs::default(),
            &loh,
        );
        assert_eq!(groups, vec![vec![0, 1]]);
    }
}
