use crate::{
    cli::AnalysisArgs,
    core::{
        breakend::VariantId,
        chain::{Chain, ChainId},
        foldback::Foldbacks,
        links::ClusterLinks,
        svtype::SvType,
        variant::{BreakendLookup, Variant},
    },
};
use std::collections::BTreeSet;

/// A confirmed circular amplicon.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleMinute {
    pub chain: ChainId,
    pub variants: Vec<VariantId>,
    pub jcn: f64,
    pub open_breakend_ratio: f64,
    pub int_ext_ratio: f64,
}

/// Segment amplified by one link of the loop.
struct LoopSegment<'a> {
    chromosome: &'a str,
    start: i64,
    end: i64,
}

impl LoopSegment<'_> {
    fn contains(&self, chromosome: &str, position: i64) -> bool {
        self.chromosome == chromosome && self.start <= position && position <= self.end
    }
}

pub struct DoubleMinuteFinder<'a> {
    variants: &'a [Variant],
    members: &'a [VariantId],
    links: &'a ClusterLinks,
    foldbacks: &'a Foldbacks,
    args: &'a AnalysisArgs,
}

impl<'a> DoubleMinuteFinder<'a> {
    pub fn new(
        variants: &'a [Variant],
        members: &'a [VariantId],
        links: &'a ClusterLinks,
        foldbacks: &'a Foldbacks,
        args: &'a AnalysisArgs,
    ) -> Self {
        Self {
            variants,
            members,
            links,
            foldbacks,
            args,
        }
    }

    /// High-JCN variants whose JCN also stands out from the flanking copy number.
    fn candidates(&self) -> BTreeSet<VariantId> {
        self.members
            .iter()
            .copied()
            .filter(|v| {
                let variant = &self.variants[*v];
                variant.jcn.estimate >= self.args.dm_min_jcn
                    && variant.breakends().iter().all(|be| {
                        let flanking = be.flanking_copy_number();
                        flanking <= 0.0 || variant.jcn.estimate / flanking >= self.args.dm_min_jcn_ratio
                    })
            })
            .collect()
    }

    /// Evaluates closed chains in order and returns the first that qualifies.
    pub fn find(&self, chains: &[Chain]) -> Option<DoubleMinute> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return None;
        }
        chains
            .iter()
            .filter(|c| c.is_closed())
            .find_map(|chain| self.evaluate(chain, &candidates))
    }

    fn evaluate(&self, chain: &Chain, candidates: &BTreeSet<VariantId>) -> Option<DoubleMinute> {
        let in_loop = chain.variants();
        let shape_ok = match in_loop.len() {
            1 => in_loop
                .iter()
                .all(|v| self.variants[*v].svtype == SvType::DUPLICATION),
            _ => true,
        };
        if !shape_ok || !in_loop.is_subset(candidates) {
            log::trace!("Closed chain {} is not a double-minute candidate", chain.id);
            return None;
        }

        let segments: Vec<LoopSegment> = chain
            .links
            .iter()
            .map(|id| {
                let link = self.links.get(*id);
                LoopSegment {
                    chromosome: &link.chromosome,
                    start: link.lower_position,
                    end: link.upper_position,
                }
            })
            .collect();
        let inside = |v: VariantId| -> bool {
            self.variants[v]
                .breakends()
                .iter()
                .all(|be| segments.iter().any(|s| s.contains(&be.chromosome, be.position)))
        };
        let simple_deletion_inside =
            |v: VariantId| self.variants[v].svtype == SvType::DELETION && inside(v);

        // open breakends among the amplified variants
        let (mut open, mut total) = (0usize, 0usize);
        for &v in candidates {
            if simple_deletion_inside(v) {
                continue;
            }
            let count = self.variants[v].breakends().len();
            total += count;
            if !in_loop.contains(&v) {
                open += count;
            }
        }
        let open_breakend_ratio = if total == 0 { 0.0 } else { open as f64 / total as f64 };
        if open_breakend_ratio >= self.args.dm_max_open_breakend_ratio {
            log::debug!(
                "Chain {} rejected as double minute: open breakend ratio {:.2}",
                chain.id,
                open_breakend_ratio
            );
            return None;
        }

        // variants with one breakend inside the amplicon and one outside
        let crossing = self
            .members
            .iter()
            .copied()
            .filter(|v| !in_loop.contains(v) && !simple_deletion_inside(*v))
            .filter(|v| {
                let variant = &self.variants[*v];
                let ends: Vec<bool> = variant
                    .breakends()
                    .iter()
                    .map(|be| segments.iter().any(|s| s.contains(&be.chromosome, be.position)))
                    .collect();
                let straddles = ends.len() == 2 && ends[0] != ends[1];
                let short = variant.span().is_some_and(|_| variant.length() <= self.args.short_ti_length);
                let assembled = variant.breakends().iter().all(|be| !be.assembly_ids.is_empty());
                straddles && !short && !assembled
            })
            .count();
        let int_ext_ratio = crossing as f64 / in_loop.len() as f64;
        if int_ext_ratio >= self.args.dm_max_int_ext_ratio {
            log::debug!(
                "Chain {} rejected as double minute: internal/external ratio {:.2}",
                chain.id,
                int_ext_ratio
            );
            return None;
        }

        // a foldback splitting the loop must be amplified itself
        let weak_foldback = self.foldbacks.iter().any(|fb| {
            let be = self.variants.breakend(fb.breakend);
            segments.iter().any(|s| s.contains(&be.chromosome, be.position))
                && self.variants[fb.breakend.variant].jcn.estimate < self.args.dm_min_jcn
        });
        if weak_foldback {
            log::debug!("Chain {} rejected as double minute: low-JCN foldback", chain.id);
            return None;
        }

        let jcn = in_loop
            .iter()
            .map(|v| self.variants[*v].jcn.estimate)
            .fold(f64::INFINITY, f64::min);
        log::debug!(
            "Double minute on chain {} with {} variants, JCN {:.1}",
            chain.id,
            in_loop.len(),
            jcn
        );
        Some(DoubleMinute {
            chain: chain.id,
            variants: in_loop.into_iter().collect(),
            jcn,
            open_breakend_ratio,
            int_ext_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        breakend_index::BreakendIndex,
        chain::build_chains,
        foldback::FoldbackFinder,
        jcn::{Replication, refine_breakend_jcn},
        variant::VariantRecord,
        variant::test_utils::{bnd, del, dup, inv, variants, with_assembly, with_jcn},
    };

    fn find(records: &[VariantRecord], args: &AnalysisArgs) -> Option<DoubleMinute> {
        let mut vs = variants(records);
        let members: Vec<_> = (0..vs.len()).collect();
        refine_breakend_jcn(&mut vs, &members).unwrap();
        let index = BreakendIndex::for_variants(&vs, &members);
        let links = ClusterLinks::find(&vs, &index);
        let foldbacks = FoldbackFinder::new(&vs, &index, &links, args).find();
        let replication = Replication::compute(&vs, &members);
        let chains = build_chains(&vs, &members, &links, &replication, args).chains;
        DoubleMinuteFinder::new(&vs, &members, &links, &foldbacks, args).find(&chains)
    }

    #[test]
    fn test_amplified_duplication_loop() {
        let dm = find(
            &[with_jcn(dup("d", "1", 50_000, 55_000), 10.0, 2.0), del("x", "1", 500, 600)],
            &AnalysisArgs::default(),
        )
        .unwrap();
        assert_eq!(dm.variants, vec![0]);
        assert_eq!(dm.jcn, 10.0);
        assert_eq!(dm.open_breakend_ratio, 0.0);
    }

    #[test]
    fn test_low_jcn_loop_rejected() {
        assert!(find(&[dup("d", "1", 50_000, 55_000)], &AnalysisArgs::default()).is_none());
    }

    #[test]
    fn test_flanking_ratio_rejects() {
        let mut rec = with_jcn(dup("d", "1", 50_000, 55_000), 10.0, 2.0);
        rec.start.copy_number = Some(18.0);
        rec.start.copy_number_change = Some(10.0);
        // 10 / 8 is below the required ratio
        assert!(find(&[rec], &AnalysisArgs::default()).is_none());
    }

    #[test]
    fn test_two_variant_loop() {
        let dm = find(&amplified_pair(), &AnalysisArgs::default()).unwrap();
        assert_eq!(dm.variants, vec![0, 1]);
    }

    #[test]
    fn test_open_amplified_variants_reject() {
        // two more amplified variants left outside the loop
        let records = vec![
            with_jcn(dup("d", "1", 50_000, 55_000), 10.0, 2.0),
            with_jcn(bnd("o1", ("1", 58_000, 1), ("7", 1_000, 1)), 9.0, 1.0),
            with_jcn(bnd("o2", ("1", 59_000, 1), ("8", 1_000, 1)), 9.0, 1.0),
        ];
        assert!(find(&records, &AnalysisArgs::default()).is_none());
        let relaxed = AnalysisArgs::default().with(|a| a.dm_max_open_breakend_ratio = 0.9);
        assert!(find(&records, &relaxed).is_some());
    }

    fn amplified_pair() -> Vec<VariantRecord> {
        vec![
            with_assembly(
                with_jcn(bnd("v1", ("1", 1_000, -1), ("2", 5_100, 1)), 8.0, 1.0),
                &["x"],
                &["y"],
            ),
            with_assembly(
                with_jcn(bnd("v2", ("2", 5_000, -1), ("1", 1_100, 1)), 8.0, 1.0),
                &["y"],
                &["x"],
            ),
        ]
    }

    #[test]
    fn test_crossing_variant_rejects() {
        let mut records = amplified_pair();
        records.push(bnd("cross", ("1", 1_050, 1), ("9", 1_000, 1)));
        assert!(find(&records, &AnalysisArgs::default()).is_none());

        // an assembled crossing variant is not counted
        let mut records = amplified_pair();
        records.push(with_assembly(
            bnd("cross", ("1", 1_050, 1), ("9", 1_000, 1)),
            &["z"],
            &["w"],
        ));
        assert!(find(&records, &AnalysisArgs::default()).is_some());
    }

    #[test]
    fn test_crossing_variant_at_short_length_not_counted() {
        let mut records = amplified_pair();
        records.push(dup("cross", "1", 1_050, 2_050));
        assert!(find(&records, &AnalysisArgs::default()).is_some());

        let mut records = amplified_pair();
        records.push(dup("cross", "1", 1_050, 2_051));
        assert!(find(&records, &AnalysisArgs::default()).is_none());
    }

    #[test]
    fn test_low_jcn_foldback_inside_loop_rejects() {
        // JCN 6.5 keeps the loop variants unreplicated but sits below the amplicon threshold
        let args = AnalysisArgs::default().with(|a| a.dm_min_jcn = 7.0);
        let mut records = amplified_pair();
        records.push(with_jcn(inv("fb", "2", 5_030, 5_060, 1), 6.5, 0.5));
        assert!(find(&records, &args).is_none());

        let mut records = amplified_pair();
        records.push(with_jcn(inv("fb", "2", 5_030, 5_060, 1), 8.0, 1.0));
        let dm = find(&records, &args).unwrap();
        assert_eq!(dm.variants, vec![0, 1]);
    }
}
