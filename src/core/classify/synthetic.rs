use super::{Classification, ResolvedType, SyntheticLengths};
use crate::{
    cli::AnalysisArgs,
    core::{
        breakend::{Breakend, BreakendId, Orientation, VariantId},
        cluster::Cluster,
        foldback::Foldbacks,
        links::{ClusterLinks, Link},
        loh::LohSegments,
        svtype::SvType,
        variant::{BreakendLookup, Variant},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairFamily {
    Inversion,
    Translocation,
}

impl PairFamily {
    fn of(a: &Variant, b: &Variant) -> Option<Self> {
        match (a.svtype, b.svtype) {
            (SvType::INVERSION, SvType::INVERSION) => Some(PairFamily::Inversion),
            (SvType::BND, SvType::BND) => Some(PairFamily::Translocation),
            _ => None,
        }
    }

    /// Family used when only reciprocity matters, falling back to chromosome geometry.
    fn or_geometry(family: Option<Self>, a: &Variant, b: &Variant) -> Self {
        family.unwrap_or(if a.is_intra_chromosomal() && b.is_intra_chromosomal() {
            PairFamily::Inversion
        } else {
            PairFamily::Translocation
        })
    }

    fn reciprocal(self) -> ResolvedType {
        match self {
            PairFamily::Inversion => ResolvedType::RecipInv,
            PairFamily::Translocation => ResolvedType::RecipTrans,
        }
    }

    fn dups(self) -> ResolvedType {
        match self {
            PairFamily::Inversion => ResolvedType::RecipInvDups,
            PairFamily::Translocation => ResolvedType::RecipTransDups,
        }
    }

    fn del_dup(self) -> ResolvedType {
        match self {
            PairFamily::Inversion => ResolvedType::RecipInvDelDup,
            PairFamily::Translocation => ResolvedType::RecipTransDelDup,
        }
    }
}

fn call(resolved_type: ResolvedType, length: i64, ti_length: i64) -> Classification {
    Classification {
        resolved_type,
        synthetic: Some(SyntheticLengths { length, ti_length }),
    }
}

/// Span of a set of breakends when they share one chromosome, else 0.
fn outer_span<'a>(breakends: impl IntoIterator<Item = &'a Breakend>) -> i64 {
    let mut chromosome: Option<&str> = None;
    let (mut lo, mut hi) = (i64::MAX, i64::MIN);
    for be in breakends {
        match chromosome {
            Some(c) if c != be.chromosome => return 0,
            _ => chromosome = Some(&be.chromosome),
        }
        lo = lo.min(be.position);
        hi = hi.max(be.position);
    }
    if chromosome.is_some() { hi - lo } else { 0 }
}

fn loh_bounded(loh: &LohSegments, args: &AnalysisArgs, ti: &Link) -> bool {
    let tolerance = args.loh_boundary_tolerance;
    loh.has_edge_near(&ti.chromosome, ti.lower_position, tolerance)
        || loh.has_edge_near(&ti.chromosome, ti.upper_position, tolerance)
}

fn insertion_type(is_deletion: bool, internal: bool) -> ResolvedType {
    match (is_deletion, internal) {
        (true, true) => ResolvedType::DelIntTi,
        (true, false) => ResolvedType::DelExtTi,
        (false, true) => ResolvedType::DupIntTi,
        (false, false) => ResolvedType::DupExtTi,
    }
}

struct PairContext<'a> {
    variants: &'a [Variant],
    links: &'a ClusterLinks,
    foldbacks: &'a Foldbacks,
    loh: &'a LohSegments,
    args: &'a AnalysisArgs,
}

impl PairContext<'_> {
    fn has_short_db(&self, be: BreakendId) -> bool {
        self.links
            .deletion_bridge(be)
            .is_some_and(|db| db.length < self.args.short_ti_length)
    }

    fn one_insertion(&self, a: VariantId, b: VariantId, ti: &Link) -> Classification {
        let (va, vb) = (&self.variants[a], &self.variants[b]);
        let (ta, tb) = if ti.lower.variant == a {
            (ti.lower, ti.upper)
        } else {
            (ti.upper, ti.lower)
        };
        let (oa, ob) = (ta.other(), tb.other());
        let (open_a, open_b) = (self.variants.breakend(oa), self.variants.breakend(ob));
        let short = ti.is_short(self.args.short_ti_length);

        if open_a.chromosome != open_b.chromosome {
            let resolved = if short {
                ResolvedType::UnbalTrans
            } else {
                ResolvedType::UnbalTransTi
            };
            return call(resolved, 0, ti.length);
        }

        let length = (open_a.position - open_b.position).abs();
        if open_a.orientation == open_b.orientation {
            let folded = [oa, ob, ta, tb].iter().any(|be| self.foldbacks.contains(*be));
            let resolved = if folded {
                ResolvedType::FbInvPair
            } else {
                ResolvedType::PairOther
            };
            return call(resolved, length, ti.length);
        }

        let (lower, upper) = if open_a.position <= open_b.position {
            (open_a, open_b)
        } else {
            (open_b, open_a)
        };
        let is_deletion = lower.orientation == Orientation::Plus;
        if short {
            let resolved = if is_deletion {
                ResolvedType::Del
            } else {
                ResolvedType::Dup
            };
            return call(resolved, length, ti.length);
        }

        let internal = ti.within(lower, upper);
        let family = PairFamily::of(va, vb);

        if let Some(family) = family {
            if internal && self.has_short_db(oa) && self.has_short_db(ob) {
                return call(family.reciprocal(), length, ti.length);
            }
        }

        let with_ti = insertion_type(is_deletion, internal);
        if loh_bounded(self.loh, self.args, ti) {
            return call(with_ti, length, ti.length);
        }
        match family {
            Some(family) if is_deletion => call(family.del_dup(), length, ti.length),
            Some(family) => call(family.dups(), length, ti.length),
            None => call(with_ti, length, ti.length),
        }
    }

    fn two_insertions(&self, a: VariantId, b: VariantId, tis: &[&Link]) -> Classification {
        let (va, vb) = (&self.variants[a], &self.variants[b]);
        let family = PairFamily::or_geometry(PairFamily::of(va, vb), va, vb);
        let short = self.args.short_ti_length;
        let long_count = tis.iter().filter(|ti| !ti.is_short(short)).count();
        let ti_length = tis.iter().map(|ti| ti.length).max().unwrap_or(0);
        let length = outer_span(va.breakends().iter().chain(vb.breakends()));
        let resolved = match long_count {
            0 => family.reciprocal(),
            1 => family.del_dup(),
            _ => family.dups(),
        };
        call(resolved, length, ti_length)
    }

    /// With no insertion between them, two variants are reciprocal only when every
    /// breakend is closed by a short deletion bridge to the other variant.
    fn no_insertion(&self, a: VariantId, b: VariantId) -> Classification {
        let (va, vb) = (&self.variants[a], &self.variants[b]);
        let length = outer_span(va.breakends().iter().chain(vb.breakends()));
        let all_bridged = va.breakend_ids().chain(vb.breakend_ids()).all(|be| {
            let partner_variant = if be.variant == a { b } else { a };
            self.has_short_db(be)
                && self
                    .links
                    .deletion_bridge(be)
                    .and_then(|db| db.other(be))
                    .is_some_and(|other| other.variant == partner_variant)
        });
        if all_bridged {
            let family = PairFamily::or_geometry(PairFamily::of(va, vb), va, vb);
            call(family.reciprocal(), length, 0)
        } else {
            call(ResolvedType::PairOther, length, 0)
        }
    }
}

/// Two-variant rules. Single-breakend variants never reduce to a synthetic pair.
pub(super) fn classify_pair(
    variants: &[Variant],
    a: VariantId,
    b: VariantId,
    links: &ClusterLinks,
    foldbacks: &Foldbacks,
    loh: &LohSegments,
    args: &AnalysisArgs,
) -> Option<Classification> {
    if variants[a].is_single_breakend() || variants[b].is_single_breakend() {
        return None;
    }
    let context = PairContext {
        variants,
        links,
        foldbacks,
        loh,
        args,
    };
    let mut tis = links.insertions_between(a, b);
    tis.sort_by_key(|ti| std::cmp::Reverse(ti.length));
    let classification = match tis.as_slice() {
        [] => context.no_insertion(a, b),
        [ti] => context.one_insertion(a, b, ti),
        [first, second, ..] => context.two_insertions(a, b, &[first, second]),
    };
    log::trace!(
        "Pair {} / {}: {} templated insertions -> {}",
        variants[a].id,
        variants[b].id,
        tis.len(),
        classification.resolved_type
    );
    Some(classification)
}

/// A larger cluster forming one open chain reduces to the event described by its two
/// open ends. The chain's longest templated insertion stands in for a pair's single one,
/// and with no variant family to fall back on a long one always yields a `*_TI` type.
pub(super) fn classify_single_chain(
    cluster: &Cluster,
    variants: &[Variant],
    args: &AnalysisArgs,
) -> Option<Classification> {
    let [chain] = cluster.chains.as_slice() else {
        return None;
    };
    if chain.is_closed() || cluster.variants.iter().any(|v| !chain.contains_variant(*v)) {
        return None;
    }
    let longest = chain
        .links
        .iter()
        .map(|id| cluster.links.get(*id))
        .filter(|l| l.is_templated_insertion())
        .max_by_key(|l| l.length);
    let short = longest.is_none_or(|ti| ti.is_short(args.short_ti_length));
    let ti_length = longest.map_or(0, |ti| ti.length);
    let (first, last) = (chain.first_breakend()?, chain.last_breakend()?);
    let (a, b) = (variants.breakend(first), variants.breakend(last));

    if a.chromosome != b.chromosome {
        let resolved = if short {
            ResolvedType::UnbalTrans
        } else {
            ResolvedType::UnbalTransTi
        };
        return Some(call(resolved, 0, ti_length));
    }
    if a.orientation == b.orientation {
        return None;
    }
    let (lower, upper) = if a.position <= b.position { (a, b) } else { (b, a) };
    let is_deletion = lower.orientation == Orientation::Plus;
    let length = upper.position - lower.position;
    let resolved = match longest {
        Some(ti) if !short => insertion_type(is_deletion, ti.within(lower, upper)),
        _ if is_deletion => ResolvedType::Del,
        _ => ResolvedType::Dup,
    };
    Some(call(resolved, length, ti_length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        breakend_index::BreakendIndex,
        foldback::FoldbackFinder,
        loh::LohSegment,
        variant::VariantRecord,
        variant::test_utils::{bnd, inv, sgl_record, variants, with_assembly},
    };

    fn classify(records: &[VariantRecord], loh: &LohSegments) -> Classification {
        let vs = variants(records);
        let members = vec![0, 1];
        let args = AnalysisArgs::default();
        let index = BreakendIndex::for_variants(&vs, &members);
        let links = ClusterLinks::find(&vs, &index);
        let foldbacks = FoldbackFinder::new(&vs, &index, &links, &args).find();
        classify_pair(&vs, 0, 1, &links, &foldbacks, loh, &args).unwrap()
    }

    fn resolved(records: &[VariantRecord]) -> ResolvedType {
        classify(records, &LohSegments::default()).resolved_type
    }

    #[test]
    fn test_facing_away_inversions_pair_other() {
        assert_eq!(
            resolved(&[inv("a", "1", 100, 200, 1), inv("b", "1", 300, 400, -1)]),
            ResolvedType::PairOther
        );
    }

    #[test]
    fn test_short_insertion_gives_deletion() {
        let call = classify(
            &[inv("a", "1", 100, 300, 1), inv("b", "1", 200, 400, -1)],
            &LohSegments::default(),
        );
        assert_eq!(call.resolved_type, ResolvedType::Del);
        assert_eq!(
            call.synthetic,
            Some(SyntheticLengths {
                length: 300,
                ti_length: 99
            })
        );
    }

    #[test]
    fn test_long_insertion_with_short_bridges_is_reciprocal() {
        assert_eq!(
            resolved(&[inv("a", "1", 100, 3_000, 1), inv("b", "1", 200, 4_000, -1)]),
            ResolvedType::RecipInv
        );
    }

    #[test]
    fn test_long_insertion_loh_bounded() {
        let records = [inv("a", "1", 100, 3_000, 1), inv("b", "1", 200, 6_000, -1)];
        assert_eq!(resolved(&records), ResolvedType::RecipInvDelDup);

        let loh = LohSegments::new(vec![LohSegment {
            chromosome: "1".to_string(),
            start: 205,
            end: 90_000,
        }]);
        let call = classify(&records, &loh);
        assert_eq!(call.resolved_type, ResolvedType::DelIntTi);
        assert_eq!(call.synthetic.unwrap().ti_length, 2_799);
    }

    #[test]
    fn test_translocation_pair_to_other_chromosomes() {
        assert_eq!(
            resolved(&[
                bnd("x", ("1", 1_000, -1), ("2", 100, 1)),
                bnd("y", ("1", 3_000, 1), ("3", 100, 1)),
            ]),
            ResolvedType::UnbalTransTi
        );
        assert_eq!(
            resolved(&[
                bnd("x", ("1", 1_000, -1), ("2", 100, 1)),
                bnd("y", ("1", 1_500, 1), ("3", 100, 1)),
            ]),
            ResolvedType::UnbalTrans
        );
    }

    #[test]
    fn test_two_insertions() {
        let pair = |end_1: i64, end_2: i64| {
            [
                with_assembly(bnd("v1", ("1", 1_000, -1), ("2", end_2, 1)), &["x"], &["y"]),
                with_assembly(bnd("v2", ("2", 5_000, -1), ("1", end_1, 1)), &["y"], &["x"]),
            ]
        };
        assert_eq!(resolved(&pair(1_100, 5_100)), ResolvedType::RecipTrans);
        assert_eq!(resolved(&pair(1_100, 9_000)), ResolvedType::RecipTransDelDup);
        assert_eq!(resolved(&pair(4_000, 9_000)), ResolvedType::RecipTransDups);
    }

    #[test]
    fn test_single_breakends_not_paired() {
        let vs = variants(&[
            sgl_record("s", ("1", 100, 1), 1.0),
            inv("a", "1", 300, 400, -1),
        ]);
        let index = BreakendIndex::for_variants(&vs, &[0, 1]);
        let links = ClusterLinks::find(&vs, &index);
        assert!(
            classify_pair(
                &vs,
                0,
                1,
                &links,
                &Foldbacks::default(),
                &LohSegments::default(),
                &AnalysisArgs::default()
            )
            .is_none()
        );
    }

    #[test]
    fn test_outer_span() {
        let vs = variants(&[inv("a", "1", 100, 300, 1), bnd("t", ("1", 50, 1), ("2", 10, 1))]);
        assert_eq!(outer_span(vs[0].breakends()), 200);
        assert_eq!(outer_span(vs[1].breakends()), 0);
    }
}
