//! Final event label for each cluster.

mod synthetic;

use crate::{
    cli::AnalysisArgs,
    core::{
        cluster::{Cluster, ClusterAnnotation},
        loh::LohSegments,
        svtype::SvType,
        variant::{BreakendLookup, Variant},
    },
};
use serde::Serialize;
use std::{collections::BTreeSet, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedType {
    Del,
    Dup,
    Ins,
    Inv,
    Sgl,
    Inf,
    UnbalTrans,
    UnbalTransTi,
    DelExtTi,
    DelIntTi,
    DupExtTi,
    DupIntTi,
    RecipInv,
    RecipInvDups,
    RecipInvDelDup,
    RecipTrans,
    RecipTransDups,
    RecipTransDelDup,
    FbInvPair,
    PairOther,
    DoubleMinute,
    Line,
    LowVaf,
    DupBe,
    Complex,
    Unresolved,
}

impl ResolvedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedType::Del => "DEL",
            ResolvedType::Dup => "DUP",
            ResolvedType::Ins => "INS",
            ResolvedType::Inv => "INV",
            ResolvedType::Sgl => "SGL",
            ResolvedType::Inf => "INF",
            ResolvedType::UnbalTrans => "UNBAL_TRANS",
            ResolvedType::UnbalTransTi => "UNBAL_TRANS_TI",
            ResolvedType::DelExtTi => "DEL_EXT_TI",
            ResolvedType::DelIntTi => "DEL_INT_TI",
            ResolvedType::DupExtTi => "DUP_EXT_TI",
            ResolvedType::DupIntTi => "DUP_INT_TI",
            ResolvedType::RecipInv => "RECIP_INV",
            ResolvedType::RecipInvDups => "RECIP_INV_DUPS",
            ResolvedType::RecipInvDelDup => "RECIP_INV_DEL_DUP",
            ResolvedType::RecipTrans => "RECIP_TRANS",
            ResolvedType::RecipTransDups => "RECIP_TRANS_DUPS",
            ResolvedType::RecipTransDelDup => "RECIP_TRANS_DEL_DUP",
            ResolvedType::FbInvPair => "FB_INV_PAIR",
            ResolvedType::PairOther => "PAIR_OTHER",
            ResolvedType::DoubleMinute => "DOUBLE_MINUTE",
            ResolvedType::Line => "LINE",
            ResolvedType::LowVaf => "LOW_VAF",
            ResolvedType::DupBe => "DUP_BE",
            ResolvedType::Complex => "COMPLEX",
            ResolvedType::Unresolved => "UNRESOLVED",
        }
    }

    /// Reciprocal pairs whose two variants are reported as separate events.
    pub fn splits_chains(&self) -> bool {
        matches!(
            self,
            ResolvedType::RecipInvDups
                | ResolvedType::RecipInvDelDup
                | ResolvedType::RecipTransDups
                | ResolvedType::RecipTransDelDup
        )
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lengths of the single event a cluster reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyntheticLengths {
    /// Span between the outermost breakends of the event, 0 across chromosomes.
    pub length: i64,
    /// Longest single templated insertion involved.
    pub ti_length: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub resolved_type: ResolvedType,
    pub synthetic: Option<SyntheticLengths>,
}

impl Classification {
    fn plain(resolved_type: ResolvedType) -> Self {
        Self {
            resolved_type,
            synthetic: None,
        }
    }
}

/// Assigns the resolved type from the cluster's links, chains, foldbacks, LINE status
/// and double-minute call. Reads but never mutates the cluster.
pub fn classify_cluster(
    cluster: &Cluster,
    variants: &[Variant],
    loh: &LohSegments,
    args: &AnalysisArgs,
) -> Classification {
    if cluster.is_duplicate_breakend(variants) {
        return Classification::plain(ResolvedType::DupBe);
    }
    if cluster.line.has_linking_line_elements {
        return Classification::plain(ResolvedType::Line);
    }
    if cluster.double_minute.is_some() {
        return Classification::plain(ResolvedType::DoubleMinute);
    }

    match cluster.variants.as_slice() {
        [single] => return Classification::plain(single_variant_type(&variants[*single], args)),
        [a, b] => {
            if let Some(call) = synthetic::classify_pair(
                variants,
                *a,
                *b,
                &cluster.links,
                &cluster.foldbacks,
                loh,
                args,
            ) {
                return call;
            }
        }
        _ => {
            if let Some(call) = synthetic::classify_single_chain(cluster, variants, args) {
                return call;
            }
        }
    }

    if cluster.links.is_empty() {
        Classification::plain(ResolvedType::Unresolved)
    } else {
        Classification::plain(ResolvedType::Complex)
    }
}

fn single_variant_type(variant: &Variant, args: &AnalysisArgs) -> ResolvedType {
    let low_jcn = variant.jcn.estimate < args.low_jcn_threshold;
    match variant.svtype {
        SvType::DELETION => ResolvedType::Del,
        SvType::DUPLICATION => ResolvedType::Dup,
        SvType::INSERTION => ResolvedType::Ins,
        SvType::INVERSION => ResolvedType::Inv,
        SvType::BND => ResolvedType::UnbalTrans,
        SvType::SGL if low_jcn => ResolvedType::LowVaf,
        SvType::SGL => ResolvedType::Sgl,
        SvType::INF if low_jcn => ResolvedType::LowVaf,
        SvType::INF => ResolvedType::Inf,
    }
}

/// Annotation set implied by the cluster's current state.
pub fn annotate_cluster(cluster: &Cluster, variants: &[Variant]) -> BTreeSet<ClusterAnnotation> {
    let mut annotations = BTreeSet::new();
    if cluster.double_minute.is_some() {
        annotations.insert(ClusterAnnotation::DoubleMinute);
    }
    if cluster.line.has_linking_line_elements {
        annotations.insert(ClusterAnnotation::Line);
    }
    if !cluster.foldbacks.is_empty() {
        annotations.insert(ClusterAnnotation::Foldbacks);
    }
    if cluster.replicated {
        annotations.insert(ClusterAnnotation::Replicated);
    }
    if cluster
        .breakend_ids(variants)
        .any(|be| variants.breakend(be).is_fragile_site)
    {
        annotations.insert(ClusterAnnotation::FragileSite);
    }
    if cluster.closed_chains().next().is_some() {
        annotations.insert(ClusterAnnotation::ChainClosed);
    }
    annotations
}
