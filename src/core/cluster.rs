use crate::core::{
    arm_topology::ArmGroup,
    breakend::{BreakendId, VariantId},
    breakend_index::BreakendIndex,
    chain::Chain,
    classify::{ResolvedType, SyntheticLengths},
    double_minute::DoubleMinute,
    foldback::Foldbacks,
    line_element::LineAnnotation,
    links::ClusterLinks,
    metrics::ClusterMetrics,
    variant::Variant,
};
use std::{collections::BTreeSet, fmt};

pub type ClusterId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterAnnotation {
    DoubleMinute,
    Line,
    Foldbacks,
    Replicated,
    FragileSite,
    ChainClosed,
}

impl fmt::Display for ClusterAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterAnnotation::DoubleMinute => "DOUBLE_MINUTE",
            ClusterAnnotation::Line => "LINE",
            ClusterAnnotation::Foldbacks => "FOLDBACKS",
            ClusterAnnotation::Replicated => "REPLICATED",
            ClusterAnnotation::FragileSite => "FRAGILE_SITE",
            ClusterAnnotation::ChainClosed => "CHAIN_CLOSED",
        };
        write!(f, "{s}")
    }
}

/// One cluster of a sample and everything derived from it.
///
/// Variants are referenced by arena index; the cluster never owns variant data.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub variants: Vec<VariantId>,
    pub index: BreakendIndex,
    pub links: ClusterLinks,
    pub foldbacks: Foldbacks,
    pub line: LineAnnotation,
    pub chains: Vec<Chain>,
    pub replicated: bool,
    pub double_minute: Option<DoubleMinute>,
    pub arm_groups: Vec<ArmGroup>,
    pub resolved_type: ResolvedType,
    pub synthetic: Option<SyntheticLengths>,
    pub annotations: BTreeSet<ClusterAnnotation>,
    pub metrics: ClusterMetrics,
}

impl Cluster {
    pub fn new(id: ClusterId, mut members: Vec<VariantId>, variants: &[Variant]) -> Self {
        members.sort_unstable();
        members.dedup();
        let index = BreakendIndex::for_variants(variants, &members);
        Self {
            id,
            variants: members,
            index,
            links: ClusterLinks::default(),
            foldbacks: Foldbacks::default(),
            line: LineAnnotation::default(),
            chains: Vec::new(),
            replicated: false,
            double_minute: None,
            arm_groups: Vec::new(),
            resolved_type: ResolvedType::Unresolved,
            synthetic: None,
            annotations: BTreeSet::new(),
            metrics: ClusterMetrics::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn contains(&self, variant: VariantId) -> bool {
        self.variants.binary_search(&variant).is_ok()
    }

    pub fn breakend_ids<'a>(&'a self, variants: &'a [Variant]) -> impl Iterator<Item = BreakendId> + 'a {
        self.variants
            .iter()
            .flat_map(move |v| variants[*v].breakend_ids())
    }

    /// A lone alignment-ambiguous duplicate breakend.
    pub fn is_duplicate_breakend(&self, variants: &[Variant]) -> bool {
        self.variants.len() == 1 && variants[self.variants[0]].is_equivalent
    }

    pub fn closed_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter().filter(|c| c.is_closed())
    }

    /// Chain holding the first copy of `variant`, with the element's index in it.
    pub fn chain_position(&self, variant: VariantId) -> Option<(&Chain, usize)> {
        self.chains.iter().find_map(|chain| {
            chain
                .elements
                .iter()
                .position(|e| e.variant == variant)
                .map(|i| (chain, i))
        })
    }

    pub fn open_breakend_count(&self) -> usize {
        self.chains.iter().map(|c| c.open_breakends().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variant::test_utils::{del, variants};

    #[test]
    fn test_new_sorts_and_indexes_members() {
        let vs = variants(&[del("a", "1", 100, 200), del("b", "1", 300, 400)]);
        let cluster = Cluster::new(4, vec![1, 0, 1], &vs);
        assert_eq!(cluster.variants, vec![0, 1]);
        assert_eq!(cluster.index.len(), 4);
        assert!(cluster.contains(1));
        assert!(!cluster.contains(2));
        assert_eq!(cluster.breakend_ids(&vs).count(), 4);
        assert_eq!(cluster.resolved_type, ResolvedType::Unresolved);
    }

    #[test]
    fn test_duplicate_breakend() {
        let mut rec = del("a", "1", 100, 200);
        rec.is_equivalent = true;
        let vs = variants(&[rec]);
        assert!(Cluster::new(0, vec![0], &vs).is_duplicate_breakend(&vs));
    }

    #[test]
    fn test_annotation_display() {
        assert_eq!(ClusterAnnotation::DoubleMinute.to_string(), "DOUBLE_MINUTE");
        assert_eq!(ClusterAnnotation::ChainClosed.to_string(), "CHAIN_CLOSED");
    }
}
