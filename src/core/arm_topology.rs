use crate::core::{
    breakend::{BreakendId, ChromosomeArm, LineElementType, Orientation},
    breakend_index::BreakendIndex,
    foldback::Foldbacks,
    line_element::LineAnnotation,
    links::ClusterLinks,
    variant::{BreakendLookup, Variant},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmTopology {
    IsolatedBreakend,
    TiOnly,
    Dsb,
    Foldback,
    FoldbackDsb,
    ComplexFoldback,
    ComplexLine,
    ComplexOther,
    SameOrientation,
}

impl fmt::Display for ArmTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArmTopology::IsolatedBreakend => "ISOLATED_BE",
            ArmTopology::TiOnly => "TI_ONLY",
            ArmTopology::Dsb => "DSB",
            ArmTopology::Foldback => "FOLDBACK",
            ArmTopology::FoldbackDsb => "FOLDBACK_DSB",
            ArmTopology::ComplexFoldback => "COMPLEX_FOLDBACK",
            ArmTopology::ComplexLine => "COMPLEX_LINE",
            ArmTopology::ComplexOther => "COMPLEX_OTHER",
            ArmTopology::SameOrientation => "SAME_ORIENT",
        };
        write!(f, "{s}")
    }
}

/// A cluster's breakends on one chromosome arm.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmGroup {
    pub id: usize,
    pub chromosome: String,
    pub arm: ChromosomeArm,
    pub breakends: Vec<BreakendId>,
    pub topology: ArmTopology,
    pub ti_count: usize,
}

impl ArmGroup {
    pub fn contains(&self, be: BreakendId) -> bool {
        self.breakends.contains(&be)
    }
}

/// Groups a cluster's breakends by arm and labels each group's local shape.
///
/// Pure function of the cluster's links, foldbacks and LINE status.
pub fn analyse_arms(
    variants: &[Variant],
    index: &BreakendIndex,
    links: &ClusterLinks,
    foldbacks: &Foldbacks,
    line: &LineAnnotation,
) -> Vec<ArmGroup> {
    let mut grouped: BTreeMap<(&str, ChromosomeArm), Vec<BreakendId>> = BTreeMap::new();
    for (chromosome, ordered) in index.chromosomes() {
        for &id in ordered {
            grouped
                .entry((chromosome, variants.breakend(id).arm))
                .or_default()
                .push(id);
        }
    }

    grouped
        .into_iter()
        .enumerate()
        .map(|(id, ((chromosome, arm), breakends))| {
            let (topology, ti_count) = topology_of(variants, &breakends, links, foldbacks, line);
            log::trace!("Arm group {chromosome}{arm}: {} breakends, {topology}", breakends.len());
            ArmGroup {
                id,
                chromosome: chromosome.to_string(),
                arm,
                breakends,
                topology,
                ti_count,
            }
        })
        .collect()
}

fn topology_of(
    variants: &[Variant],
    breakends: &[BreakendId],
    links: &ClusterLinks,
    foldbacks: &Foldbacks,
    line: &LineAnnotation,
) -> (ArmTopology, usize) {
    let members: BTreeSet<BreakendId> = breakends.iter().copied().collect();
    let internal: Vec<_> = links
        .iter()
        .filter(|l| members.contains(&l.lower) && members.contains(&l.upper))
        .collect();
    let ti_count = internal.iter().filter(|l| l.is_templated_insertion()).count();
    let has_db = internal.iter().any(|l| l.is_deletion_bridge());
    let foldback_pairs = foldbacks
        .pairs()
        .into_iter()
        .filter(|(a, b)| members.contains(a) || members.contains(b))
        .count();

    let topology = if line.has_linking_line_elements
        && breakends.iter().any(|be| line.status(*be) != LineElementType::None)
    {
        ArmTopology::ComplexLine
    } else if breakends.len() == 1 && !links.has_link(breakends[0]) {
        ArmTopology::IsolatedBreakend
    } else {
        match foldback_pairs {
            0 if has_db => ArmTopology::Dsb,
            0 if ti_count > 0 => ArmTopology::TiOnly,
            0 if internal.is_empty() && shares_orientation(variants, breakends) => {
                ArmTopology::SameOrientation
            }
            0 => ArmTopology::ComplexOther,
            1 if has_db => ArmTopology::FoldbackDsb,
            1 => ArmTopology::Foldback,
            _ => ArmTopology::ComplexFoldback,
        }
    };
    (topology, ti_count)
}

fn shares_orientation(variants: &[Variant], breakends: &[BreakendId]) -> bool {
    let plus = breakends
        .iter()
        .filter(|be| variants.breakend(**be).orientation == Orientation::Plus)
        .count();
    plus >= 2 || breakends.len() - plus >= 2
}
