use crate::{
    cli::AnalysisArgs,
    constants::{LINE_MOTIF_SEARCH_WINDOW, LINE_POLY_RUN_MIN_LENGTH},
    core::{
        breakend::{BreakendId, LineElementType, Orientation},
        breakend_index::BreakendIndex,
        links::ClusterLinks,
        reference::ReferenceData,
        variant::{BreakendLookup, Variant},
    },
};
use std::collections::BTreeMap;

/// Checks for a poly-A/poly-T tail at the end of the insert sequence that meets
/// the reference.
///
/// A `-1` breakend reads its insert from the junction outwards, so the tail must be a
/// poly-T run near the start; a `+1` breakend needs a poly-A run near the end.
pub fn has_line_motif(insert_sequence: &str, orientation: Orientation) -> bool {
    let bases = insert_sequence.as_bytes();
    if bases.len() < LINE_POLY_RUN_MIN_LENGTH {
        return false;
    }
    let window = LINE_MOTIF_SEARCH_WINDOW.min(bases.len());
    match orientation {
        Orientation::Minus => longest_run(&bases[..window], b'T') >= LINE_POLY_RUN_MIN_LENGTH,
        Orientation::Plus => {
            longest_run(&bases[bases.len() - window..], b'A') >= LINE_POLY_RUN_MIN_LENGTH
        }
    }
}

fn longest_run(bases: &[u8], base: u8) -> usize {
    let mut best = 0;
    let mut current = 0;
    for b in bases {
        if b.to_ascii_uppercase() == base {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// LINE status of a cluster's breakends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineAnnotation {
    pub has_linking_line_elements: bool,
    pub breakends: BTreeMap<BreakendId, LineElementType>,
}

impl LineAnnotation {
    pub fn status(&self, be: BreakendId) -> LineElementType {
        self.breakends.get(&be).copied().unwrap_or_default()
    }

    pub fn count(&self, kind: LineElementType) -> usize {
        self.breakends.values().filter(|k| **k == kind).count()
    }
}

pub fn annotate_line_elements(
    variants: &[Variant],
    index: &BreakendIndex,
    links: &ClusterLinks,
    reference: &ReferenceData,
    args: &AnalysisArgs,
) -> LineAnnotation {
    let mut annotation = LineAnnotation::default();

    let initial = |id: BreakendId| -> LineElementType {
        let be = variants.breakend(id);
        if reference.in_line_region(&be.chromosome, be.position) {
            LineElementType::Known
        } else if be.has_line_motif && links.deletion_bridge(id).is_none() {
            LineElementType::Suspect
        } else {
            LineElementType::None
        }
    };

    for (chromosome, ordered) in index.chromosomes() {
        let statuses: Vec<LineElementType> = ordered.iter().map(|id| initial(*id)).collect();
        for (i, &id) in ordered.iter().enumerate() {
            if statuses[i] != LineElementType::None {
                annotation.breakends.insert(id, statuses[i]);
            }
        }

        for (i, &a) in ordered.iter().enumerate() {
            let pos_a = variants.breakend(a).position;
            for (j, &b) in ordered.iter().enumerate().skip(i + 1) {
                let pos_b = variants.breakend(b).position;
                if pos_b - pos_a > args.line_proximity_window {
                    break;
                }
                if a.variant == b.variant
                    || (statuses[i] == LineElementType::None && statuses[j] == LineElementType::None)
                {
                    continue;
                }
                let invalidated = links.deletion_bridges().any(|db| {
                    db.chromosome == chromosome
                        && db.lower_position >= pos_a
                        && db.upper_position <= pos_b
                });
                if invalidated {
                    continue;
                }
                for id in [a, b] {
                    let entry = annotation.breakends.entry(id).or_default();
                    if *entry == LineElementType::None {
                        *entry = LineElementType::Suspect;
                    }
                }
                annotation.has_linking_line_elements = true;
            }
        }
    }

    if annotation.has_linking_line_elements {
        log::debug!(
            "Linking LINE elements: {} known, {} suspect",
            annotation.count(LineElementType::Known),
            annotation.count(LineElementType::Suspect)
        );
    }
    annotation
}
