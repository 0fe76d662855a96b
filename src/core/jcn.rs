use crate::{
    constants::{MAX_REPLICATION_COUNT, MIN_JCN_UNIT, REPLICATION_ROUNDING_OFFSET},
    core::{
        breakend::{JcnRange, VariantId},
        variant::Variant,
    },
    utils::util::Result,
};
use std::collections::BTreeMap;

/// Narrows each breakend's JCN bounds with the copy number change observed at it.
///
/// Bounds that do not overlap the observed change are kept as called. Each breakend may
/// be refined once, so running this twice on a cluster is an error.
pub fn refine_breakend_jcn(variants: &mut [Variant], members: &[VariantId]) -> Result<()> {
    for &vid in members {
        let variant = &mut variants[vid];
        let half_width = variant.jcn.width() / 2.0;
        for be in variant.breakends_mut() {
            let observed = JcnRange::new(be.copy_number_change.abs(), half_width);
            let refined = be.jcn().intersect(&observed).unwrap_or_else(|| be.jcn());
            log::trace!(
                "Breakend {} JCN [{:.2},{:.2}] -> [{:.2},{:.2}]",
                be.id,
                be.jcn().min,
                be.jcn().max,
                refined.min,
                refined.max
            );
            be.refine_jcn(refined)?;
        }
    }
    Ok(())
}

/// How many copies of each variant chaining may use.
#[derive(Debug, Clone, PartialEq)]
pub struct Replication {
    unit: f64,
    counts: BTreeMap<VariantId, usize>,
}

impl Replication {
    /// The allocation unit is the cluster's lowest variant JCN, floored at `MIN_JCN_UNIT`.
    pub fn compute(variants: &[Variant], members: &[VariantId]) -> Self {
        let unit = members
            .iter()
            .map(|v| variants[*v].jcn.estimate)
            .fold(f64::INFINITY, f64::min)
            .max(MIN_JCN_UNIT);
        let unit = if unit.is_finite() { unit } else { MIN_JCN_UNIT };
        let counts = members
            .iter()
            .map(|&v| (v, replication_count(variants[v].jcn.estimate, unit)))
            .collect();
        Self { unit, counts }
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }

    pub fn count(&self, variant: VariantId) -> usize {
        self.counts.get(&variant).copied().unwrap_or(1)
    }

    pub fn is_replicated(&self) -> bool {
        self.counts.values().any(|c| *c > 1)
    }
}

fn replication_count(jcn: f64, unit: f64) -> usize {
    let copies = (jcn / unit - REPLICATION_ROUNDING_OFFSET).ceil();
    if copies.is_nan() || copies < 1.0 {
        1
    } else {
        (copies as usize).min(MAX_REPLICATION_COUNT)
    }
}
